//! Integration tests for the full research pipeline
//!
//! Drives the orchestrator end-to-end over mock capabilities: no model,
//! no vector index, no network.

use async_trait::async_trait;
use paperscout::capabilities::{
    CapabilitySet, Embedder, LanguageCapability, LexicalSearch, Reranker, VectorSearch,
};
use paperscout::config::{PipelineConfig, RetryConfig};
use paperscout::errors::{ResearchError, Result};
use paperscout::synthesis::NO_EVIDENCE_PARAGRAPH;
use paperscout::types::{
    DocumentSignature, Message, RetrievedDocument, RouteKind, RouteResponse, Thread,
};
use paperscout::{PipelineEvent, ResearchOrchestrator};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Records which capabilities were invoked
#[derive(Default)]
struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    fn contains(&self, name: &str) -> bool {
        self.count(name) > 0
    }
}

struct MockLanguage {
    log: Arc<CallLog>,
    route: String,
    plan: Vec<String>,
    /// document content -> distilled facts
    distill_map: HashMap<String, Vec<String>>,
    alignment: HashMap<usize, Vec<usize>>,
}

#[async_trait]
impl LanguageCapability for MockLanguage {
    async fn classify(
        &self,
        _history: &[Message],
        _signature: &DocumentSignature,
    ) -> Result<RouteResponse> {
        self.log.record("classify");
        Ok(RouteResponse {
            kind: self.route.clone(),
            rationale: "mock rationale".to_string(),
        })
    }

    async fn plan(
        &self,
        _history: &[Message],
        _signature: &DocumentSignature,
    ) -> Result<Vec<String>> {
        self.log.record("plan");
        Ok(self.plan.clone())
    }

    async fn expand_queries(
        &self,
        step: &str,
        _signature: &DocumentSignature,
    ) -> Result<Vec<String>> {
        self.log.record("expand_queries");
        Ok(vec![step.to_string()])
    }

    async fn distill(&self, _question: &str, document_text: &str) -> Result<Vec<String>> {
        self.log.record("distill");
        Ok(self
            .distill_map
            .get(document_text)
            .cloned()
            .unwrap_or_default())
    }

    async fn align(
        &self,
        _steps: &[String],
        _facts: &[String],
    ) -> Result<HashMap<usize, Vec<usize>>> {
        self.log.record("align");
        Ok(self.alignment.clone())
    }

    async fn write_paragraph(&self, _step: &str, facts: &[String]) -> Result<String> {
        self.log.record("write_paragraph");
        Ok(facts.join(" "))
    }

    async fn answer_general(&self, _history: &[Message], _rationale: &str) -> Result<String> {
        self.log.record("answer_general");
        Ok("Here is a general answer.".to_string())
    }
}

/// Serves fixed documents per query
struct MockSearch {
    log: Arc<CallLog>,
    name: &'static str,
    by_query: HashMap<String, Vec<RetrievedDocument>>,
}

#[async_trait]
impl LexicalSearch for MockSearch {
    async fn search(&self, query: &str, _k: usize) -> Result<Vec<RetrievedDocument>> {
        self.log.record(self.name);
        Ok(self.by_query.get(query).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl VectorSearch for MockSearch {
    async fn search(&self, query: &str, _k: usize) -> Result<Vec<RetrievedDocument>> {
        self.log.record(self.name);
        Ok(self.by_query.get(query).cloned().unwrap_or_default())
    }
}

struct PassthroughReranker {
    log: Arc<CallLog>,
}

#[async_trait]
impl Reranker for PassthroughReranker {
    async fn rerank(
        &self,
        _query: &str,
        documents: Vec<RetrievedDocument>,
    ) -> Result<Vec<RetrievedDocument>> {
        self.log.record("rerank");
        Ok(documents)
    }
}

/// Embeds each text onto its own axis: all candidates orthogonal
struct AxisEmbedder {
    log: Arc<CallLog>,
}

#[async_trait]
impl Embedder for AxisEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.log.record("embed");
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let mut v = vec![0.0; texts.len()];
                v[i] = 1.0;
                v
            })
            .collect())
    }
}

struct Fixture {
    log: Arc<CallLog>,
    orchestrator: ResearchOrchestrator,
    receiver: mpsc::Receiver<PipelineEvent>,
}

fn fixture(
    route: &str,
    plan: Vec<&str>,
    by_query: HashMap<String, Vec<RetrievedDocument>>,
    distill_map: HashMap<String, Vec<String>>,
    alignment: HashMap<usize, Vec<usize>>,
) -> Fixture {
    let log = Arc::new(CallLog::default());

    let capabilities = CapabilitySet {
        language: Arc::new(MockLanguage {
            log: log.clone(),
            route: route.to_string(),
            plan: plan.into_iter().map(String::from).collect(),
            distill_map,
            alignment,
        }),
        lexical: Arc::new(MockSearch {
            log: log.clone(),
            name: "lexical_search",
            by_query: by_query.clone(),
        }),
        vector: Arc::new(MockSearch {
            log: log.clone(),
            name: "vector_search",
            by_query,
        }),
        reranker: Arc::new(PassthroughReranker { log: log.clone() }),
        embedder: Arc::new(AxisEmbedder { log: log.clone() }),
    };

    let config = PipelineConfig {
        retry: RetryConfig {
            max_retries: 1,
            base_delay_ms: 1,
        },
        ..Default::default()
    };

    let (orchestrator, receiver) =
        ResearchOrchestrator::new(capabilities, DocumentSignature::default(), config);

    Fixture {
        log,
        orchestrator,
        receiver,
    }
}

fn drain(receiver: &mut mpsc::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

fn doc(content: &str, source: &str) -> RetrievedDocument {
    RetrievedDocument::new(content, source)
}

// Scenario 1: single-step research finds and cites the dataset fact
#[tokio::test]
async fn test_research_happy_path_cites_evidence() {
    let step = "What dataset is used?";
    let content = "We use ImageNet-1k for all experiments in this work.";

    let mut by_query = HashMap::new();
    by_query.insert(step.to_string(), vec![doc(content, "section-4")]);

    let mut distill_map = HashMap::new();
    distill_map.insert(
        content.to_string(),
        vec!["The paper uses ImageNet-1k".to_string()],
    );

    let mut alignment = HashMap::new();
    alignment.insert(0, vec![0]);

    let mut fx = fixture("research", vec![step], by_query, distill_map, alignment);
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, step, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.route, RouteKind::Research);
    let answer = output.answer.unwrap();
    assert_eq!(answer.sections.len(), 1);
    assert_eq!(answer.sections[0].fact_indices, vec![0]);
    assert!(answer.sections[0].paragraph.contains("ImageNet-1k"));
    assert!(output.text.contains("supported by [0]"));

    // The answer was appended to the thread history
    assert!(thread.history().last().unwrap().content.contains("ImageNet-1k"));

    // Events end with Done and contain the node lifecycle
    let events = drain(&mut fx.receiver);
    assert_eq!(events.last().unwrap(), &PipelineEvent::Done);
    assert!(events.contains(&PipelineEvent::NodeEntered {
        name: "query_router".to_string()
    }));
    assert!(events.contains(&PipelineEvent::NodeExited {
        name: "respond".to_string()
    }));
}

// Scenario 2: zero retrieved documents yields the fixed no-evidence text
#[tokio::test]
async fn test_step_without_evidence_gets_fixed_paragraph() {
    let step = "What is the model's training hardware?";

    let mut fx = fixture(
        "research",
        vec![step],
        HashMap::new(),
        HashMap::new(),
        HashMap::new(),
    );
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, step, CancellationToken::new())
        .await
        .unwrap();

    let answer = output.answer.unwrap();
    assert_eq!(answer.sections.len(), 1);
    assert!(answer.sections[0].fact_indices.is_empty());
    assert_eq!(answer.sections[0].paragraph, NO_EVIDENCE_PARAGRAPH);

    // No citation line for an evidence-empty step
    assert!(!output.text.contains("supported by"));

    // The grounded writer is never called without evidence
    assert!(!fx.log.contains("write_paragraph"));
}

// Scenario 3: identical content from different steps is distilled once
#[tokio::test]
async fn test_duplicate_content_across_steps_distilled_once() {
    let content = "The model is trained for 300 epochs.";

    let mut by_query = HashMap::new();
    by_query.insert(
        "How long is training?".to_string(),
        vec![doc(content, "section-3")],
    );
    by_query.insert(
        "What is the schedule?".to_string(),
        vec![doc(content, "appendix-b")],
    );

    let mut distill_map = HashMap::new();
    distill_map.insert(
        content.to_string(),
        vec!["Training runs for 300 epochs".to_string()],
    );

    let mut fx = fixture(
        "research",
        vec!["How long is training?", "What is the schedule?"],
        by_query,
        distill_map,
        HashMap::new(),
    );
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, "training details", CancellationToken::new())
        .await
        .unwrap();

    // Both steps retrieved the same content; dedup kept the first instance
    assert_eq!(fx.log.count("distill"), 1);
    assert_eq!(output.answer.unwrap().sections.len(), 2);
}

// Scenario 4: a general query never touches planning or retrieval
#[tokio::test]
async fn test_general_route_skips_research_nodes() {
    let mut fx = fixture(
        "general",
        vec!["should never be planned"],
        HashMap::new(),
        HashMap::new(),
        HashMap::new(),
    );
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, "What is this tool?", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.route, RouteKind::General);
    assert_eq!(output.text, "Here is a general answer.");
    assert!(output.answer.is_none());

    assert!(fx.log.contains("answer_general"));
    assert!(!fx.log.contains("plan"));
    assert!(!fx.log.contains("lexical_search"));
    assert!(!fx.log.contains("vector_search"));
    assert!(!fx.log.contains("distill"));
    assert!(!fx.log.contains("align"));
}

#[tokio::test]
async fn test_more_info_route_asks_for_clarification() {
    let mut fx = fixture(
        "more_info",
        Vec::new(),
        HashMap::new(),
        HashMap::new(),
        HashMap::new(),
    );
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, "tell me stuff", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.route, RouteKind::MoreInfo);
    assert!(output.text.contains("more detail"));
    assert!(!fx.log.contains("plan"));
}

#[tokio::test]
async fn test_invalid_route_is_fatal_and_emits_error() {
    let mut fx = fixture(
        "hallucinated_route",
        Vec::new(),
        HashMap::new(),
        HashMap::new(),
        HashMap::new(),
    );
    let mut thread = Thread::new();

    let result = fx
        .orchestrator
        .run(&mut thread, "anything", CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ResearchError::InvalidRoute { .. })));

    // One error event terminates the query; nothing follows it
    let events = drain(&mut fx.receiver);
    assert!(matches!(
        events.last().unwrap(),
        PipelineEvent::Error { .. }
    ));
    assert!(!events.contains(&PipelineEvent::Done));

    // classify ran exactly once: configuration errors are never retried
    assert_eq!(fx.log.count("classify"), 1);
}

#[tokio::test]
async fn test_synthesis_preserves_plan_order() {
    let steps = vec!["step alpha", "step beta", "step gamma"];
    let contents = [
        "Evidence text for alpha question.",
        "Evidence text for beta question.",
        "Evidence text for gamma question.",
    ];

    let mut by_query = HashMap::new();
    let mut distill_map = HashMap::new();
    for (step, content) in steps.iter().zip(contents.iter()) {
        by_query.insert(step.to_string(), vec![doc(content, "mock")]);
        distill_map.insert(content.to_string(), vec![format!("fact about {}", step)]);
    }

    // Each step aligned to its own fact
    let mut alignment = HashMap::new();
    alignment.insert(0, vec![0]);
    alignment.insert(1, vec![1]);
    alignment.insert(2, vec![2]);

    let mut fx = fixture("research", steps.clone(), by_query, distill_map, alignment);
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, "everything", CancellationToken::new())
        .await
        .unwrap();

    let answer = output.answer.unwrap();
    assert_eq!(answer.sections.len(), 3);
    for (section, step) in answer.sections.iter().zip(steps.iter()) {
        assert_eq!(section.step, *step);
        assert!(section.paragraph.contains(step));
    }
}

#[tokio::test]
async fn test_sparse_alignment_defaults_missing_steps_to_empty() {
    let steps = vec!["covered step", "uncovered step"];
    let content = "Relevant evidence for the covered step.";

    let mut by_query = HashMap::new();
    by_query.insert(steps[0].to_string(), vec![doc(content, "mock")]);

    let mut distill_map = HashMap::new();
    distill_map.insert(content.to_string(), vec!["a relevant fact".to_string()]);

    // Aligner only answers for step 0; step 1 is a dropped key
    let mut alignment = HashMap::new();
    alignment.insert(0, vec![0]);

    let mut fx = fixture("research", steps, by_query, distill_map, alignment);
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, "question", CancellationToken::new())
        .await
        .unwrap();

    let answer = output.answer.unwrap();
    assert_eq!(answer.sections.len(), 2);
    assert_eq!(answer.sections[0].fact_indices, vec![0]);
    assert_eq!(answer.sections[1].paragraph, NO_EVIDENCE_PARAGRAPH);
}

#[tokio::test]
async fn test_empty_plan_degrades_gracefully() {
    let mut fx = fixture(
        "research",
        Vec::new(),
        HashMap::new(),
        HashMap::new(),
        HashMap::new(),
    );
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, "question", CancellationToken::new())
        .await
        .unwrap();

    let answer = output.answer.unwrap();
    assert!(answer.sections.is_empty());
    assert!(!fx.log.contains("distill"));

    // Nothing to align: the aligner must not be invoked at all
    assert!(!fx.log.contains("align"));

    let events = drain(&mut fx.receiver);
    assert_eq!(events.last().unwrap(), &PipelineEvent::Done);
}

#[tokio::test]
async fn test_cancelled_run_emits_error_not_partial_answer() {
    let mut fx = fixture(
        "research",
        vec!["a step"],
        HashMap::new(),
        HashMap::new(),
        HashMap::new(),
    );
    let mut thread = Thread::new();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = fx.orchestrator.run(&mut thread, "question", cancel).await;
    assert!(matches!(result, Err(ResearchError::Cancelled)));

    let events = drain(&mut fx.receiver);
    assert!(matches!(
        events.last().unwrap(),
        PipelineEvent::Error { .. }
    ));
    assert!(!events.contains(&PipelineEvent::Done));

    // No assistant answer was appended after the error
    assert!(thread
        .history()
        .iter()
        .all(|m| m.content != NO_EVIDENCE_PARAGRAPH));
}

#[tokio::test]
async fn test_plan_longer_than_four_steps_is_clamped() {
    let steps: Vec<&str> = vec!["s1", "s2", "s3", "s4", "s5", "s6"];

    let mut fx = fixture(
        "research",
        steps,
        HashMap::new(),
        HashMap::new(),
        HashMap::new(),
    );
    let mut thread = Thread::new();

    let output = fx
        .orchestrator
        .run(&mut thread, "question", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.answer.unwrap().sections.len(), 4);
}
