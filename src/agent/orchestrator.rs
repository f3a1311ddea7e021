//! Main research orchestrator
//!
//! Drives the node graph for one query:
//!
//! ```text
//! query_router -> answer_general_query
//!              -> ask_for_more_info
//!              -> create_research_plan -> conduct_research (loop)
//!                 -> post_process_document -> distill_documents (fan-out)
//!                 -> respond
//! ```
//!
//! The step loop is strictly sequential: step N's retrieval starts only
//! after step N-1 has merged. Distillation fans out one branch per unique
//! document and reassembles facts by submission index. Cancellation is
//! checked at every node boundary; a single error event terminates the
//! query and nothing is emitted after it.

use crate::agent::researcher::SubResearcher;
use crate::agent::state::RunState;
use crate::capabilities::{CapabilitySet, RetryManager};
use crate::config::PipelineConfig;
use crate::errors::{ResearchError, Result};
use crate::events::{EventBus, PipelineEvent};
use crate::rag::{dedup_by_content, FusionEngine};
use crate::synthesis::{normalize_alignment, render_answer, Synthesizer};
use crate::types::{
    DistilledFact, DocumentSignature, FinalAnswer, ResearchPlan, RouteDecision, RouteKind, Thread,
};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Fixed reply for queries the router classified as too vague
const CLARIFICATION_TEXT: &str =
    "Could you share more detail about what you would like to know about the document? \
     For example the specific method, experiment, or result you are interested in.";

/// Outcome of one query run
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Which route the query took
    pub route: RouteKind,

    /// User-facing answer text, also appended to the thread history
    pub text: String,

    /// Structured research answer; `None` for general/clarification routes
    pub answer: Option<FinalAnswer>,
}

/// Main orchestrator: owns the node graph and the shared-state reducers
pub struct ResearchOrchestrator {
    capabilities: CapabilitySet,
    researcher: SubResearcher,
    synthesizer: Synthesizer,
    signature: DocumentSignature,
    config: PipelineConfig,
    events: EventBus,
}

impl ResearchOrchestrator {
    /// Create an orchestrator over the given capabilities and document
    /// signature. Returns the event receiver for the host transport.
    pub fn new(
        capabilities: CapabilitySet,
        signature: DocumentSignature,
        config: PipelineConfig,
    ) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (events, receiver) = EventBus::new();

        let retry = RetryManager::with_config(config.retry.max_retries, config.retry.base_delay_ms);
        let engine = Arc::new(
            FusionEngine::new(&capabilities, config.retrieval.clone(), retry)
                .with_verbose(config.verbose),
        );
        let researcher = SubResearcher::new(
            capabilities.language.clone(),
            engine,
            config.max_queries_per_step,
        )
        .with_verbose(config.verbose);
        let synthesizer =
            Synthesizer::new(capabilities.language.clone()).with_verbose(config.verbose);

        (
            Self {
                capabilities,
                researcher,
                synthesizer,
                signature,
                config,
                events,
            },
            receiver,
        )
    }

    /// Process one query on the given thread.
    ///
    /// Exclusive access to the thread for the whole run comes from the
    /// mutable borrow; no concurrent mutation of one thread's state is
    /// possible. On error a single error event is emitted and no content
    /// follows it.
    pub async fn run(
        &self,
        thread: &mut Thread,
        question: &str,
        cancel: CancellationToken,
    ) -> Result<RunOutput> {
        match self.run_inner(thread, question, &cancel).await {
            Ok(output) => {
                self.events.emit(PipelineEvent::Done);
                Ok(output)
            }
            Err(e) => {
                self.events.emit(PipelineEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        thread: &mut Thread,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutput> {
        thread.push_user(question);
        self.checkpoint(cancel)?;

        // ---- query_router ----
        self.enter("query_router");
        let response = self
            .capabilities
            .language
            .classify(thread.history(), &self.signature)
            .await?;
        // Closed-enum validation: out-of-enum is fatal, never retried
        let decision = RouteDecision::from_response(response)?;
        if self.config.verbose {
            eprintln!("[GRAPH] routed as {:?}: {}", decision.kind, decision.rationale);
        }
        self.exit("query_router");
        self.checkpoint(cancel)?;

        match decision.kind {
            RouteKind::General => self.answer_general(thread, &decision).await,
            RouteKind::MoreInfo => self.ask_for_more_info(thread),
            RouteKind::Research => self.conduct_research(thread, question, cancel).await,
        }
    }

    /// General route: answer directly from history, no retrieval
    async fn answer_general(
        &self,
        thread: &mut Thread,
        decision: &RouteDecision,
    ) -> Result<RunOutput> {
        self.enter("answer_general_query");
        let text = self
            .capabilities
            .language
            .answer_general(thread.history(), &decision.rationale)
            .await?;
        self.events.chunk(&text);
        thread.push_assistant(text.clone());
        self.exit("answer_general_query");

        Ok(RunOutput {
            route: RouteKind::General,
            text,
            answer: None,
        })
    }

    /// Clarification route: fixed request for more detail
    fn ask_for_more_info(&self, thread: &mut Thread) -> Result<RunOutput> {
        self.enter("ask_for_more_info");
        self.events.chunk(CLARIFICATION_TEXT);
        thread.push_assistant(CLARIFICATION_TEXT);
        self.exit("ask_for_more_info");

        Ok(RunOutput {
            route: RouteKind::MoreInfo,
            text: CLARIFICATION_TEXT.to_string(),
            answer: None,
        })
    }

    /// Research route: plan, research, dedup, distill, align, synthesize
    async fn conduct_research(
        &self,
        thread: &mut Thread,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutput> {
        let mut state = RunState::new();

        // ---- create_research_plan ----
        self.enter("create_research_plan");
        let steps = self
            .capabilities
            .language
            .plan(thread.history(), &self.signature)
            .await?;
        state.plan = ResearchPlan::new(steps, self.config.max_plan_steps);
        if self.config.verbose {
            eprintln!("[GRAPH] research plan has {} steps", state.plan.len());
        }
        self.exit("create_research_plan");

        // ---- conduct_research: strictly sequential step loop ----
        self.enter("conduct_research");
        while let Some(step) = state.plan.next_step() {
            self.checkpoint(cancel)?;
            let documents = self
                .researcher
                .research_step(&step, &self.signature, cancel)
                .await?;
            // Branches never touch the pool; the reducer owns the merge
            state.merge_documents(documents);
        }
        self.exit("conduct_research");
        self.checkpoint(cancel)?;

        // ---- post_process_document ----
        self.enter("post_process_document");
        state.deduped = dedup_by_content(state.documents());
        if self.config.verbose {
            eprintln!(
                "[GRAPH] {} documents deduplicated to {}",
                state.documents().len(),
                state.deduped.len()
            );
        }
        self.exit("post_process_document");
        self.checkpoint(cancel)?;

        // ---- distill_documents: fan out one branch per unique document ----
        self.enter("distill_documents");
        let branches = state.deduped.iter().map(|document| {
            let language = self.capabilities.language.clone();
            let content = document.content.clone();
            let question = question.to_string();
            async move { language.distill(&question, &content).await }
        });
        let results = join_all(branches).await;

        // All-or-nothing merge: a cancelled fan-out contributes nothing
        self.checkpoint(cancel)?;

        // Reassemble by submission index, not completion order
        for (document_index, result) in results.into_iter().enumerate() {
            let facts = match result {
                Ok(texts) => texts
                    .into_iter()
                    .map(|text| DistilledFact::new(text, document_index))
                    .collect(),
                Err(e) => {
                    if self.config.verbose {
                        eprintln!(
                            "[GRAPH] distillation of document {} degraded to empty: {}",
                            document_index, e
                        );
                    }
                    Vec::new()
                }
            };
            state.merge_facts(facts);
        }
        if self.config.verbose {
            eprintln!("[GRAPH] {} facts distilled", state.facts().len());
        }
        self.exit("distill_documents");
        self.checkpoint(cancel)?;

        // ---- respond ----
        self.enter("respond");
        let steps = state.plan.original_steps().to_vec();
        let fact_texts = state.fact_texts();

        // Alignment is selection-only; a failed call degrades to an empty
        // mapping which the normalizer fills out per step. An empty plan
        // has nothing to align, so the call is skipped outright.
        let raw_alignment = if steps.is_empty() {
            HashMap::new()
        } else {
            match self.capabilities.language.align(&steps, &fact_texts).await {
                Ok(raw) => raw,
                Err(e) => {
                    if self.config.verbose {
                        eprintln!("[GRAPH] alignment degraded to empty: {}", e);
                    }
                    HashMap::new()
                }
            }
        };
        let alignment = normalize_alignment(steps.len(), raw_alignment, fact_texts.len())?;

        let answer = self
            .synthesizer
            .synthesize(&steps, &alignment, state.facts(), &self.events)
            .await;

        let text = render_answer(&answer);
        thread.push_assistant(text.clone());
        self.exit("respond");

        Ok(RunOutput {
            route: RouteKind::Research,
            text,
            answer: Some(answer),
        })
    }

    /// Cooperative cancellation check at a node boundary
    fn checkpoint(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(ResearchError::Cancelled);
        }
        Ok(())
    }

    fn enter(&self, name: &str) {
        if self.config.verbose {
            eprintln!("[GRAPH] enter node: {}", name);
        }
        self.events.node_entered(name);
    }

    fn exit(&self, name: &str) {
        if self.config.verbose {
            eprintln!("[GRAPH] exit node: {}", name);
        }
        self.events.node_exited(name);
    }
}
