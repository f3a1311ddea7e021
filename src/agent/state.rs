//! Per-run pipeline state with append-only merge reducers
//!
//! Fan-out branches never write shared fields directly; they return their
//! results and the orchestrator merges them through these reducers. Every
//! merge appends, never overwrites, so accumulation across parallel
//! branches and sequential steps is deterministic.

use crate::types::{DistilledFact, ResearchPlan, RetrievedDocument};
use serde::{Deserialize, Serialize};

/// State accumulated over one query run
///
/// Only exists for the research route; the routing decision itself lives
/// in the orchestrator's control flow and the returned [`RunOutput`].
///
/// [`RunOutput`]: crate::agent::RunOutput
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Research plan: mutable queue + frozen original
    pub plan: ResearchPlan,

    /// Append-only document pool accumulated across steps.
    /// Insertion order is preserved for deterministic tie-breaks downstream.
    documents: Vec<RetrievedDocument>,

    /// Unique documents after fingerprint deduplication
    pub deduped: Vec<RetrievedDocument>,

    /// Facts distilled from the deduplicated pool, flattened in document
    /// submission order
    facts: Vec<DistilledFact>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step's retrieved documents to the pool
    pub fn merge_documents(&mut self, batch: Vec<RetrievedDocument>) {
        self.documents.extend(batch);
    }

    /// Append one distillation branch's facts
    pub fn merge_facts(&mut self, batch: Vec<DistilledFact>) {
        self.facts.extend(batch);
    }

    /// Accumulated document pool
    pub fn documents(&self) -> &[RetrievedDocument] {
        &self.documents
    }

    /// Flattened fact list
    pub fn facts(&self) -> &[DistilledFact] {
        &self.facts
    }

    /// Fact texts for the alignment call
    pub fn fact_texts(&self) -> Vec<String> {
        self.facts.iter().map(|f| f.text.clone()).collect()
    }
}
