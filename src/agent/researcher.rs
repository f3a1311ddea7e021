//! Sub-research orchestrator: one plan step to retrieved documents
//!
//! Node sequence per step: expand the step into 1-2 refined queries, fan
//! out one fusion-engine retrieval per query in parallel, merge the branch
//! results by concatenation in submission order. Zero generated queries
//! means "no evidence for this step", not a failure. A cancelled fan-out
//! never partially merges: results are dropped whole.

use crate::capabilities::LanguageCapability;
use crate::errors::{ResearchError, Result};
use crate::rag::FusionEngine;
use crate::types::{DocumentSignature, RetrievedDocument};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-step researcher wrapping query expansion and parallel retrieval
pub struct SubResearcher {
    language: Arc<dyn LanguageCapability>,
    engine: Arc<FusionEngine>,
    max_queries: usize,
    verbose: bool,
}

impl SubResearcher {
    pub fn new(
        language: Arc<dyn LanguageCapability>,
        engine: Arc<FusionEngine>,
        max_queries: usize,
    ) -> Self {
        Self {
            language,
            engine,
            max_queries,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Research one plan step, returning its merged document list.
    ///
    /// Branch isolation: any capability failure degrades to an empty
    /// contribution for that query; only cancellation propagates.
    pub async fn research_step(
        &self,
        step: &str,
        signature: &DocumentSignature,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievedDocument>> {
        if cancel.is_cancelled() {
            return Err(ResearchError::Cancelled);
        }

        // Generation call: invoked exactly once, not retried
        let queries = match self.language.expand_queries(step, signature).await {
            Ok(queries) => queries,
            Err(e) => {
                if self.verbose {
                    eprintln!("[RESEARCH] query expansion failed for step: {}", e);
                }
                return Ok(Vec::new());
            }
        };

        let queries: Vec<String> = queries.into_iter().take(self.max_queries).collect();
        if queries.is_empty() {
            // No refined queries: no evidence for this step, not fatal
            if self.verbose {
                eprintln!("[RESEARCH] no queries generated for step: {}", step);
            }
            return Ok(Vec::new());
        }

        if cancel.is_cancelled() {
            return Err(ResearchError::Cancelled);
        }

        // Fan out one retrieval per query; join_all collects results in
        // submission order regardless of completion order
        let branches = queries.iter().map(|query| self.engine.retrieve(query));
        let results = join_all(branches).await;

        // All-or-nothing: a cancelled fan-out merges nothing
        if cancel.is_cancelled() {
            return Err(ResearchError::Cancelled);
        }

        let mut documents = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(batch) => documents.extend(batch),
                Err(e) => {
                    if self.verbose {
                        eprintln!(
                            "[RESEARCH] retrieval branch {} degraded to empty: {}",
                            index, e
                        );
                    }
                }
            }
        }

        if self.verbose {
            eprintln!(
                "[RESEARCH] {} documents retrieved for step: {}",
                documents.len(),
                step
            );
        }

        Ok(documents)
    }
}
