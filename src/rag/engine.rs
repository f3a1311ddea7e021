//! Retrieval fusion engine
//!
//! Full pipeline for one query: sparse + dense ensemble -> RRF -> external
//! rerank -> MMR. Each stage degrades independently: a failed base
//! retriever contributes an empty list, a failed rerank or embed aborts
//! fusion for this query only (zero documents for the branch), never the
//! whole plan.

use crate::capabilities::{CapabilitySet, Embedder, LexicalSearch, Reranker, RetryManager, VectorSearch};
use crate::config::RetrievalConfig;
use crate::errors::Result;
use crate::rag::fusion::rrf_fuse;
use crate::rag::mmr::mmr_select;
use crate::types::RetrievedDocument;
use std::sync::Arc;

/// Hybrid retrieval engine for a single query
pub struct FusionEngine {
    lexical: Arc<dyn LexicalSearch>,
    vector: Arc<dyn VectorSearch>,
    reranker: Arc<dyn Reranker>,
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
    retry: RetryManager,
    verbose: bool,
}

impl FusionEngine {
    /// Create a fusion engine over the given capability set
    pub fn new(capabilities: &CapabilitySet, config: RetrievalConfig, retry: RetryManager) -> Self {
        Self {
            lexical: capabilities.lexical.clone(),
            vector: capabilities.vector.clone(),
            reranker: capabilities.reranker.clone(),
            embedder: capabilities.embedder.clone(),
            config,
            retry,
            verbose: false,
        }
    }

    /// Enable verbose logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run the fusion pipeline for one query.
    ///
    /// Returns at most `mmr_k` documents ordered by MMR selection. An error
    /// means fusion was aborted for this query; the caller treats it as an
    /// empty branch.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        let k = self.config.retriever_k;

        // Stage 1: base retrievers, independent, no ordering dependency.
        // Read-only and idempotent, so both are retried; a retriever that
        // still fails contributes an empty list.
        let (sparse, dense) = tokio::join!(
            self.retry
                .execute_with_retry(|| async { self.lexical.search(query, k).await }),
            self.retry
                .execute_with_retry(|| async { self.vector.search(query, k).await }),
        );

        let sparse = sparse.unwrap_or_else(|e| {
            if self.verbose {
                eprintln!("[FUSION] lexical retriever failed: {}", e);
            }
            Vec::new()
        });
        let dense = dense.unwrap_or_else(|e| {
            if self.verbose {
                eprintln!("[FUSION] vector retriever failed: {}", e);
            }
            Vec::new()
        });

        if sparse.is_empty() && dense.is_empty() {
            return Ok(Vec::new());
        }

        // Stage 2: reciprocal rank fusion
        let fused = rrf_fuse(
            &[sparse, dense],
            self.config.rrf_k,
            self.config.rrf_top_n,
        );
        if self.verbose {
            eprintln!("[FUSION] {} documents after rank fusion", fused.len());
        }
        if fused.is_empty() {
            return Ok(Vec::new());
        }

        // Stage 3: external rerank. May shrink the set; its ordering is
        // authoritative from here on.
        let reranked = self
            .retry
            .execute_with_retry(|| {
                let candidates = fused.clone();
                async move { self.reranker.rerank(query, candidates).await }
            })
            .await?;
        if self.verbose {
            eprintln!("[FUSION] {} documents after rerank", reranked.len());
        }
        if reranked.is_empty() {
            return Ok(Vec::new());
        }

        // Stage 4: MMR diversity re-selection over query + candidates,
        // embedded in a single call
        let mut texts: Vec<String> = Vec::with_capacity(reranked.len() + 1);
        texts.push(query.to_string());
        texts.extend(reranked.iter().map(|d| d.content.clone()));

        let vectors = self
            .retry
            .execute_with_retry(|| {
                let batch = texts.clone();
                async move { self.embedder.embed(&batch).await }
            })
            .await?;

        let (query_vector, candidate_vectors) = match vectors.split_first() {
            Some(split) => split,
            None => return Ok(Vec::new()),
        };

        let picked = mmr_select(
            query_vector,
            candidate_vectors,
            self.config.mmr_k,
            self.config.mmr_lambda,
        );
        if self.verbose {
            eprintln!("[FUSION] {} documents after MMR selection", picked.len());
        }

        Ok(picked.into_iter().map(|i| reranked[i].clone()).collect())
    }
}
