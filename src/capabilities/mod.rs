//! External capability seams
//!
//! Everything the pipeline consumes but does not own lives behind these
//! async traits: structured-output generation, lexical/vector search,
//! reranking and embedding. Hosts wire in real backends; tests wire in
//! mocks. Retry policy is decided by the caller, not the implementation:
//! read-only search/embed/rerank calls go through the [`retry::RetryManager`],
//! generation calls are invoked exactly once.

pub mod retry;

pub use retry::RetryManager;

use crate::errors::Result;
use crate::types::{DocumentSignature, Message, RetrievedDocument, RouteResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Structured-output language model capability
///
/// One trait per deployment rather than per call: all methods hit the same
/// underlying model endpoint with different prompt templates.
#[async_trait]
pub trait LanguageCapability: Send + Sync {
    /// Classify the latest query given history and document signature.
    /// Returns the raw label; enum validation happens in the router node.
    async fn classify(
        &self,
        history: &[Message],
        signature: &DocumentSignature,
    ) -> Result<RouteResponse>;

    /// Produce 0-4 independently researchable step descriptions
    async fn plan(
        &self,
        history: &[Message],
        signature: &DocumentSignature,
    ) -> Result<Vec<String>>;

    /// Refine one plan step into 1-2 retrieval queries
    async fn expand_queries(
        &self,
        step: &str,
        signature: &DocumentSignature,
    ) -> Result<Vec<String>>;

    /// Extract atomic facts from one document for the given question
    async fn distill(&self, question: &str, document_text: &str) -> Result<Vec<String>>;

    /// Map each step to the fact indices that support it (selection only)
    async fn align(
        &self,
        steps: &[String],
        facts: &[String],
    ) -> Result<HashMap<usize, Vec<usize>>>;

    /// Write one paragraph for a step using exactly the given facts
    async fn write_paragraph(&self, step: &str, facts: &[String]) -> Result<String>;

    /// Answer a general (non-research) query directly
    async fn answer_general(&self, history: &[Message], rationale: &str) -> Result<String>;
}

/// Sparse lexical retriever over the ingested document's chunks
#[async_trait]
pub trait LexicalSearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>>;
}

/// Dense similarity retriever backed by the vector index
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>>;
}

/// External relevance reranker; may shrink the set and its ordering is
/// authoritative from that stage on
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: Vec<RetrievedDocument>,
    ) -> Result<Vec<RetrievedDocument>>;
}

/// Text embedding capability
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Bundle of every capability the pipeline consumes
#[derive(Clone)]
pub struct CapabilitySet {
    pub language: Arc<dyn LanguageCapability>,
    pub lexical: Arc<dyn LexicalSearch>,
    pub vector: Arc<dyn VectorSearch>,
    pub reranker: Arc<dyn Reranker>,
    pub embedder: Arc<dyn Embedder>,
}
