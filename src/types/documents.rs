//! Document and evidence types
//!
//! `RetrievedDocument` carries a derived content fingerprint used as the
//! canonical identity for deduplication: hash of the trimmed content, so
//! identical text is the same document regardless of source metadata.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Lightweight precomputed profile of the ingested document
///
/// Produced by the (external) signature extractor; cheap enough to inline
/// into classification and planning prompts without full-text retrieval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSignature {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub topic: Option<String>,
    pub sections: Vec<String>,
    #[serde(default)]
    pub entities: SignatureEntities,
}

/// Detected entity groups from the signature extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureEntities {
    pub methods: Vec<String>,
    pub datasets: Vec<String>,
    pub metrics: Vec<String>,
}

/// Document chunk returned by a retriever
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Chunk text
    pub content: String,

    /// Source label (section heading, page, retriever name)
    pub source: String,

    /// Relevance score if the producing stage assigned one
    pub score: Option<f32>,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            score: None,
        }
    }

    pub fn with_score(content: impl Into<String>, source: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            score: Some(score),
        }
    }

    /// Content fingerprint: hash of the trimmed content.
    ///
    /// Computed on demand, never stored. Identical fingerprint means
    /// identical document regardless of source metadata.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.content.trim().hash(&mut hasher);
        hasher.finish()
    }
}

/// Atomic factual claim distilled from one retrieved document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistilledFact {
    /// The claim text
    pub text: String,

    /// Index of the owning document in the deduplicated pool
    pub document_index: usize,
}

impl DistilledFact {
    pub fn new(text: impl Into<String>, document_index: usize) -> Self {
        Self {
            text: text.into(),
            document_index,
        }
    }
}
