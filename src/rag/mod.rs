//! Retrieval fusion pipeline
//!
//! Hybrid retrieval for one query: sparse + dense ensemble -> reciprocal
//! rank fusion -> external rerank -> MMR diversity re-selection. Plus the
//! content-fingerprint deduplicator applied to the accumulated pool.

pub mod dedup;
pub mod engine;
pub mod fusion;
pub mod mmr;

pub use dedup::dedup_by_content;
pub use engine::FusionEngine;
pub use fusion::rrf_fuse;
pub use mmr::{cosine_similarity, mmr_select};
