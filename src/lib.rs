//! PaperScout - grounded document research pipeline
//!
//! Answers questions about a single ingested document by routing the query,
//! planning multi-step research, fusing evidence from hybrid retrieval,
//! distilling per-document facts and synthesizing a grounded answer.
//!
//! # Architecture
//!
//! - **agent**: node-graph orchestration with sequential step loop and
//!   parallel fan-out/fan-in over append-only state
//! - **rag**: hybrid retrieval ensemble, RRF, MMR and deduplication
//! - **synthesis**: alignment normalization and grounded per-step writing
//! - **capabilities**: async trait seams for everything external (search,
//!   embeddings, reranking, structured generation)

pub mod errors;
pub mod types;
pub mod config;
pub mod events;
pub mod capabilities;
pub mod rag;
pub mod synthesis;
pub mod agent;

// Re-export commonly used types
pub use errors::{ResearchError, Result};
pub use agent::{ResearchOrchestrator, RunOutput};
pub use events::{EventBus, PipelineEvent};
