//! Core data structures for the research pipeline

pub mod documents;
pub mod messages;
pub mod research;

pub use documents::{DistilledFact, DocumentSignature, RetrievedDocument, SignatureEntities};
pub use messages::{Message, Role, Thread, ThreadStore};
pub use research::{
    Alignment, FinalAnswer, ResearchPlan, RouteDecision, RouteKind, RouteResponse, StepAnswer,
};
