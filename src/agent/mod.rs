//! Workflow orchestration: the main node graph and the per-step
//! sub-research graph, plus the run state they accumulate into

pub mod orchestrator;
pub mod researcher;
pub mod state;

pub use orchestrator::{ResearchOrchestrator, RunOutput};
pub use researcher::SubResearcher;
pub use state::RunState;
