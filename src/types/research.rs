//! Routing, planning, alignment and answer types
//!
//! The research plan keeps two views in sync: a mutable FIFO work queue
//! consumed by the step loop, and a frozen original copy used to structure
//! the final answer. Both must stay equal in order and count at creation.

use crate::errors::{ResearchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Query classification, validated into a closed enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// Multi-step research over the ingested document
    Research,
    /// General question answerable without retrieval
    General,
    /// Query too vague; ask the user for clarification
    MoreInfo,
}

impl RouteKind {
    /// Decode a raw classifier label into the closed enum.
    ///
    /// The label set is exactly {research, general, more_info}; anything
    /// else is a fatal configuration error, never retried.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "research" => Ok(RouteKind::Research),
            "general" => Ok(RouteKind::General),
            "more_info" => Ok(RouteKind::MoreInfo),
            other => Err(ResearchError::InvalidRoute {
                value: other.to_string(),
            }),
        }
    }
}

/// Raw classifier output before enum validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    /// Classification label, to be validated via [`RouteKind::parse`]
    #[serde(rename = "type")]
    pub kind: String,
    /// Classifier's reasoning, forwarded to the general-answer prompt
    pub rationale: String,
}

/// Validated routing decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub kind: RouteKind,
    pub rationale: String,
}

impl RouteDecision {
    /// Validate a raw classifier response into a decision
    pub fn from_response(response: RouteResponse) -> Result<Self> {
        Ok(Self {
            kind: RouteKind::parse(&response.kind)?,
            rationale: response.rationale,
        })
    }
}

/// Ordered research plan with a mutable work queue and a frozen copy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Work queue consumed front-to-back by the step loop
    queue: VecDeque<String>,
    /// Immutable original, used to structure the final answer
    original: Vec<String>,
}

impl ResearchPlan {
    /// Build a plan from planner output, clamping to `max_steps`.
    ///
    /// The length bound is enforced here, at planning time only; downstream
    /// stages take whatever plan they are handed.
    pub fn new(steps: Vec<String>, max_steps: usize) -> Self {
        let mut steps = steps;
        steps.truncate(max_steps);
        Self {
            queue: steps.iter().cloned().collect(),
            original: steps,
        }
    }

    /// Pop the next step from the work queue
    pub fn next_step(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Steps remaining in the work queue
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Frozen original step list
    pub fn original_steps(&self) -> &[String] {
        &self.original
    }

    /// Number of steps in the original plan
    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Step-index to fact-index mapping, total over all step indices
///
/// Built via [`crate::synthesis::normalize_alignment`], which guarantees one
/// entry per step index in `[0, num_steps)`.
pub type Alignment = Vec<Vec<usize>>;

/// One answered plan step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepAnswer {
    /// Step description from the original plan
    pub step: String,
    /// Grounded paragraph (or the fixed no-evidence text)
    pub paragraph: String,
    /// Indices into the flattened fact list supporting the paragraph
    pub fact_indices: Vec<usize>,
}

/// Final answer: one section per original plan step, in plan order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub sections: Vec<StepAnswer>,
}
