//! Evidence alignment normalization and grounded synthesis
//!
//! Alignment output from the language capability is normalized into a total
//! mapping (one entry per step index, missing keys defaulted to empty).
//! Synthesis then writes one paragraph per step in original plan order,
//! restricted to exactly the aligned facts; evidence-empty steps get a
//! fixed "information not available" paragraph. Assembly is a pure
//! function of (steps, alignment, paragraphs).

use crate::capabilities::LanguageCapability;
use crate::errors::{ResearchError, Result};
use crate::events::EventBus;
use crate::types::{Alignment, DistilledFact, FinalAnswer, StepAnswer};
use std::collections::HashMap;
use std::sync::Arc;

/// Fixed paragraph for steps with no supporting evidence
pub const NO_EVIDENCE_PARAGRAPH: &str =
    "The provided evidence does not contain information about this aspect.";

/// Normalize a raw alignment response into a total step-indexed mapping.
///
/// Every step index in `[0, num_steps)` gets exactly one entry; a missing
/// key is a contract violation defaulted to an empty list rather than
/// propagated. A fact index outside `[0, fact_count)` is out-of-enum and
/// fatal.
pub fn normalize_alignment(
    num_steps: usize,
    raw: HashMap<usize, Vec<usize>>,
    fact_count: usize,
) -> Result<Alignment> {
    let mut alignment: Alignment = Vec::with_capacity(num_steps);

    for step in 0..num_steps {
        let fact_indices = raw.get(&step).cloned().unwrap_or_default();

        for &fact_index in &fact_indices {
            if fact_index >= fact_count {
                return Err(ResearchError::InvalidAlignment {
                    step,
                    fact_index,
                    fact_count,
                });
            }
        }

        alignment.push(fact_indices);
    }

    Ok(alignment)
}

/// Assemble the final answer from per-step paragraphs.
///
/// Pure function: step order and count always match the original plan,
/// even when some steps are evidence-empty.
pub fn assemble(steps: &[String], alignment: &Alignment, paragraphs: Vec<String>) -> FinalAnswer {
    let sections = steps
        .iter()
        .zip(alignment.iter())
        .zip(paragraphs)
        .map(|((step, fact_indices), paragraph)| StepAnswer {
            step: step.clone(),
            paragraph,
            fact_indices: fact_indices.clone(),
        })
        .collect();

    FinalAnswer { sections }
}

/// Render the final answer as the user-facing markdown text
pub fn render_answer(answer: &FinalAnswer) -> String {
    let mut text = String::from(
        "To answer your research inquiry based on the submitted document:\n\n",
    );

    for section in &answer.sections {
        text.push_str(&format!("### {}\n", section.step));
        text.push_str(&format!("- {}\n\n", section.paragraph));
        if !section.fact_indices.is_empty() {
            text.push_str(&format!("supported by {:?}\n\n", section.fact_indices));
        }
        text.push_str("---\n");
    }

    text
}

/// Grounded per-step writer
pub struct Synthesizer {
    language: Arc<dyn LanguageCapability>,
    verbose: bool,
}

impl Synthesizer {
    pub fn new(language: Arc<dyn LanguageCapability>) -> Self {
        Self {
            language,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Write one paragraph per step in original plan order.
    ///
    /// Each paragraph is emitted to the event bus as a content chunk as it
    /// completes. A failed write degrades that step to the no-evidence
    /// paragraph; it never aborts the other steps.
    pub async fn synthesize(
        &self,
        steps: &[String],
        alignment: &Alignment,
        facts: &[DistilledFact],
        events: &EventBus,
    ) -> FinalAnswer {
        let mut paragraphs = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let fact_indices = &alignment[index];
            let paragraph = if fact_indices.is_empty() {
                NO_EVIDENCE_PARAGRAPH.to_string()
            } else {
                let selected: Vec<String> = fact_indices
                    .iter()
                    .map(|&i| facts[i].text.clone())
                    .collect();

                // Generation call: invoked exactly once, degraded on failure
                match self.language.write_paragraph(step, &selected).await {
                    Ok(text) => text,
                    Err(e) => {
                        if self.verbose {
                            eprintln!("[SYNTH] paragraph for step {} failed: {}", index, e);
                        }
                        NO_EVIDENCE_PARAGRAPH.to_string()
                    }
                }
            };

            events.chunk(&paragraph);
            paragraphs.push(paragraph);
        }

        assemble(steps, alignment, paragraphs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fills_missing_steps() {
        let mut raw = HashMap::new();
        raw.insert(0, vec![1]);
        // Steps 1 and 2 omitted by the aligner

        let alignment = normalize_alignment(3, raw, 2).unwrap();

        assert_eq!(alignment.len(), 3);
        assert_eq!(alignment[0], vec![1]);
        assert!(alignment[1].is_empty());
        assert!(alignment[2].is_empty());
    }

    #[test]
    fn test_normalize_rejects_out_of_range_fact() {
        let mut raw = HashMap::new();
        raw.insert(0, vec![5]);

        let err = normalize_alignment(1, raw, 3).unwrap_err();
        assert!(matches!(err, ResearchError::InvalidAlignment { .. }));
    }

    #[test]
    fn test_normalize_ignores_spurious_step_keys() {
        let mut raw = HashMap::new();
        raw.insert(7, vec![0]);

        let alignment = normalize_alignment(2, raw, 1).unwrap();
        assert_eq!(alignment.len(), 2);
        assert!(alignment[0].is_empty());
        assert!(alignment[1].is_empty());
    }

    #[test]
    fn test_normalize_zero_steps() {
        let alignment = normalize_alignment(0, HashMap::new(), 0).unwrap();
        assert!(alignment.is_empty());
    }

    #[test]
    fn test_assemble_preserves_order_and_count() {
        let steps = vec!["first".to_string(), "second".to_string()];
        let alignment = vec![vec![0], Vec::new()];
        let paragraphs = vec!["answer one".to_string(), NO_EVIDENCE_PARAGRAPH.to_string()];

        let answer = assemble(&steps, &alignment, paragraphs);

        assert_eq!(answer.sections.len(), 2);
        assert_eq!(answer.sections[0].step, "first");
        assert_eq!(answer.sections[0].fact_indices, vec![0]);
        assert_eq!(answer.sections[1].paragraph, NO_EVIDENCE_PARAGRAPH);
        assert!(answer.sections[1].fact_indices.is_empty());
    }

    #[test]
    fn test_render_cites_only_evidenced_sections() {
        let answer = FinalAnswer {
            sections: vec![
                StepAnswer {
                    step: "What dataset is used?".to_string(),
                    paragraph: "The paper uses ImageNet-1k.".to_string(),
                    fact_indices: vec![0],
                },
                StepAnswer {
                    step: "What hardware?".to_string(),
                    paragraph: NO_EVIDENCE_PARAGRAPH.to_string(),
                    fact_indices: Vec::new(),
                },
            ],
        };

        let text = render_answer(&answer);
        assert!(text.contains("supported by [0]"));
        assert!(text.contains("ImageNet-1k"));
        // The no-evidence section carries no citation line
        let hardware_part = text.split("What hardware?").nth(1).unwrap();
        assert!(!hardware_part.contains("supported by"));
    }
}
