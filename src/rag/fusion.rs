//! Reciprocal Rank Fusion for multiple retrievers
//!
//! A document at 1-indexed rank r in a list contributes 1/(k + r) to its
//! total score; scores are summed across lists and the top-n survive.
//! Identity inside fusion is a content-prefix key (first 50 characters),
//! matching what the base retrievers emit. Ties are broken by first-seen
//! position in the concatenated inputs, which makes the fusion fully
//! deterministic for identical inputs.

use crate::types::RetrievedDocument;
use std::collections::HashMap;

/// Length of the content prefix used as the intra-fusion identity key
const PREFIX_LEN: usize = 50;

/// Content-prefix identity key for a document inside fusion
fn prefix_key(content: &str) -> String {
    content.chars().take(PREFIX_LEN).collect()
}

struct FusionEntry {
    score: f64,
    first_seen: usize,
    document: RetrievedDocument,
}

/// Fuse ranked retriever results into a single top-n list.
///
/// The representative instance for each identity key is the first-seen
/// document carrying that key; its `score` field is overwritten with the
/// summed fusion score.
pub fn rrf_fuse(
    results: &[Vec<RetrievedDocument>],
    k: f64,
    top_n: usize,
) -> Vec<RetrievedDocument> {
    let mut entries: HashMap<String, FusionEntry> = HashMap::new();
    let mut position = 0usize;

    for list in results {
        for (index, document) in list.iter().enumerate() {
            let rank = index + 1;
            let contribution = 1.0 / (k + rank as f64);
            let key = prefix_key(&document.content);

            match entries.get_mut(&key) {
                Some(entry) => entry.score += contribution,
                None => {
                    entries.insert(
                        key,
                        FusionEntry {
                            score: contribution,
                            first_seen: position,
                            document: document.clone(),
                        },
                    );
                }
            }
            position += 1;
        }
    }

    let mut fused: Vec<FusionEntry> = entries.into_values().collect();

    // Score descending, first-seen ascending on ties
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.first_seen.cmp(&b.first_seen))
    });
    fused.truncate(top_n);

    fused
        .into_iter()
        .map(|e| {
            let mut document = e.document;
            document.score = Some(e.score as f32);
            document
        })
        .collect()
}
