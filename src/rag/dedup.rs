//! Pool deduplication by content fingerprint
//!
//! Pure function over the accumulated document pool: identical trimmed
//! content means identical document, the first-seen instance survives.

use crate::types::RetrievedDocument;
use std::collections::HashSet;

/// Remove duplicate documents by content fingerprint, preserving
/// first-seen order.
pub fn dedup_by_content(documents: &[RetrievedDocument]) -> Vec<RetrievedDocument> {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut unique = Vec::new();

    for document in documents {
        if seen.insert(document.fingerprint()) {
            unique.push(document.clone());
        }
    }

    unique
}
