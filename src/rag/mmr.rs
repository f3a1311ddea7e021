//! Maximal Marginal Relevance diversity re-selection
//!
//! MMR = λ × sim(doc, query) − (1−λ) × max_sim(doc, selected)
//!
//! Greedy selection over embedded candidates: each round picks the
//! candidate with the highest marginal score until k are chosen or the
//! candidates are exhausted. λ = 1.0 is pure relevance, 0.0 pure diversity.

/// Cosine similarity between two vectors
///
/// Returns 0.0 for zero-magnitude or length-mismatched inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Select up to k candidate indices maximizing marginal relevance.
///
/// Returned indices are in selection order and contain no duplicates.
/// Ties go to the earliest candidate index.
pub fn mmr_select(
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
    lambda: f32,
) -> Vec<usize> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_position = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (position, &candidate) in remaining.iter().enumerate() {
            let max_similarity = selected
                .iter()
                .map(|&s| cosine_similarity(&candidates[candidate], &candidates[s]))
                .fold(f32::NEG_INFINITY, f32::max);
            let max_similarity = if selected.is_empty() {
                0.0
            } else {
                max_similarity
            };

            let score = lambda * relevance[candidate] - (1.0 - lambda) * max_similarity;

            if score > best_score {
                best_score = score;
                best_position = position;
            }
        }

        selected.push(remaining.remove(best_position));
    }

    selected
}
