//! Maximal Marginal Relevance diversification.
//!
//! Greedily picks candidates that are similar to the query but dissimilar to
//! what has already been picked:
//!
//! `score(i) = λ · sim(i, q) − (1 − λ) · max_{j ∈ selected} sim(i, j)`
//!
//! with the second term taken as 0 while nothing is selected. `λ = 1` ranks
//! purely by relevance; `λ = 0` always picks the item least similar to the
//! current selection.
//!
//! All vectors are normalized to unit length once before selection starts,
//! and each candidate keeps a running maximum similarity to the selection, so
//! a run costs O(k · n) dot products.

use sift_core::vector::{check_dimensions, dot, normalize};
use sift_core::{Candidate, Error, RankedList, Result};

/// Select up to `k` candidates from `candidates` by MMR.
///
/// Returns `min(k, n)` candidates in selection order, each with `score` set to
/// its MMR score at the moment it was picked. Equal scores go to the candidate
/// with the better pool rank.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] if a candidate has no embedding or its
/// dimension differs from the query, and [`Error::Config`] if `lambda_mult`
/// is outside `[0, 1]`.
pub fn select(
    query_vector: &[f32],
    candidates: RankedList,
    k: usize,
    lambda_mult: f32,
) -> Result<RankedList> {
    let order = select_indices(query_vector, candidates.as_slice(), k, lambda_mult)?;

    let mut pool: Vec<Option<Candidate>> = candidates.into_inner().into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|(idx, score)| pool[idx].take().map(|c| c.with_score(score)))
        .collect())
}

/// Pool indices picked by MMR, in selection order, paired with their scores.
pub fn select_indices(
    query_vector: &[f32],
    candidates: &[Candidate],
    k: usize,
    lambda_mult: f32,
) -> Result<Vec<(usize, f32)>> {
    if !(0.0..=1.0).contains(&lambda_mult) {
        return Err(Error::config(format!(
            "lambda_mult must be within [0, 1], got {lambda_mult}"
        )));
    }
    let target = k.min(candidates.len());
    if target == 0 {
        return Ok(Vec::new());
    }

    let query = normalize(query_vector);
    let mut vectors = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let embedding = candidate.embedding.as_deref().ok_or_else(|| {
            Error::invalid_data(format!("Candidate '{}' has no embedding", candidate.id))
        })?;
        check_dimensions(query_vector, embedding)?;
        vectors.push(normalize(embedding));
    }

    let sim_to_query: Vec<f32> = vectors.iter().map(|v| dot(v, &query)).collect();
    let mut sim_to_selected = vec![f32::NEG_INFINITY; vectors.len()];
    let mut taken = vec![false; vectors.len()];
    let mut selected: Vec<(usize, f32)> = Vec::with_capacity(target);

    while selected.len() < target {
        let mut best: Option<(usize, f32)> = None;
        for idx in (0..vectors.len()).filter(|&i| !taken[i]) {
            let redundancy = if selected.is_empty() {
                0.0
            } else {
                sim_to_selected[idx]
            };
            let mut score = lambda_mult * sim_to_query[idx] - (1.0 - lambda_mult) * redundancy;
            if score.is_nan() {
                score = f32::NEG_INFINITY;
            }
            // Strict comparison: earlier pool rank wins ties.
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((idx, score));
            }
        }

        let Some((picked, score)) = best else {
            break;
        };
        taken[picked] = true;
        selected.push((picked, score));

        for idx in (0..vectors.len()).filter(|&i| !taken[i]) {
            let sim = dot(&vectors[idx], &vectors[picked]);
            if sim > sim_to_selected[idx] {
                sim_to_selected[idx] = sim;
            }
        }
    }

    Ok(selected)
}

// ============================================================================
// Tests
// ============================================================================
