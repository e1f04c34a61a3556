//! Reciprocal Rank Fusion for merging ranked lists.
//!
//! # Algorithm
//!
//! RRF score for document `d`: `score(d) = Σ 1/(k + rank_i(d))`
//!
//! Where `rank_i(d)` is the 1-based rank of `d` in list `i` and `k` is a
//! constant (default 60) that flattens the gap between top and lower ranks.
//! A list that does not contain `d` contributes nothing. Only ranks matter;
//! backend scores on the inputs are ignored.

use sift_core::{Candidate, RankedList};
use std::collections::HashMap;

struct Fused {
    candidate: Candidate,
    score: f64,
    best_rank: usize,
    first_seen: usize,
}

/// Merge ranked lists using Reciprocal Rank Fusion.
///
/// # Arguments
///
/// * `lists` - Ranked lists to merge, best first
/// * `rrf_k` - RRF constant
///
/// # Ordering
///
/// Descending fused score, then best (lowest) rank in any list, then the
/// order in which the id was first seen scanning the lists in order. Each
/// output candidate is the first copy seen for its id, with `score` replaced
/// by the fused score.
pub fn reciprocal_rank_fusion(lists: &[RankedList], rrf_k: u32) -> RankedList {
    let mut fused: Vec<Fused> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for list in lists {
        for (pos, candidate) in list.iter().enumerate() {
            let rank = pos + 1;
            let contribution = 1.0 / (f64::from(rrf_k) + rank as f64);
            match slots.get(candidate.id.as_str()) {
                Some(&slot) => {
                    let entry = &mut fused[slot];
                    entry.score += contribution;
                    entry.best_rank = entry.best_rank.min(rank);
                }
                None => {
                    let slot = fused.len();
                    slots.insert(candidate.id.as_str(), slot);
                    fused.push(Fused {
                        candidate: candidate.clone(),
                        score: contribution,
                        best_rank: rank,
                        first_seen: slot,
                    });
                }
            }
        }
    }

    fused.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.best_rank.cmp(&b.best_rank))
            .then(a.first_seen.cmp(&b.first_seen))
    });

    fused
        .into_iter()
        .map(|f| f.candidate.with_score(f.score as f32))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(ids: &[&str]) -> RankedList {
        ids.iter()
            .map(|id| Candidate::new(*id, format!("passage {id}")))
            .collect()
    }

    fn score_of(fused: &RankedList, id: &str) -> f32 {
        fused
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.score)
            .unwrap()
    }

    #[test]
    fn test_two_lists_fused_order_and_scores() {
        let fused = reciprocal_rank_fusion(&[list(&["A", "B", "C"]), list(&["C", "A", "D"])], 60);
        assert_eq!(fused.ids(), vec!["A", "C", "B", "D"]);

        let expected = [
            ("A", 1.0 / 61.0 + 1.0 / 62.0),
            ("C", 1.0 / 63.0 + 1.0 / 61.0),
            ("B", 1.0 / 62.0),
            ("D", 1.0 / 63.0),
        ];
        for (id, score) in expected {
            assert!((score_of(&fused, id) - score as f32).abs() < 1e-6, "score for {id}");
        }
    }

    #[test]
    fn test_text_taken_from_first_copy() {
        let first: RankedList = vec![Candidate::new("x", "from first")].into();
        let second: RankedList = vec![Candidate::new("x", "from second")].into();
        let fused = reciprocal_rank_fusion(&[first, second], 60);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused.at_rank(1).unwrap().text, "from first");
    }

    #[test]
    fn test_embedding_kept_from_first_copy() {
        let semantic: RankedList = vec![Candidate::new("x", "t").with_embedding(vec![1.0, 0.0])].into();
        let lexical = list(&["x"]);
        let fused = reciprocal_rank_fusion(&[semantic, lexical], 60);
        assert_eq!(fused.at_rank(1).unwrap().embedding, Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_ties_broken_by_best_rank_then_first_seen() {
        // "b" and "c" both score 1/61 + 1/63, just above "a" at 2/62.
        let fused = reciprocal_rank_fusion(
            &[list(&["b", "a", "c"]), list(&["c", "a", "b"])],
            60,
        );
        assert_eq!(fused.ids(), vec!["b", "c", "a"]);

        // Identical single-list ranks across two lists: first seen wins.
        let fused = reciprocal_rank_fusion(&[list(&["p"]), list(&["q"])], 60);
        assert_eq!(fused.ids(), vec!["p", "q"]);
    }

    #[test]
    fn test_input_scores_ignored() {
        let low_first: RankedList = vec![
            Candidate::new("a", "first").with_score(0.01),
            Candidate::new("b", "second").with_score(99.0),
        ]
        .into();
        let fused = reciprocal_rank_fusion(&[low_first], 60);
        assert_eq!(fused.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(reciprocal_rank_fusion(&[], 60).is_empty());
        assert!(reciprocal_rank_fusion(&[RankedList::new(), RankedList::new()], 60).is_empty());
        let fused = reciprocal_rank_fusion(&[RankedList::new(), list(&["a"])], 60);
        assert_eq!(fused.ids(), vec!["a"]);
    }

    proptest! {
        #[test]
        fn prop_self_fusion_preserves_order(n in 0usize..30, copies in 1usize..5) {
            let ids: Vec<String> = (0..n).map(|i| format!("doc-{i}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let lists: Vec<RankedList> = (0..copies).map(|_| list(&refs)).collect();
            let fused = reciprocal_rank_fusion(&lists, 60);
            prop_assert_eq!(fused.ids(), refs);
        }

        #[test]
        fn prop_top_everywhere_scores_n_over_k_plus_one(n in 1usize..6, rrf_k in 1u32..200) {
            let lists: Vec<RankedList> = (0..n).map(|_| list(&["top", "other"])).collect();
            let fused = reciprocal_rank_fusion(&lists, rrf_k);
            let expected = n as f64 / (f64::from(rrf_k) + 1.0);
            prop_assert!((f64::from(score_of(&fused, "top")) - expected).abs() < 1e-6);
        }

        #[test]
        fn prop_absent_item_contributes_nothing(rank in 1usize..20) {
            let ids: Vec<String> = (0..rank).map(|i| format!("d{i}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let alone = reciprocal_rank_fusion(&[list(&refs)], 60);
            let with_other = reciprocal_rank_fusion(&[list(&refs), list(&["unrelated"])], 60);
            let last = refs[rank - 1];
            prop_assert_eq!(score_of(&alone, last), score_of(&with_other, last));
        }
    }
}
