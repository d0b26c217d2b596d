//! Consensus over per-chunk answers
//!
//! Every extractor collapses its chunk answers with one of two primitives:
//! [`pick_by_score`] when the backend scores its answers, [`majority_vote`]
//! otherwise. Both break ties the same way: the candidate seen first in chunk
//! order wins.

use arbor_domain::{ScoredAnswer, NA};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Answers collected from one batch call, one per chunk
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkAnswers {
    /// Answers from an unscored backend
    Unscored(Vec<String>),
    /// Answers from a scored backend
    Scored(Vec<ScoredAnswer>),
}

impl ChunkAnswers {
    /// Number of chunk answers
    pub fn len(&self) -> usize {
        match self {
            ChunkAnswers::Unscored(answers) => answers.len(),
            ChunkAnswers::Scored(answers) => answers.len(),
        }
    }

    /// Returns true if no chunk answered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Value of the highest-scoring item
///
/// The earliest item wins a tie. NaN scores are ignored. Returns `None` when
/// no item has a usable score.
pub fn pick_by_score<T>(items: impl IntoIterator<Item = (T, f64)>) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for (value, score) in items {
        if score.is_nan() {
            continue;
        }
        if best.as_ref().map_or(true, |(_, best_score)| score > *best_score) {
            best = Some((value, score));
        }
    }
    best.map(|(value, _)| value)
}

/// Most frequent value
///
/// Counts are kept in order of first appearance and the first value to hold
/// the maximal count wins, so among equally frequent values the one seen
/// earliest is returned. Returns `None` for an empty input.
pub fn majority_vote<T>(values: impl IntoIterator<Item = T>) -> Option<T>
where
    T: Eq + Hash + Clone,
{
    let mut order: Vec<(T, usize)> = Vec::new();
    let mut index: HashMap<T, usize> = HashMap::new();

    for value in values {
        match index.get(&value) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(value.clone(), order.len());
                order.push((value, 1));
            }
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in order {
        if best.as_ref().map_or(true, |(_, best_count)| count > *best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Collapse chunk answers into one final answer
///
/// `accept` is the extractor's validity filter: it returns the (possibly
/// normalized) value an answer contributes, or `None` to discard it. Scored
/// answers are ranked after filtering, so a rejected answer can never win on
/// score. With nothing accepted the result is `NA`.
pub fn resolve<F>(answers: ChunkAnswers, accept: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let total = answers.len();
    let winner = match answers {
        ChunkAnswers::Scored(answers) => {
            let valid: Vec<(String, f64)> = answers
                .iter()
                .filter_map(|a| accept(a.answer.as_str()).map(|value| (value, a.score)))
                .collect();
            debug!("{} of {} scored answers valid", valid.len(), total);
            pick_by_score(valid)
        }
        ChunkAnswers::Unscored(answers) => {
            let valid: Vec<String> = answers.iter().filter_map(|a| accept(a.as_str())).collect();
            debug!("{} of {} answers valid", valid.len(), total);
            majority_vote(valid)
        }
    };

    winner.unwrap_or_else(|| NA.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn accept_all_but_na(answer: &str) -> Option<String> {
        (answer != NA).then(|| answer.to_string())
    }

    #[test]
    fn test_pick_by_score_highest_wins() {
        let picked = pick_by_score(vec![("lease", 0.2), ("lease", 0.9), ("employment", 0.5)]);
        assert_eq!(picked, Some("lease"));
    }

    #[test]
    fn test_pick_by_score_first_max_wins_tie() {
        assert_eq!(pick_by_score(vec![("a", 0.5), ("b", 0.7), ("c", 0.7)]), Some("b"));
    }

    #[test]
    fn test_pick_by_score_ignores_nan() {
        assert_eq!(pick_by_score(vec![("a", f64::NAN), ("b", -3.0)]), Some("b"));
        assert_eq!(pick_by_score(vec![("a", f64::NAN)]), None);
    }

    #[test]
    fn test_pick_by_score_empty() {
        assert_eq!(pick_by_score(Vec::<(&str, f64)>::new()), None);
    }

    #[test]
    fn test_majority_vote() {
        assert_eq!(majority_vote(vec!["lease", "lease", "employment"]), Some("lease"));
        assert_eq!(majority_vote(vec!["x", "y", "y"]), Some("y"));
    }

    #[test]
    fn test_majority_vote_tie_goes_to_first_seen() {
        assert_eq!(majority_vote(vec!["b", "a", "a", "b"]), Some("b"));
        assert_eq!(majority_vote(vec!["c", "b", "a"]), Some("c"));
    }

    #[test]
    fn test_majority_vote_empty() {
        assert_eq!(majority_vote(Vec::<String>::new()), None);
    }

    #[test]
    fn test_resolve_unscored_filters_before_voting() {
        let answers = ChunkAnswers::Unscored(strings(&["NA", "NA", "NA", "x", "y", "y"]));
        assert_eq!(resolve(answers, accept_all_but_na), "y");
    }

    #[test]
    fn test_resolve_scored_ranks_only_valid_answers() {
        let answers = ChunkAnswers::Scored(vec![
            ScoredAnswer::new("NA", 0.99),
            ScoredAnswer::new("first", 0.4),
            ScoredAnswer::new("second", 0.6),
        ]);
        assert_eq!(resolve(answers, accept_all_but_na), "second");
    }

    #[test]
    fn test_resolve_nothing_valid_is_na() {
        let unscored = ChunkAnswers::Unscored(strings(&["NA", "NA"]));
        assert_eq!(resolve(unscored, accept_all_but_na), "NA");

        let scored = ChunkAnswers::Scored(vec![ScoredAnswer::new("NA", 1.0)]);
        assert_eq!(resolve(scored, accept_all_but_na), "NA");

        assert_eq!(resolve(ChunkAnswers::Scored(vec![]), accept_all_but_na), "NA");
    }

    #[test]
    fn test_resolve_votes_on_normalized_values() {
        let answers = ChunkAnswers::Unscored(strings(&["1 000", "about 1000", "999"]));
        let winner = resolve(answers, |a| crate::normalize::normalize_numeric(a));
        assert_eq!(winner, "1000");
    }
}
