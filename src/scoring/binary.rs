use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ScoreError, Scorer, ScoringMode, Side};

/// Binary-outcome score: just the chosen winner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BinaryScore {
    /// Side picked as winner, if any.
    pub winner: Option<Side>,
}

/// Tug-of-war style scorer. Picking a side overwrites the previous pick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryOutcomeScorer;

impl Scorer for BinaryOutcomeScorer {
    type Score = BinaryScore;
    type Mutation = Side;

    fn apply(
        &self,
        _score: &BinaryScore,
        side: &Side,
        _mode: ScoringMode,
    ) -> Result<BinaryScore, ScoreError> {
        Ok(BinaryScore {
            winner: Some(*side),
        })
    }

    fn totals(&self, score: &BinaryScore) -> (u32, u32) {
        match score.winner {
            Some(Side::A) => (1, 0),
            Some(Side::B) => (0, 1),
            None => (0, 0),
        }
    }

    fn is_complete(&self, score: &BinaryScore) -> bool {
        score.winner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_same_side_twice_is_a_no_op() {
        let once = BinaryOutcomeScorer
            .apply(&BinaryScore::default(), &Side::A, ScoringMode::Live)
            .unwrap();
        let twice = BinaryOutcomeScorer
            .apply(&once, &Side::A, ScoringMode::Live)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn selecting_other_side_overwrites() {
        let first = BinaryOutcomeScorer
            .apply(&BinaryScore::default(), &Side::A, ScoringMode::Live)
            .unwrap();
        let second = BinaryOutcomeScorer
            .apply(&first, &Side::B, ScoringMode::Live)
            .unwrap();
        assert_eq!(second.winner, Some(Side::B));
        assert_eq!(BinaryOutcomeScorer.totals(&second), (0, 1));
    }

    #[test]
    fn complete_once_chosen() {
        assert!(!BinaryOutcomeScorer.is_complete(&BinaryScore::default()));
        assert!(BinaryOutcomeScorer.is_complete(&BinaryScore {
            winner: Some(Side::B)
        }));
    }
}
