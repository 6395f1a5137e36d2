use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ScoreError, Scorer, ScoringMode, Side};

/// Direction of a set score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SetDelta {
    /// One more point.
    Increment,
    /// One point less; only allowed while editing, clamped at zero.
    Decrement,
}

/// Set score change requested by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetAdjustment {
    /// Side whose score changes.
    pub side: Side,
    /// Direction of the change.
    pub delta: SetDelta,
    /// Target set; the current set when omitted.
    pub set_index: Option<usize>,
}

/// Score of a single set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SetResult {
    /// Points of side A.
    pub team_a_score: u32,
    /// Points of side B.
    pub team_b_score: u32,
    /// Set winner once decided.
    pub winner: Option<Side>,
}

impl SetResult {
    fn score_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::A => &mut self.team_a_score,
            Side::B => &mut self.team_b_score,
        }
    }
}

/// Set-based score: the sets played so far plus derived counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SetScore {
    /// Sets opened so far, in play order.
    pub sets: Vec<SetResult>,
    /// Index of the set being played.
    pub current_set_index: usize,
    /// Sets taken by side A.
    pub sets_won_a: u32,
    /// Sets taken by side B.
    pub sets_won_b: u32,
}

impl Default for SetScore {
    fn default() -> Self {
        Self {
            sets: vec![SetResult::default()],
            current_set_index: 0,
            sets_won_a: 0,
            sets_won_b: 0,
        }
    }
}

impl SetScore {
    fn rescan_sets_won(&mut self) {
        self.sets_won_a = self
            .sets
            .iter()
            .filter(|set| set.winner == Some(Side::A))
            .count() as u32;
        self.sets_won_b = self
            .sets
            .iter()
            .filter(|set| set.winner == Some(Side::B))
            .count() as u32;
    }

    fn sets_won(&self, side: Side) -> u32 {
        match side {
            Side::A => self.sets_won_a,
            Side::B => self.sets_won_b,
        }
    }
}

/// Deuce-aware set scorer.
///
/// A side takes a set at `winning_score` while the opponent is below
/// `winning_score - 1`; once both reach `winning_score - 1` a two point lead is
/// required. Sets are only opened while the best-of-`max_sets` sequence is
/// undecided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBasedScorer {
    winning_score: u32,
    max_sets: usize,
}

impl SetBasedScorer {
    /// Scorer for sets played to `winning_score` over at most `max_sets` sets.
    pub fn new(winning_score: u32, max_sets: usize) -> Self {
        Self {
            winning_score,
            max_sets: max_sets.max(1),
        }
    }

    /// Points needed to take a set.
    pub fn winning_score(&self) -> u32 {
        self.winning_score
    }

    /// Sets a side must win to take the match.
    pub fn sets_needed(&self) -> u32 {
        (self.max_sets / 2 + 1) as u32
    }

    /// Winner of a set standing at `team_a`-`team_b`, if decided.
    pub fn set_winner(&self, team_a: u32, team_b: u32) -> Option<Side> {
        let deuce = self.winning_score.saturating_sub(1);
        if team_a >= deuce && team_b >= deuce {
            if team_a >= team_b + 2 {
                Some(Side::A)
            } else if team_b >= team_a + 2 {
                Some(Side::B)
            } else {
                None
            }
        } else if team_a >= self.winning_score {
            Some(Side::A)
        } else if team_b >= self.winning_score {
            Some(Side::B)
        } else {
            None
        }
    }

    fn apply_live(&self, score: &SetScore, adjustment: &SetAdjustment) -> Result<SetScore, ScoreError> {
        if adjustment.delta == SetDelta::Decrement {
            return Err(ScoreError::Validation(
                "set scores can only be decreased while editing a completed match".into(),
            ));
        }
        if let Some(index) = adjustment
            .set_index
            .filter(|index| *index != score.current_set_index)
        {
            return Err(ScoreError::Validation(format!(
                "live scoring only targets the current set ({}), not set {index}",
                score.current_set_index
            )));
        }
        if self.is_complete(score) {
            return Err(ScoreError::Validation(
                "match is already decided; end the match to record the result".into(),
            ));
        }

        let mut next = score.clone();
        let index = next.current_set_index;
        let Some(set) = next.sets.get_mut(index) else {
            return Err(ScoreError::Validation(format!(
                "current set index {index} is out of range"
            )));
        };
        if set.winner.is_some() {
            return Err(ScoreError::Validation(format!(
                "set {} is already decided",
                index + 1
            )));
        }

        *set.score_mut(adjustment.side) += 1;
        let Some(winner) = self.set_winner(set.team_a_score, set.team_b_score) else {
            return Ok(next);
        };

        set.winner = Some(winner);
        match winner {
            Side::A => next.sets_won_a += 1,
            Side::B => next.sets_won_b += 1,
        }

        if next.sets.len() < self.max_sets && !self.is_complete(&next) {
            next.sets.push(SetResult::default());
            next.current_set_index = next.sets.len() - 1;
        }

        Ok(next)
    }

    fn apply_edit(&self, score: &SetScore, adjustment: &SetAdjustment) -> Result<SetScore, ScoreError> {
        let mut next = score.clone();
        let index = adjustment.set_index.unwrap_or(next.current_set_index);
        let Some(set) = next.sets.get_mut(index) else {
            return Err(ScoreError::Validation(format!(
                "set {index} does not exist (match has {} set(s))",
                score.sets.len()
            )));
        };

        let value = set.score_mut(adjustment.side);
        *value = match adjustment.delta {
            SetDelta::Increment => *value + 1,
            SetDelta::Decrement => value.saturating_sub(1),
        };
        set.winner = self.set_winner(set.team_a_score, set.team_b_score);

        next.rescan_sets_won();
        Ok(next)
    }
}

impl Scorer for SetBasedScorer {
    type Score = SetScore;
    type Mutation = SetAdjustment;

    fn apply(
        &self,
        score: &SetScore,
        adjustment: &SetAdjustment,
        mode: ScoringMode,
    ) -> Result<SetScore, ScoreError> {
        match mode {
            ScoringMode::Live => self.apply_live(score, adjustment),
            ScoringMode::Edit => self.apply_edit(score, adjustment),
        }
    }

    fn totals(&self, score: &SetScore) -> (u32, u32) {
        (score.sets_won_a, score.sets_won_b)
    }

    /// True once a side holds the majority of the sequence. Informational only:
    /// ending the match stays an operator action.
    fn is_complete(&self, score: &SetScore) -> bool {
        let needed = self.sets_needed();
        score.sets_won(Side::A) >= needed || score.sets_won(Side::B) >= needed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(side: Side) -> SetAdjustment {
        SetAdjustment {
            side,
            delta: SetDelta::Increment,
            set_index: None,
        }
    }

    fn edit(side: Side, delta: SetDelta, set_index: usize) -> SetAdjustment {
        SetAdjustment {
            side,
            delta,
            set_index: Some(set_index),
        }
    }

    fn with_current_set(team_a: u32, team_b: u32) -> SetScore {
        SetScore {
            sets: vec![SetResult {
                team_a_score: team_a,
                team_b_score: team_b,
                winner: None,
            }],
            ..SetScore::default()
        }
    }

    fn play(scorer: &SetBasedScorer, score: SetScore, side: Side, points: u32) -> SetScore {
        (0..points).fold(score, |score, _| {
            scorer.apply(&score, &live(side), ScoringMode::Live).unwrap()
        })
    }

    #[test]
    fn plain_win_without_deuce() {
        let scorer = SetBasedScorer::new(11, 1);
        let next = scorer
            .apply(&with_current_set(10, 9), &live(Side::A), ScoringMode::Live)
            .unwrap();
        assert_eq!(next.sets[0].team_a_score, 11);
        assert_eq!(next.sets[0].winner, Some(Side::A));
        assert_eq!(next.sets_won_a, 1);
    }

    #[test]
    fn deuce_requires_two_point_lead() {
        let scorer = SetBasedScorer::new(11, 1);
        let next = scorer
            .apply(&with_current_set(10, 10), &live(Side::A), ScoringMode::Live)
            .unwrap();
        assert_eq!(
            (next.sets[0].team_a_score, next.sets[0].team_b_score),
            (11, 10)
        );
        assert_eq!(next.sets[0].winner, None);

        let next = scorer.apply(&next, &live(Side::A), ScoringMode::Live).unwrap();
        assert_eq!(next.sets[0].winner, Some(Side::A));
        assert_eq!(scorer.totals(&next), (1, 0));
    }

    #[test]
    fn doubles_threshold_is_respected() {
        let scorer = SetBasedScorer::new(15, 1);
        let score = play(&scorer, SetScore::default(), Side::B, 14);
        assert_eq!(score.sets[0].winner, None);
        let score = play(&scorer, score, Side::B, 1);
        assert_eq!(score.sets[0].winner, Some(Side::B));
    }

    #[test]
    fn live_win_opens_next_set_in_best_of_three() {
        let scorer = SetBasedScorer::new(11, 3);
        let score = play(&scorer, SetScore::default(), Side::A, 11);
        assert_eq!(score.sets.len(), 2);
        assert_eq!(score.current_set_index, 1);
        assert_eq!(score.sets_won_a, 1);
        assert!(!scorer.is_complete(&score));
    }

    #[test]
    fn no_extra_set_once_majority_is_reached() {
        let scorer = SetBasedScorer::new(11, 3);
        let score = play(&scorer, SetScore::default(), Side::B, 11);
        let score = play(&scorer, score, Side::B, 11);
        assert_eq!(score.sets.len(), 2);
        assert_eq!(score.sets_won_b, 2);
        assert!(scorer.is_complete(&score));

        let err = scorer
            .apply(&score, &live(Side::A), ScoringMode::Live)
            .unwrap_err();
        assert!(matches!(err, ScoreError::Validation(_)));
    }

    #[test]
    fn league_stage_plays_a_single_set() {
        let scorer = SetBasedScorer::new(11, 1);
        let score = play(&scorer, SetScore::default(), Side::A, 11);
        assert_eq!(score.sets.len(), 1);
        assert_eq!(score.current_set_index, 0);
        assert!(scorer.is_complete(&score));
    }

    #[test]
    fn live_mode_rejects_decrement_and_other_sets() {
        let scorer = SetBasedScorer::new(11, 3);
        let score = with_current_set(3, 2);
        assert!(
            scorer
                .apply(&score, &edit(Side::A, SetDelta::Decrement, 0), ScoringMode::Live)
                .is_err()
        );
        assert!(
            scorer
                .apply(&score, &edit(Side::A, SetDelta::Increment, 1), ScoringMode::Live)
                .is_err()
        );
    }

    #[test]
    fn edit_decrement_clamps_at_zero() {
        let scorer = SetBasedScorer::new(11, 1);
        let next = scorer
            .apply(
                &with_current_set(0, 4),
                &edit(Side::A, SetDelta::Decrement, 0),
                ScoringMode::Edit,
            )
            .unwrap();
        assert_eq!(next.sets[0].team_a_score, 0);
        assert_eq!(next.sets[0].team_b_score, 4);
    }

    #[test]
    fn edit_recomputes_winner_and_counters_without_advancing() {
        let scorer = SetBasedScorer::new(11, 3);
        let score = play(&scorer, SetScore::default(), Side::A, 11);
        let score = play(&scorer, score, Side::B, 11);
        let score = play(&scorer, score, Side::A, 11);
        assert_eq!(scorer.totals(&score), (2, 1));
        let index_before = score.current_set_index;

        // Take set one back from A: 11-0 becomes 10-0, undecided.
        let edited = scorer
            .apply(
                &score,
                &edit(Side::A, SetDelta::Decrement, 0),
                ScoringMode::Edit,
            )
            .unwrap();
        assert_eq!(edited.sets[0].winner, None);
        assert_eq!(scorer.totals(&edited), (1, 1));
        assert_eq!(edited.current_set_index, index_before);
        assert_eq!(edited.sets.len(), score.sets.len());
    }

    #[test]
    fn edit_rejects_unknown_set() {
        let scorer = SetBasedScorer::new(11, 3);
        let err = scorer
            .apply(
                &SetScore::default(),
                &edit(Side::A, SetDelta::Increment, 2),
                ScoringMode::Edit,
            )
            .unwrap_err();
        assert!(matches!(err, ScoreError::Validation(_)));
    }

    #[test]
    fn set_winner_boundaries() {
        let scorer = SetBasedScorer::new(11, 1);
        assert_eq!(scorer.set_winner(11, 8), Some(Side::A));
        assert_eq!(scorer.set_winner(9, 11), Some(Side::B));
        assert_eq!(scorer.set_winner(11, 10), None);
        assert_eq!(scorer.set_winner(13, 11), Some(Side::A));
        assert_eq!(scorer.set_winner(14, 13), None);
        assert_eq!(scorer.set_winner(10, 0), None);
    }
}
