use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ScoreError, Scorer, ScoringMode, Side};

/// Counter categories of a Kabaddi-style score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PointField {
    /// Points earned during a raid.
    RaidPoints,
    /// Bonus line points.
    BonusPoints,
    /// Points for eliminating the whole opposing side.
    AllOutPoints,
    /// Technical and other extra points.
    ExtraPoints,
}

/// Per-side Kabaddi counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PointCounters {
    /// Raid points.
    pub raid_points: u32,
    /// Bonus line points.
    pub bonus_points: u32,
    /// All-out points.
    pub all_out_points: u32,
    /// Extra points.
    pub extra_points: u32,
}

impl PointCounters {
    /// Sum of every category.
    pub fn total(&self) -> u32 {
        self.raid_points + self.bonus_points + self.all_out_points + self.extra_points
    }

    fn counter_mut(&mut self, field: PointField) -> &mut u32 {
        match field {
            PointField::RaidPoints => &mut self.raid_points,
            PointField::BonusPoints => &mut self.bonus_points,
            PointField::AllOutPoints => &mut self.all_out_points,
            PointField::ExtraPoints => &mut self.extra_points,
        }
    }
}

/// Point-accumulation score of both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PointScore {
    /// Counters of side A.
    pub team_a: PointCounters,
    /// Counters of side B.
    pub team_b: PointCounters,
}

impl PointScore {
    /// Counters of `side`.
    pub fn side(&self, side: Side) -> &PointCounters {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut PointCounters {
        match side {
            Side::A => &mut self.team_a,
            Side::B => &mut self.team_b,
        }
    }
}

/// Kabaddi-style scorer: one counter of one side goes up by exactly one.
///
/// There is no decrement; mistakes are corrected through undo. The match never
/// completes on its own, the operator ends it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointAccumulationScorer;

impl Scorer for PointAccumulationScorer {
    type Score = PointScore;
    type Mutation = (Side, PointField);

    fn apply(
        &self,
        score: &PointScore,
        (side, field): &(Side, PointField),
        _mode: ScoringMode,
    ) -> Result<PointScore, ScoreError> {
        let mut next = score.clone();
        let counter = next.side_mut(*side).counter_mut(*field);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| ScoreError::Validation(format!("{field:?} counter overflow")))?;
        Ok(next)
    }

    fn totals(&self, score: &PointScore) -> (u32, u32) {
        (score.team_a.total(), score.team_b.total())
    }

    fn is_complete(&self, _score: &PointScore) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bump(score: &PointScore, side: Side, field: PointField) -> PointScore {
        PointAccumulationScorer
            .apply(score, &(side, field), ScoringMode::Live)
            .unwrap()
    }

    #[test]
    fn increment_touches_exactly_one_counter() {
        let score = bump(&PointScore::default(), Side::B, PointField::AllOutPoints);
        assert_eq!(score.team_b.all_out_points, 1);
        assert_eq!(score.team_b.total(), 1);
        assert_eq!(score.team_a, PointCounters::default());
    }

    #[test]
    fn totals_sum_all_categories() {
        let mut score = PointScore::default();
        for field in [
            PointField::RaidPoints,
            PointField::BonusPoints,
            PointField::AllOutPoints,
            PointField::ExtraPoints,
            PointField::RaidPoints,
        ] {
            score = bump(&score, Side::A, field);
        }
        score = bump(&score, Side::B, PointField::ExtraPoints);

        assert_eq!(PointAccumulationScorer.totals(&score), (5, 1));
        assert_eq!(score.side(Side::A).raid_points, 2);
    }

    #[test]
    fn apply_leaves_input_untouched() {
        let before = PointScore::default();
        let after = bump(&before, Side::A, PointField::RaidPoints);
        assert_eq!(before, PointScore::default());
        assert_ne!(before, after);
    }

    #[test]
    fn never_self_completes() {
        let mut score = PointScore::default();
        for _ in 0..50 {
            score = bump(&score, Side::A, PointField::RaidPoints);
        }
        assert!(!PointAccumulationScorer.is_complete(&score));
    }
}
