//! Sport-specific score shapes and the engine applying operator mutations to them.
//!
//! Every match carries one [`ScoreSnapshot`] whose variant is fixed by the match's
//! [`GameFamily`]. Mutations are validated and applied by the matching scorer;
//! the [`ScoreEngine`] enum dispatches to it and rejects cross-family mutations.

/// Winner-pick scoring.
pub mod binary;
/// Point-accumulation scoring.
pub mod points;
/// Set-based scoring.
pub mod sets;
/// Tie resolution.
pub mod tie;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::tournament::{GameFamily, Match, MatchStatus, MatchType};

pub use self::binary::{BinaryOutcomeScorer, BinaryScore};
pub use self::points::{PointAccumulationScorer, PointCounters, PointField, PointScore};
pub use self::sets::{SetAdjustment, SetBasedScorer, SetDelta, SetResult, SetScore};
pub use self::tie::{Decision, resolve, settle};

/// One of the two competing sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The match's `team_a`.
    A,
    /// The match's `team_b`.
    B,
}

impl Side {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Whether a mutation is part of live scoring or a post-completion correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Match is live; mutations are recorded in the undo history.
    Live,
    /// Operator is correcting a completed match.
    Edit,
}

/// Score payload of a match, tagged by sport family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ScoreSnapshot {
    /// Four-category point counters per side.
    PointAccumulation(PointScore),
    /// Ordered sets with a deuce rule.
    SetBased(SetScore),
    /// A single chosen winner.
    BinaryOutcome(BinaryScore),
}

impl ScoreSnapshot {
    /// Zeroed payload for a freshly created match of `family`.
    pub fn empty(family: GameFamily) -> Self {
        match family {
            GameFamily::PointAccumulation => Self::PointAccumulation(PointScore::default()),
            GameFamily::SetBased => Self::SetBased(SetScore::default()),
            GameFamily::BinaryOutcome => Self::BinaryOutcome(BinaryScore::default()),
        }
    }

    /// Family this payload belongs to.
    pub fn family(&self) -> GameFamily {
        match self {
            Self::PointAccumulation(_) => GameFamily::PointAccumulation,
            Self::SetBased(_) => GameFamily::SetBased,
            Self::BinaryOutcome(_) => GameFamily::BinaryOutcome,
        }
    }

    /// True when nothing has been scored yet (or everything was reset).
    pub fn is_zeroed(&self) -> bool {
        match self {
            Self::PointAccumulation(score) => {
                score.team_a.total() == 0 && score.team_b.total() == 0
            }
            Self::SetBased(score) => score
                .sets
                .iter()
                .all(|set| set.team_a_score == 0 && set.team_b_score == 0),
            Self::BinaryOutcome(score) => score.winner.is_none(),
        }
    }
}

/// Operator mutation, tagged by the family it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreMutation {
    /// Add one point to a counter.
    Increment {
        /// Scoring side.
        side: Side,
        /// Counter to bump.
        field: PointField,
    },
    /// Change a set score.
    AdjustSet(SetAdjustment),
    /// Pick the winner of a binary contest.
    SelectWinner {
        /// Winning side.
        side: Side,
    },
}

impl ScoreMutation {
    /// Family the mutation is meant for.
    pub fn family(&self) -> GameFamily {
        match self {
            Self::Increment { .. } => GameFamily::PointAccumulation,
            Self::AdjustSet(_) => GameFamily::SetBased,
            Self::SelectWinner { .. } => GameFamily::BinaryOutcome,
        }
    }
}

/// Errors raised while validating or applying score changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// The mutation is malformed or not allowed in the current score state.
    #[error("invalid score change: {0}")]
    Validation(String),
    /// The mutation targets another sport family than the match.
    #[error("match is scored as {expected} but the change targets {got}")]
    TypeMismatch {
        /// Family of the match.
        expected: GameFamily,
        /// Family of the rejected mutation.
        got: GameFamily,
    },
    /// The match is completed and no edit session is open.
    #[error("match is completed; open an edit session to change its score")]
    Locked,
    /// The match is not being played.
    #[error("match is not live (status {0:?})")]
    NotLive(MatchStatus),
    /// Totals are level and nobody picked the winner.
    #[error("totals are tied at {total_a}-{total_b}; a winner must be chosen")]
    TieUnresolved {
        /// Total of side A.
        total_a: u32,
        /// Total of side B.
        total_b: u32,
    },
}

/// Winning scores per match type for set-based sports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    /// Points needed to take a singles set.
    pub singles_points: u32,
    /// Points needed to take a doubles set.
    pub doubles_points: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            singles_points: 11,
            doubles_points: 15,
        }
    }
}

impl ScoringRules {
    /// Winning score for `match_type`.
    pub fn winning_score(&self, match_type: MatchType) -> u32 {
        match match_type {
            MatchType::Singles => self.singles_points,
            MatchType::Doubles => self.doubles_points,
        }
    }
}

/// Common contract of the per-family scorers.
pub trait Scorer {
    /// Score payload the scorer works on.
    type Score;
    /// Mutation accepted by the scorer.
    type Mutation;

    /// Validate `mutation` and return the resulting score; `score` is left untouched.
    fn apply(
        &self,
        score: &Self::Score,
        mutation: &Self::Mutation,
        mode: ScoringMode,
    ) -> Result<Self::Score, ScoreError>;

    /// Comparable totals for side A and side B.
    fn totals(&self, score: &Self::Score) -> (u32, u32);

    /// Whether the score alone already determines a winner.
    fn is_complete(&self, score: &Self::Score) -> bool;
}

/// Closed dispatch over the three scorers, resolved once per match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreEngine {
    /// Kabaddi-style matches.
    Points(PointAccumulationScorer),
    /// Set-based matches.
    Sets(SetBasedScorer),
    /// Binary-outcome matches.
    Binary(BinaryOutcomeScorer),
}

impl ScoreEngine {
    /// Build the engine for `game_match` using the configured set rules.
    pub fn for_match(game_match: &Match, rules: &ScoringRules) -> Result<Self, ScoreError> {
        let engine = match game_match.family {
            GameFamily::PointAccumulation => Self::Points(PointAccumulationScorer),
            GameFamily::SetBased => {
                let match_type = game_match.match_type.ok_or_else(|| {
                    ScoreError::Validation("set-based matches require a match type".into())
                })?;
                Self::Sets(SetBasedScorer::new(
                    rules.winning_score(match_type),
                    game_match.round.max_sets(),
                ))
            }
            GameFamily::BinaryOutcome => Self::Binary(BinaryOutcomeScorer),
        };
        Ok(engine)
    }

    /// Family handled by this engine.
    pub fn family(&self) -> GameFamily {
        match self {
            Self::Points(_) => GameFamily::PointAccumulation,
            Self::Sets(_) => GameFamily::SetBased,
            Self::Binary(_) => GameFamily::BinaryOutcome,
        }
    }

    /// Apply `mutation` to `snapshot`, producing the next snapshot.
    pub fn apply_delta(
        &self,
        snapshot: &ScoreSnapshot,
        mutation: &ScoreMutation,
        mode: ScoringMode,
    ) -> Result<ScoreSnapshot, ScoreError> {
        self.ensure_family(snapshot)?;
        let next = match (self, snapshot, mutation) {
            (
                Self::Points(scorer),
                ScoreSnapshot::PointAccumulation(score),
                ScoreMutation::Increment { side, field },
            ) => ScoreSnapshot::PointAccumulation(scorer.apply(score, &(*side, *field), mode)?),
            (
                Self::Sets(scorer),
                ScoreSnapshot::SetBased(score),
                ScoreMutation::AdjustSet(adjustment),
            ) => ScoreSnapshot::SetBased(scorer.apply(score, adjustment, mode)?),
            (
                Self::Binary(scorer),
                ScoreSnapshot::BinaryOutcome(score),
                ScoreMutation::SelectWinner { side },
            ) => ScoreSnapshot::BinaryOutcome(scorer.apply(score, side, mode)?),
            _ => {
                return Err(ScoreError::TypeMismatch {
                    expected: self.family(),
                    got: mutation.family(),
                });
            }
        };
        Ok(next)
    }

    /// Totals used to decide the winner: point sums, sets won, or 1/0 for a pick.
    pub fn compute_totals(&self, snapshot: &ScoreSnapshot) -> Result<(u32, u32), ScoreError> {
        match (self, snapshot) {
            (Self::Points(scorer), ScoreSnapshot::PointAccumulation(score)) => {
                Ok(scorer.totals(score))
            }
            (Self::Sets(scorer), ScoreSnapshot::SetBased(score)) => Ok(scorer.totals(score)),
            (Self::Binary(scorer), ScoreSnapshot::BinaryOutcome(score)) => Ok(scorer.totals(score)),
            _ => Err(ScoreError::TypeMismatch {
                expected: self.family(),
                got: snapshot.family(),
            }),
        }
    }

    /// Whether the snapshot alone determines the winner.
    pub fn is_complete(&self, snapshot: &ScoreSnapshot) -> bool {
        match (self, snapshot) {
            (Self::Points(scorer), ScoreSnapshot::PointAccumulation(score)) => {
                scorer.is_complete(score)
            }
            (Self::Sets(scorer), ScoreSnapshot::SetBased(score)) => scorer.is_complete(score),
            (Self::Binary(scorer), ScoreSnapshot::BinaryOutcome(score)) => {
                scorer.is_complete(score)
            }
            _ => false,
        }
    }

    fn ensure_family(&self, snapshot: &ScoreSnapshot) -> Result<(), ScoreError> {
        if snapshot.family() == self.family() {
            Ok(())
        } else {
            Err(ScoreError::TypeMismatch {
                expected: self.family(),
                got: snapshot.family(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(engine: &ScoreEngine, mutations: &[ScoreMutation]) -> ScoreSnapshot {
        mutations.iter().fold(
            ScoreSnapshot::empty(engine.family()),
            |snapshot, mutation| {
                engine
                    .apply_delta(&snapshot, mutation, ScoringMode::Live)
                    .unwrap()
            },
        )
    }

    #[test]
    fn cross_family_mutation_is_rejected() {
        let engine = ScoreEngine::Points(PointAccumulationScorer);
        let snapshot = ScoreSnapshot::empty(GameFamily::PointAccumulation);
        let err = engine
            .apply_delta(
                &snapshot,
                &ScoreMutation::SelectWinner { side: Side::A },
                ScoringMode::Live,
            )
            .unwrap_err();
        assert_eq!(
            err,
            ScoreError::TypeMismatch {
                expected: GameFamily::PointAccumulation,
                got: GameFamily::BinaryOutcome,
            }
        );
    }

    #[test]
    fn snapshot_of_another_family_is_rejected() {
        let engine = ScoreEngine::Binary(BinaryOutcomeScorer);
        let snapshot = ScoreSnapshot::empty(GameFamily::SetBased);
        assert!(matches!(
            engine.compute_totals(&snapshot),
            Err(ScoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn totals_are_deterministic_for_the_same_sequence() {
        let engine = ScoreEngine::Points(PointAccumulationScorer);
        let sequence = vec![
            ScoreMutation::Increment {
                side: Side::A,
                field: PointField::RaidPoints,
            },
            ScoreMutation::Increment {
                side: Side::B,
                field: PointField::BonusPoints,
            },
            ScoreMutation::Increment {
                side: Side::A,
                field: PointField::AllOutPoints,
            },
        ];

        let first = replay(&engine, &sequence);
        let second = replay(&engine, &sequence);
        assert_eq!(first, second);
        assert_eq!(engine.compute_totals(&first).unwrap(), (2, 1));
        assert_eq!(
            engine.compute_totals(&first).unwrap(),
            engine.compute_totals(&second).unwrap()
        );
    }

    #[test]
    fn zeroed_detection_per_family() {
        assert!(ScoreSnapshot::empty(GameFamily::PointAccumulation).is_zeroed());
        assert!(ScoreSnapshot::empty(GameFamily::SetBased).is_zeroed());
        assert!(ScoreSnapshot::empty(GameFamily::BinaryOutcome).is_zeroed());

        let engine = ScoreEngine::Sets(SetBasedScorer::new(11, 3));
        let scored = replay(
            &engine,
            &[ScoreMutation::AdjustSet(SetAdjustment {
                side: Side::B,
                delta: SetDelta::Increment,
                set_index: None,
            })],
        );
        assert!(!scored.is_zeroed());
    }

    #[test]
    fn snapshot_serializes_with_family_tag() {
        let json = serde_json::to_value(ScoreSnapshot::empty(GameFamily::BinaryOutcome)).unwrap();
        assert_eq!(json["family"], "binary_outcome");
        assert!(json["winner"].is_null());
    }
}
