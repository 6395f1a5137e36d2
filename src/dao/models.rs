use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::{
    scoring::ScoreSnapshot,
    state::tournament::{GameFamily, MatchStatus, MatchType, Round, TeamLetter},
};

/// Game (sport) record owned by the registration collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Stable identifier for the game.
    pub id: Uuid,
    /// Display name, e.g. "Kabaddi".
    pub name: String,
    /// Explicit sport family; older records only carry a name.
    #[serde(default)]
    pub family: Option<GameFamily>,
}

/// Registered team, read-only for this service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Housing unit the team represents.
    pub hall_id: Uuid,
    /// Denormalised housing unit name.
    pub hall_name: String,
    /// Game the team registered for.
    pub game_id: Uuid,
    /// Team letter within the hall.
    pub letter: TeamLetter,
    /// Optional override name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Match record persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// First side.
    pub team_a: Uuid,
    /// Second side.
    pub team_b: Uuid,
    /// Game played.
    pub game_id: Uuid,
    /// Sport family fixed at creation.
    pub family: GameFamily,
    /// Scheduling round.
    pub round: Round,
    /// Operator-facing match number.
    pub match_number: u32,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Singles / doubles for set-based sports.
    #[serde(default)]
    pub match_type: Option<MatchType>,
    /// Score payload.
    pub result: ScoreSnapshot,
    /// Winner once completed.
    #[serde(default)]
    pub winner: Option<Uuid>,
    /// Last time the match was written.
    pub updated_at: SystemTime,
}
