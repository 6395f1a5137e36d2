use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    dto::{format_system_time, validation::validate_distinct_teams},
    scoring::ScoreSnapshot,
    state::tournament::{
        Game, GameFamily, Match, MatchStatus, MatchType, Round, Team, TeamLetter,
    },
};

/// Payload used to schedule a new match.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_match_teams"))]
pub struct CreateMatchRequest {
    /// First team.
    pub team_a: Uuid,
    /// Second team; must differ from `team_a`.
    pub team_b: Uuid,
    /// Game the match is played in.
    pub game_id: Uuid,
    /// Tournament round.
    pub round: Round,
    /// Position in the schedule, starting at 1.
    #[validate(range(min = 1))]
    pub match_number: u32,
    /// Required for set-based sports.
    #[serde(default)]
    pub match_type: Option<MatchType>,
}

/// Payload replacing the editable fields of a match.
///
/// Teams, game, round and match type can only change before the match starts;
/// the match number can always be changed.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_update_teams"))]
pub struct UpdateMatchRequest {
    /// First team.
    pub team_a: Uuid,
    /// Second team; must differ from `team_a`.
    pub team_b: Uuid,
    /// Game the match is played in.
    pub game_id: Uuid,
    /// Tournament round.
    pub round: Round,
    /// Position in the schedule, starting at 1.
    #[validate(range(min = 1))]
    pub match_number: u32,
    /// Singles or doubles, for set-based sports.
    #[serde(default)]
    pub match_type: Option<MatchType>,
}

fn validate_match_teams(request: &CreateMatchRequest) -> Result<(), ValidationError> {
    validate_distinct_teams(request.team_a, request.team_b)
}

fn validate_update_teams(request: &UpdateMatchRequest) -> Result<(), ValidationError> {
    validate_distinct_teams(request.team_a, request.team_b)
}

impl From<UpdateMatchRequest> for CreateMatchRequest {
    fn from(value: UpdateMatchRequest) -> Self {
        Self {
            team_a: value.team_a,
            team_b: value.team_b,
            game_id: value.game_id,
            round: value.round,
            match_number: value.match_number,
            match_type: value.match_type,
        }
    }
}

/// Match as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchResponse {
    /// Match identifier.
    pub id: Uuid,
    /// Team on side A.
    pub team_a: Uuid,
    /// Team on side B.
    pub team_b: Uuid,
    /// Game the match belongs to.
    pub game_id: Uuid,
    /// Scoring family of the game.
    pub family: GameFamily,
    /// Tournament round.
    pub round: Round,
    /// Position in the schedule.
    pub match_number: u32,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Singles or doubles, for set-based sports.
    pub match_type: Option<MatchType>,
    /// Current score.
    pub result: ScoreSnapshot,
    /// Winning team once completed.
    pub winner: Option<Uuid>,
    /// RFC 3339 timestamp of the last write.
    pub updated_at: String,
}

impl From<Match> for MatchResponse {
    fn from(value: Match) -> Self {
        Self {
            id: value.id,
            team_a: value.team_a,
            team_b: value.team_b,
            game_id: value.game_id,
            family: value.family,
            round: value.round,
            match_number: value.match_number,
            status: value.status,
            match_type: value.match_type,
            result: value.result,
            winner: value.winner,
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Registered team.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamResponse {
    /// Team identifier.
    pub id: Uuid,
    /// Hall the team represents.
    pub hall_id: Uuid,
    /// Name of the hall.
    pub hall_name: String,
    /// Game the team is registered for.
    pub game_id: Uuid,
    /// Letter distinguishing teams of one hall.
    pub letter: TeamLetter,
    /// Optional name overriding the hall name.
    pub name: Option<String>,
    /// "Hall B" or "Override (Hall B)".
    pub display_name: String,
}

impl From<Team> for TeamResponse {
    fn from(value: Team) -> Self {
        Self {
            display_name: value.display_name(),
            id: value.id,
            hall_id: value.hall_id,
            hall_name: value.hall_name,
            game_id: value.game_id,
            letter: value.letter,
            name: value.name,
        }
    }
}

/// Game with its resolved sport family.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameResponse {
    /// Game identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Scoring family.
    pub family: GameFamily,
}

impl From<Game> for GameResponse {
    fn from(value: Game) -> Self {
        Self {
            id: value.id,
            name: value.name,
            family: value.family,
        }
    }
}

/// Query of the eligible-teams route.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EligibleTeamsQuery {
    /// Match being edited; its own teams stay eligible.
    pub excluding: Option<Uuid>,
}
