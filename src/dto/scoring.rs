use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::matches::MatchResponse,
    scoring::{PointField, SetAdjustment, SetDelta, Side},
    state::session::SessionView,
};

/// Add one point to a counter.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IncrementRequest {
    /// Scoring side.
    pub side: Side,
    /// Counter to bump.
    pub field: PointField,
}

/// Change a set score. Live scoring only accepts `increment` on the current set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAdjustmentRequest {
    /// Side whose score changes.
    pub side: Side,
    /// Direction of the change.
    pub delta: SetDelta,
    /// Defaults to the current set.
    #[serde(default)]
    pub set_index: Option<usize>,
}

impl From<SetAdjustmentRequest> for SetAdjustment {
    fn from(value: SetAdjustmentRequest) -> Self {
        Self {
            side: value.side,
            delta: value.delta,
            set_index: value.set_index,
        }
    }
}

/// Pick the winner of a binary-outcome match.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WinnerRequest {
    /// Winning side.
    pub side: Side,
}

/// Body of `end` and `edit/finish`: the operator's pick, used only on a tie.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResolveWinnerRequest {
    /// Side to award a tied match to.
    #[serde(default)]
    pub winner: Option<Side>,
}

/// Totals of both sides.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct TotalsDto {
    /// Total of side A.
    pub team_a: u32,
    /// Total of side B.
    pub team_b: u32,
}

/// Operator view of a match session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Match with its current score.
    #[serde(rename = "match")]
    pub game_match: MatchResponse,
    /// Totals of both sides.
    pub totals: TotalsDto,
    /// Whether the score alone already decides the winner.
    pub is_complete: bool,
    /// Entries on the undo stack.
    pub undo_count: usize,
    /// Whether undo is offered.
    pub can_undo: bool,
    /// A completed result is being corrected.
    pub editing: bool,
    /// A score write is waiting for the debounce window.
    pub pending_save: bool,
    /// Last persistence failure, cleared by the next successful write.
    pub last_save_error: Option<String>,
}

impl From<SessionView> for SessionResponse {
    fn from(value: SessionView) -> Self {
        let (team_a, team_b) = value.totals;
        Self {
            game_match: value.game_match.into(),
            totals: TotalsDto { team_a, team_b },
            is_complete: value.is_complete,
            undo_count: value.undo_count,
            can_undo: value.can_undo,
            editing: value.editing,
            pending_save: value.save.pending,
            last_save_error: value.save.last_error,
        }
    }
}
