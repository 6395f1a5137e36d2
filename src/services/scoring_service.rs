//! Live scoring and status operations, routed to the session owning the match.

use uuid::Uuid;

use crate::{
    dto::scoring::{IncrementRequest, SessionResponse, SetAdjustmentRequest, WinnerRequest},
    error::ServiceError,
    scoring::Side,
    state::SharedState,
};

/// Operator view of a match session.
pub async fn session(state: &SharedState, id: Uuid) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    Ok(session.view().await.into())
}

/// Add one point to a counter of a point-accumulation match.
pub async fn increment(
    state: &SharedState,
    id: Uuid,
    request: IncrementRequest,
) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    let view = session.apply_increment(request.side, request.field).await?;
    Ok(view.into())
}

/// Change a set score.
pub async fn adjust_set(
    state: &SharedState,
    id: Uuid,
    request: SetAdjustmentRequest,
) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    let view = session.adjust_set(request.into()).await?;
    Ok(view.into())
}

/// Pick the winner of a binary-outcome match.
pub async fn select_winner(
    state: &SharedState,
    id: Uuid,
    request: WinnerRequest,
) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    let view = session.select_winner(request.side).await?;
    Ok(view.into())
}

/// Revert the last live mutation.
pub async fn undo(state: &SharedState, id: Uuid) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    Ok(session.undo().await?.into())
}

/// Start scoring a scheduled match.
pub async fn start(state: &SharedState, id: Uuid) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    Ok(session.start().await?.into())
}

/// Complete a live match, consulting `winner` only when totals tie.
pub async fn end(
    state: &SharedState,
    id: Uuid,
    winner: Option<Side>,
) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    let view = session.end_match(winner).await?;
    state.release_settled(&session, &view);
    Ok(view.into())
}

/// Cancel a scheduled or live match.
pub async fn cancel(state: &SharedState, id: Uuid) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    let view = session.cancel().await?;
    state.release_settled(&session, &view);
    Ok(view.into())
}

/// Open an edit session on a completed match.
pub async fn begin_edit(state: &SharedState, id: Uuid) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    Ok(session.begin_edit().await?.into())
}

/// Close the edit session and persist the corrected result.
pub async fn finish_edit(
    state: &SharedState,
    id: Uuid,
    winner: Option<Side>,
) -> Result<SessionResponse, ServiceError> {
    let session = state.session(id).await?;
    let view = session.finish_edit(winner).await?;
    state.release_settled(&session, &view);
    Ok(view.into())
}
