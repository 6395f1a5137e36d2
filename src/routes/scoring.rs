use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::scoring::{
        IncrementRequest, ResolveWinnerRequest, SessionResponse, SetAdjustmentRequest,
        WinnerRequest,
    },
    error::{AppError, ErrorBody},
    services::scoring_service,
    state::SharedState,
};

/// Operator routes driving a match session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches/{id}/session", get(session))
        .route("/matches/{id}/start", post(start))
        .route("/matches/{id}/end", post(end))
        .route("/matches/{id}/cancel", post(cancel))
        .route("/matches/{id}/score/increment", post(increment))
        .route("/matches/{id}/score/sets", post(adjust_set))
        .route("/matches/{id}/score/winner", post(select_winner))
        .route("/matches/{id}/score/undo", post(undo))
        .route("/matches/{id}/edit", post(begin_edit))
        .route("/matches/{id}/edit/finish", post(finish_edit))
}

fn winner_of(body: Option<Json<ResolveWinnerRequest>>) -> ResolveWinnerRequest {
    body.map(|Json(body)| body).unwrap_or_default()
}

/// Current session view of a match, loading it on first access.
#[utoipa::path(
    get,
    path = "/matches/{id}/session",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Session view", body = SessionResponse),
        (status = 404, description = "Unknown match", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(scoring_service::session(&state, id).await?))
}

/// Move a scheduled match to live.
#[utoipa::path(
    post,
    path = "/matches/{id}/start",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match is live", body = SessionResponse),
        (status = 409, description = "Transition not allowed or already in flight", body = ErrorBody)
    )
)]
pub async fn start(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(scoring_service::start(&state, id).await?))
}

/// Complete a live match. The body's `winner` is only read when totals tie.
#[utoipa::path(
    post,
    path = "/matches/{id}/end",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body(content = ResolveWinnerRequest, description = "Optional manual winner for tied totals"),
    responses(
        (status = 200, description = "Match completed", body = SessionResponse),
        (status = 409, description = "Totals tie without a winner, or transition not allowed", body = ErrorBody)
    )
)]
pub async fn end(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ResolveWinnerRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let request = winner_of(body);
    Ok(Json(scoring_service::end(&state, id, request.winner).await?))
}

/// Cancel a scheduled or live match.
#[utoipa::path(
    post,
    path = "/matches/{id}/cancel",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match cancelled", body = SessionResponse),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    )
)]
pub async fn cancel(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(scoring_service::cancel(&state, id).await?))
}

/// Add one point to a counter.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/increment",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = IncrementRequest,
    responses(
        (status = 200, description = "Score updated", body = SessionResponse),
        (status = 400, description = "Wrong score family", body = ErrorBody),
        (status = 409, description = "Match not live", body = ErrorBody)
    )
)]
pub async fn increment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IncrementRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(scoring_service::increment(&state, id, payload).await?))
}

/// Change a set score.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/sets",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = SetAdjustmentRequest,
    responses(
        (status = 200, description = "Score updated", body = SessionResponse),
        (status = 400, description = "Set out of range or score limit reached", body = ErrorBody),
        (status = 409, description = "Match not live nor being edited", body = ErrorBody)
    )
)]
pub async fn adjust_set(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetAdjustmentRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(scoring_service::adjust_set(&state, id, payload).await?))
}

/// Pick the winner of a binary-outcome match.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/winner",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = WinnerRequest,
    responses(
        (status = 200, description = "Winner selected", body = SessionResponse),
        (status = 400, description = "Wrong score family", body = ErrorBody),
        (status = 409, description = "Match not live nor being edited", body = ErrorBody)
    )
)]
pub async fn select_winner(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WinnerRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(scoring_service::select_winner(&state, id, payload).await?))
}

/// Revert the last live mutation.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/undo",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Mutation reverted", body = SessionResponse),
        (status = 409, description = "Nothing to undo", body = ErrorBody)
    )
)]
pub async fn undo(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(scoring_service::undo(&state, id).await?))
}

/// Open an edit session on a completed match.
#[utoipa::path(
    post,
    path = "/matches/{id}/edit",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Edit session open", body = SessionResponse),
        (status = 400, description = "Family cannot be edited", body = ErrorBody),
        (status = 409, description = "Match not completed", body = ErrorBody)
    )
)]
pub async fn begin_edit(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(scoring_service::begin_edit(&state, id).await?))
}

/// Close the edit session, persisting the corrected result and winner.
#[utoipa::path(
    post,
    path = "/matches/{id}/edit/finish",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body(content = ResolveWinnerRequest, description = "Optional manual winner for tied totals"),
    responses(
        (status = 200, description = "Edit saved", body = SessionResponse),
        (status = 409, description = "No edit session or unresolved tie", body = ErrorBody)
    )
)]
pub async fn finish_edit(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ResolveWinnerRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let request = winner_of(body);
    Ok(Json(
        scoring_service::finish_edit(&state, id, request.winner).await?,
    ))
}
