use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/matches/{id}/session/stream",
    tag = "scoring",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Operator session stream (`save_state` and `undo` events)", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown match", body = crate::error::ErrorBody)
    )
)]
/// Stream persistence and undo changes of one match to the operator console.
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let feed = sse_service::subscribe_session(&state, id).await?;
    info!(match_id = %id, "New session SSE connection");
    Ok(sse_service::to_sse_stream(feed))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/matches/{id}/session/stream", get(session_stream))
}
