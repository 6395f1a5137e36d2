use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Score Desk Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::list_matches,
        crate::routes::matches::create_match,
        crate::routes::matches::get_match,
        crate::routes::matches::update_match,
        crate::routes::matches::delete_match,
        crate::routes::matches::list_teams,
        crate::routes::matches::list_games,
        crate::routes::matches::eligible_teams,
        crate::routes::scoring::session,
        crate::routes::scoring::start,
        crate::routes::scoring::end,
        crate::routes::scoring::cancel,
        crate::routes::scoring::increment,
        crate::routes::scoring::adjust_set,
        crate::routes::scoring::select_winner,
        crate::routes::scoring::undo,
        crate::routes::scoring::begin_edit,
        crate::routes::scoring::finish_edit,
        crate::routes::sse::session_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::UpdateMatchRequest,
            crate::dto::matches::MatchResponse,
            crate::dto::matches::TeamResponse,
            crate::dto::matches::GameResponse,
            crate::dto::scoring::IncrementRequest,
            crate::dto::scoring::SetAdjustmentRequest,
            crate::dto::scoring::WinnerRequest,
            crate::dto::scoring::ResolveWinnerRequest,
            crate::dto::scoring::TotalsDto,
            crate::dto::scoring::SessionResponse,
            crate::dto::sse::SaveStateEvent,
            crate::dto::sse::UndoEvent,
            crate::error::ErrorBody,
            crate::scoring::Side,
            crate::scoring::ScoreSnapshot,
            crate::scoring::points::PointField,
            crate::scoring::points::PointCounters,
            crate::scoring::points::PointScore,
            crate::scoring::sets::SetDelta,
            crate::scoring::sets::SetResult,
            crate::scoring::sets::SetScore,
            crate::scoring::binary::BinaryScore,
            crate::state::tournament::GameFamily,
            crate::state::tournament::Round,
            crate::state::tournament::MatchStatus,
            crate::state::tournament::MatchType,
            crate::state::tournament::TeamLetter,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Match scheduling and registration data"),
        (name = "scoring", description = "Live scoring sessions and status transitions"),
    )
)]
pub struct ApiDoc;
