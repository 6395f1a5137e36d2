use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::matches::{
        CreateMatchRequest, EligibleTeamsQuery, GameResponse, MatchResponse, TeamResponse,
        UpdateMatchRequest,
    },
    error::{AppError, ErrorBody},
    services::match_service,
    state::{SharedState, tournament::Round},
};

/// Routes administering matches and exposing the registration data they reference.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route(
            "/matches/{id}",
            get(get_match).put(update_match).delete(delete_match),
        )
        .route("/teams", get(list_teams))
        .route("/games", get(list_games))
        .route(
            "/games/{game_id}/rounds/{round}/eligible-teams",
            get(eligible_teams),
        )
}

/// List every match ordered by match number.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    responses(
        (status = 200, description = "Matches", body = [MatchResponse]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MatchResponse>>, AppError> {
    Ok(Json(match_service::list_matches(&state).await?))
}

/// Schedule a match.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match scheduled", body = MatchResponse),
        (status = 400, description = "Invalid pairing, number or game", body = ErrorBody)
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateMatchRequest>>,
) -> Result<(StatusCode, Json<MatchResponse>), AppError> {
    let created = match_service::create_match(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch one match.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match", body = MatchResponse),
        (status = 404, description = "Unknown match", body = ErrorBody)
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(match_service::get_match(&state, id).await?))
}

/// Replace the editable fields of a match.
#[utoipa::path(
    put,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = UpdateMatchRequest,
    responses(
        (status = 200, description = "Match updated", body = MatchResponse),
        (status = 400, description = "Invalid pairing, number or game", body = ErrorBody),
        (status = 409, description = "Match already started", body = ErrorBody)
    )
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateMatchRequest>>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(match_service::update_match(&state, id, payload).await?))
}

/// Delete a match.
#[utoipa::path(
    delete,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 204, description = "Match deleted"),
        (status = 404, description = "Unknown match", body = ErrorBody)
    )
)]
pub async fn delete_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    match_service::delete_match(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List registered teams.
#[utoipa::path(
    get,
    path = "/teams",
    tag = "matches",
    responses((status = 200, description = "Teams", body = [TeamResponse]))
)]
pub async fn list_teams(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    Ok(Json(match_service::list_teams(&state).await?))
}

/// List games with their sport family.
#[utoipa::path(
    get,
    path = "/games",
    tag = "matches",
    responses((status = 200, description = "Games", body = [GameResponse]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameResponse>>, AppError> {
    Ok(Json(match_service::list_games(&state).await?))
}

/// Teams of a game not yet paired in a round.
#[utoipa::path(
    get,
    path = "/games/{game_id}/rounds/{round}/eligible-teams",
    tag = "matches",
    params(
        ("game_id" = Uuid, Path, description = "Game identifier"),
        ("round" = Round, Path, description = "Round (league_stage, semi_final, final)"),
        EligibleTeamsQuery
    ),
    responses((status = 200, description = "Eligible teams", body = [TeamResponse]))
)]
pub async fn eligible_teams(
    State(state): State<SharedState>,
    Path((game_id, round)): Path<(Uuid, Round)>,
    Query(query): Query<EligibleTeamsQuery>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    Ok(Json(
        match_service::eligible_teams(&state, game_id, round, query.excluding).await?,
    ))
}
