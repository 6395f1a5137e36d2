use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{history::HistoryKey, match_store::MatchStore, models::MatchEntity},
    dto::matches::{
        CreateMatchRequest, GameResponse, MatchResponse, TeamResponse, UpdateMatchRequest,
    },
    error::ServiceError,
    scoring::ScoreSnapshot,
    services::allocator,
    state::{
        SharedState,
        tournament::{Game, GameFamily, Match, MatchStatus, Round, Team},
    },
};

/// List every match ordered by match number, with live scores of loaded sessions.
pub async fn list_matches(state: &SharedState) -> Result<Vec<MatchResponse>, ServiceError> {
    let store = state.require_match_store().await?;
    let matches = current_matches(state, store.as_ref()).await?;
    Ok(matches.into_iter().map(Into::into).collect())
}

/// Fetch one match.
pub async fn get_match(state: &SharedState, id: Uuid) -> Result<MatchResponse, ServiceError> {
    if let Some(session) = state.loaded_session(id) {
        return Ok(session.current().await.into());
    }
    let store = state.require_match_store().await?;
    let entity = store
        .find_match(id)
        .await?
        .ok_or_else(|| match_not_found(id))?;
    Ok(Match::from(entity).into())
}

/// Schedule a new match after checking the game, the teams, the match number
/// and round exclusivity.
pub async fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<MatchResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let game = validate_pairing(state, store.as_ref(), &request, None).await?;

    let entity = MatchEntity {
        id: Uuid::new_v4(),
        team_a: request.team_a,
        team_b: request.team_b,
        game_id: game.id,
        family: game.family,
        round: request.round,
        match_number: request.match_number,
        status: MatchStatus::Scheduled,
        match_type: request.match_type,
        result: ScoreSnapshot::empty(game.family),
        winner: None,
        updated_at: SystemTime::now(),
    };

    let created = store.create_match(entity).await?;
    info!(match_id = %created.id, match_number = created.match_number, game = %game.name, "match scheduled");
    Ok(Match::from(created).into())
}

/// Replace the editable fields of a match.
pub async fn update_match(
    state: &SharedState,
    id: Uuid,
    request: UpdateMatchRequest,
) -> Result<MatchResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let stored = store
        .find_match(id)
        .await?
        .ok_or_else(|| match_not_found(id))?;

    let request = CreateMatchRequest::from(request);
    let reshaped = stored.team_a != request.team_a
        || stored.team_b != request.team_b
        || stored.game_id != request.game_id
        || stored.round != request.round
        || stored.match_type != request.match_type;
    if reshaped && stored.status != MatchStatus::Scheduled {
        return Err(ServiceError::InvalidState(
            "teams, game, round and match type can only change before the match starts".into(),
        ));
    }

    let game = validate_pairing(state, store.as_ref(), &request, Some(id)).await?;

    // Land any debounced score first so the full write below carries it.
    state.persister().flush(id).await?;
    let current = match state.loaded_session(id) {
        Some(session) => MatchEntity::from(session.current().await),
        None => stored,
    };

    let result = if current.family == game.family {
        current.result
    } else {
        ScoreSnapshot::empty(game.family)
    };
    let updated = MatchEntity {
        team_a: request.team_a,
        team_b: request.team_b,
        game_id: game.id,
        family: game.family,
        round: request.round,
        match_number: request.match_number,
        match_type: request.match_type,
        result,
        updated_at: SystemTime::now(),
        ..current
    };

    let saved = store
        .update_match(updated)
        .await?
        .ok_or_else(|| match_not_found(id))?;
    state.evict_session(id);
    info!(match_id = %id, match_number = saved.match_number, "match updated");
    Ok(Match::from(saved).into())
}

/// Delete a match along with its pending writes and undo history.
pub async fn delete_match(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_match_store().await?;
    let stored = store
        .find_match(id)
        .await?
        .ok_or_else(|| match_not_found(id))?;

    state.persister().discard(id);
    state.evict_session(id);
    if let Err(err) = state
        .history()
        .delete(HistoryKey::new(stored.family, id))
        .await
    {
        warn!(match_id = %id, error = %err, "failed to delete undo history");
    }

    if !store.delete_match(id).await? {
        return Err(match_not_found(id));
    }
    info!(match_id = %id, "match deleted");
    Ok(())
}

/// Registered teams.
pub async fn list_teams(state: &SharedState) -> Result<Vec<TeamResponse>, ServiceError> {
    let store = state.require_match_store().await?;
    let teams = load_teams(store.as_ref()).await?;
    Ok(teams.into_iter().map(Into::into).collect())
}

/// Games whose sport family can be resolved.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameResponse>, ServiceError> {
    let store = state.require_match_store().await?;
    let games = load_games(store.as_ref()).await?;
    Ok(games.into_iter().map(Into::into).collect())
}

/// Teams of `game_id` still free in `round`.
pub async fn eligible_teams(
    state: &SharedState,
    game_id: Uuid,
    round: Round,
    excluding: Option<Uuid>,
) -> Result<Vec<TeamResponse>, ServiceError> {
    let store = state.require_match_store().await?;
    let teams = load_teams(store.as_ref()).await?;
    let matches = current_matches(state, store.as_ref()).await?;
    Ok(
        allocator::eligible_teams(&teams, &matches, game_id, round, excluding)
            .into_iter()
            .map(Into::into)
            .collect(),
    )
}

async fn validate_pairing(
    state: &SharedState,
    store: &dyn MatchStore,
    request: &CreateMatchRequest,
    excluding: Option<Uuid>,
) -> Result<Game, ServiceError> {
    if request.team_a == request.team_b {
        return Err(ServiceError::InvalidInput(
            "a match needs two different teams".into(),
        ));
    }
    if request.match_number == 0 {
        return Err(ServiceError::InvalidInput(
            "match number must be at least 1".into(),
        ));
    }

    let game = store
        .list_games()
        .await?
        .into_iter()
        .find(|game| game.id == request.game_id)
        .ok_or_else(|| ServiceError::InvalidInput(format!("unknown game {}", request.game_id)))?;
    let game = Game::try_from(game).map_err(|game| {
        ServiceError::InvalidInput(format!(
            "cannot determine the sport family of game `{}`",
            game.name
        ))
    })?;
    if game.family == GameFamily::SetBased && request.match_type.is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "{} matches need a match type (singles or doubles)",
            game.name
        )));
    }

    let teams = load_teams(store).await?;
    for team_id in [request.team_a, request.team_b] {
        match teams.iter().find(|team| team.id == team_id) {
            Some(team) if team.game_id == game.id => {}
            Some(team) => {
                return Err(ServiceError::InvalidInput(format!(
                    "team {} is not registered for {}",
                    team.display_name(),
                    game.name
                )));
            }
            None => return Err(ServiceError::InvalidInput(format!("unknown team {team_id}"))),
        }
    }

    let matches = current_matches(state, store).await?;
    if let Some(taken) = matches
        .iter()
        .find(|other| other.match_number == request.match_number && Some(other.id) != excluding)
    {
        return Err(ServiceError::InvalidInput(format!(
            "match number {} is already used by match {}",
            request.match_number, taken.id
        )));
    }
    allocator::ensure_pairing_available(
        &matches,
        game.id,
        request.round,
        [request.team_a, request.team_b],
        excluding,
    )?;

    Ok(game)
}

async fn current_matches(
    state: &SharedState,
    store: &dyn MatchStore,
) -> Result<Vec<Match>, ServiceError> {
    let entities = store.list_matches().await?;
    let mut matches = Vec::with_capacity(entities.len());
    for entity in entities {
        let current = match state.loaded_session(entity.id) {
            Some(session) => session.current().await,
            None => Match::from(entity),
        };
        matches.push(current);
    }
    Ok(matches)
}

async fn load_teams(store: &dyn MatchStore) -> Result<Vec<Team>, ServiceError> {
    Ok(store
        .list_teams()
        .await?
        .into_iter()
        .map(Team::from)
        .collect())
}

async fn load_games(store: &dyn MatchStore) -> Result<Vec<Game>, ServiceError> {
    Ok(store
        .list_games()
        .await?
        .into_iter()
        .filter_map(|entity| {
            Game::try_from(entity)
                .inspect_err(|game| {
                    warn!(game_id = %game.id, name = %game.name, "skipping game with unknown sport family")
                })
                .ok()
        })
        .collect())
}

fn match_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("match {id} not found"))
}
