/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-memory backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameEntity, MatchEntity, TeamEntity},
        storage::StorageResult,
    },
    scoring::ScoreSnapshot,
    state::tournament::MatchStatus,
};

/// Abstraction over the persistence collaborator owning matches, teams and games.
///
/// Teams and games are read-only here. Operations addressing a match return
/// `None` (or `false`) when the match does not exist.
pub trait MatchStore: Send + Sync {
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn create_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<MatchEntity>>;
    fn update_match(
        &self,
        entity: MatchEntity,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn patch_status(
        &self,
        id: Uuid,
        status: MatchStatus,
        winner: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn patch_score(
        &self,
        id: Uuid,
        result: ScoreSnapshot,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
