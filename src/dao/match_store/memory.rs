//! In-process [`MatchStore`] used for demos, ephemeral deployments and tests.

use std::{
    io,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{GameEntity, MatchEntity, TeamEntity},
        storage::{StorageError, StorageResult},
    },
    scoring::ScoreSnapshot,
    state::tournament::MatchStatus,
};

/// Fixture describing the registered games, teams and existing matches.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    /// Registered games.
    #[serde(default)]
    pub games: Vec<GameEntity>,
    /// Registered teams.
    #[serde(default)]
    pub teams: Vec<TeamEntity>,
    /// Matches already scheduled.
    #[serde(default)]
    pub matches: Vec<MatchEntity>,
}

impl SeedData {
    /// Read a JSON fixture from disk.
    pub async fn load(path: &Path) -> StorageResult<Self> {
        let contents = tokio::fs::read(path).await.map_err(|source| {
            StorageError::unavailable(format!("failed to read seed `{}`", path.display()), source)
        })?;
        serde_json::from_slice(&contents).map_err(|source| {
            StorageError::unavailable(format!("failed to parse seed `{}`", path.display()), source)
        })
    }
}

/// Write observed by the memory store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedWrite {
    /// `patch_score` call.
    Score {
        /// Target match.
        id: Uuid,
        /// Submitted payload.
        result: ScoreSnapshot,
    },
    /// `patch_status` call.
    Status {
        /// Target match.
        id: Uuid,
        /// Submitted status.
        status: MatchStatus,
        /// Submitted winner.
        winner: Option<Uuid>,
    },
}

/// Match store living entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryMatchStore {
    games: Arc<Vec<GameEntity>>,
    teams: Arc<Vec<TeamEntity>>,
    matches: Arc<DashMap<Uuid, MatchEntity>>,
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryMatchStore {
    /// Store pre-filled with `seed`.
    pub fn from_seed(seed: SeedData) -> Self {
        let matches = seed
            .matches
            .into_iter()
            .map(|entity| (entity.id, entity))
            .collect::<DashMap<_, _>>();
        Self {
            games: Arc::new(seed.games),
            teams: Arc::new(seed.teams),
            matches: Arc::new(matches),
            ..Self::default()
        }
    }

    /// Simulate an outage: every write fails until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Score and status writes received so far.
    pub async fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().await.clone()
    }

    /// Number of `patch_score` calls received so far.
    pub async fn score_write_count(&self) -> usize {
        self.writes
            .lock()
            .await
            .iter()
            .filter(|write| matches!(write, RecordedWrite::Score { .. }))
            .count()
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "memory store is offline".into(),
                io::Error::other("simulated outage"),
            ))
        } else {
            Ok(())
        }
    }

    fn patch(
        &self,
        id: Uuid,
        update: impl FnOnce(&mut MatchEntity),
    ) -> StorageResult<Option<MatchEntity>> {
        self.check_available()?;
        Ok(self.matches.get_mut(&id).map(|mut entry| {
            update(entry.value_mut());
            entry.updated_at = SystemTime::now();
            entry.value().clone()
        }))
    }
}

impl MatchStore for MemoryMatchStore {
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let mut matches = self
            .matches
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        matches.sort_by_key(|entity| entity.match_number);
        Box::pin(async move { Ok(matches) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let teams = self.teams.as_ref().clone();
        Box::pin(async move { Ok(teams) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let games = self.games.as_ref().clone();
        Box::pin(async move { Ok(games) })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let found = self.matches.get(&id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn create_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<MatchEntity>> {
        let outcome = self.check_available().map(|()| {
            self.matches.insert(entity.id, entity.clone());
            entity
        });
        Box::pin(async move { outcome })
    }

    fn update_match(
        &self,
        entity: MatchEntity,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let outcome = self.patch(entity.id, |stored| *stored = entity);
        Box::pin(async move { outcome })
    }

    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let outcome = self
            .check_available()
            .map(|()| self.matches.remove(&id).is_some());
        Box::pin(async move { outcome })
    }

    fn patch_status(
        &self,
        id: Uuid,
        status: MatchStatus,
        winner: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let outcome = self.patch(id, |stored| {
            stored.status = status;
            stored.winner = winner;
        });
        let writes = self.writes.clone();
        Box::pin(async move {
            let patched = outcome?;
            writes.lock().await.push(RecordedWrite::Status { id, status, winner });
            Ok(patched)
        })
    }

    fn patch_score(
        &self,
        id: Uuid,
        result: ScoreSnapshot,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let outcome = self.patch(id, |stored| stored.result = result.clone());
        let writes = self.writes.clone();
        Box::pin(async move {
            let patched = outcome?;
            writes.lock().await.push(RecordedWrite::Score { id, result });
            Ok(patched)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let outcome = self.check_available();
        Box::pin(async move { outcome })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let outcome = self.check_available();
        Box::pin(async move { outcome })
    }
}
