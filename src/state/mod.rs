/// Debounced score writes.
pub mod persister;
/// Live state of a single match.
pub mod session;
/// Match status transitions.
pub mod state_machine;
/// Games, teams, rounds and matches.
pub mod tournament;
/// Bounded undo history.
pub mod undo;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        history::HistoryStore,
        match_store::MatchStore,
        storage::{StorageError, StorageResult},
    },
    error::ServiceError,
    scoring::ScoringRules,
};

pub use self::state_machine::{MatchEvent, TransitionError};
use self::{
    persister::DebouncedPersister,
    session::{MatchSession, SessionContext, SessionView},
    tournament::MatchStatus,
};

/// Application state shared across handlers.
pub type SharedState = Arc<AppState>;
/// Time allowed for the persistence work of a status transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle on the installed match store; empty while degraded.
#[derive(Clone, Default)]
pub struct StoreSlot(Arc<RwLock<Option<Arc<dyn MatchStore>>>>);

impl StoreSlot {
    /// Installed store, if any.
    pub async fn get(&self) -> Option<Arc<dyn MatchStore>> {
        self.0.read().await.clone()
    }

    /// Installed store, or [`StorageError::Offline`].
    pub async fn require(&self) -> StorageResult<Arc<dyn MatchStore>> {
        self.get().await.ok_or(StorageError::Offline)
    }

    /// Replace the installed store.
    pub async fn set(&self, store: Option<Arc<dyn MatchStore>>) {
        *self.0.write().await = store;
    }
}

/// Central application state: storage handles, live match sessions and configuration.
pub struct AppState {
    store: StoreSlot,
    sessions: DashMap<Uuid, Arc<MatchSession>>,
    context: SessionContext,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: &AppConfig, history: Arc<dyn HistoryStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let store = StoreSlot::default();
        let context = SessionContext {
            store: store.clone(),
            history,
            persister: DebouncedPersister::new(store.clone(), config.debounce),
            rules: config.scoring_rules(),
            undo_capacity: config.undo_capacity,
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        };
        Arc::new(Self {
            store,
            sessions: DashMap::new(),
            context,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        self.store.get().await
    }

    /// Current store or a degraded-mode error.
    pub async fn require_match_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        self.match_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new match store implementation and leave degraded mode.
    pub async fn set_match_store(&self, store: Arc<dyn MatchStore>) {
        self.store.set(Some(store)).await;
        self.update_degraded(false).await;
    }

    /// Remove the current match store and enter degraded mode.
    pub async fn clear_match_store(&self) {
        self.store.set(None).await;
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Scoring rules in effect.
    pub fn scoring_rules(&self) -> ScoringRules {
        self.context.rules
    }

    /// Debounced score writer.
    pub fn persister(&self) -> &DebouncedPersister {
        &self.context.persister
    }

    /// Undo history persistence.
    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.context.history
    }

    /// Session of `match_id`, loading it from storage on first use.
    pub async fn session(&self, match_id: Uuid) -> Result<Arc<MatchSession>, ServiceError> {
        if let Some(session) = self.sessions.get(&match_id) {
            return Ok(session.clone());
        }

        let store = self.require_match_store().await?;
        let entity = store
            .find_match(match_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("match {match_id} not found")))?;
        let session = Arc::new(MatchSession::load(self.context.clone(), entity).await?);

        Ok(self
            .sessions
            .entry(match_id)
            .or_insert(session)
            .value()
            .clone())
    }

    /// Session of `match_id` if it is already loaded.
    pub fn loaded_session(&self, match_id: Uuid) -> Option<Arc<MatchSession>> {
        self.sessions.get(&match_id).map(|entry| entry.value().clone())
    }

    /// Number of sessions held in memory.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Forget the cached session so the next access reloads it from storage.
    pub fn evict_session(&self, match_id: Uuid) {
        self.sessions.remove(&match_id);
    }

    /// Drop `session` from memory once its match is over and its last score
    /// write has landed. Returns whether it was released.
    pub fn release_settled(&self, session: &Arc<MatchSession>, view: &SessionView) -> bool {
        let terminal = matches!(
            view.game_match.status,
            MatchStatus::Completed | MatchStatus::Cancelled
        );
        if !terminal || view.editing || view.save.pending {
            return false;
        }
        let released = self
            .sessions
            .remove_if(&session.id(), |_, cached| Arc::ptr_eq(cached, session))
            .is_some();
        if released {
            self.context.persister.forget(session.id());
        }
        released
    }
}
