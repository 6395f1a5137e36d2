//! Debounced score persistence: one pending write per match, coalescing bursts
//! of mutations into a single `patch_score` call.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::storage::{StorageError, StorageResult},
    scoring::ScoreSnapshot,
    state::StoreSlot,
};

/// Observable persistence state of one match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveState {
    /// A write is scheduled or in flight.
    pub pending: bool,
    /// Message of the last failed write, cleared by the next success.
    pub last_error: Option<String>,
}

struct PendingWrite {
    generation: u64,
    snapshot: ScoreSnapshot,
    timer: JoinHandle<()>,
}

struct PersisterInner {
    store: StoreSlot,
    debounce: Duration,
    generation: AtomicU64,
    pending: DashMap<Uuid, PendingWrite>,
    states: DashMap<Uuid, watch::Sender<SaveState>>,
    // Held for the whole of a store write, so writes of one match never overlap.
    write_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

/// Schedules score writes with a quiet window per match.
///
/// A failed write stays pending and is retried after another quiet window,
/// unless a newer snapshot was scheduled in the meantime.
#[derive(Clone)]
pub struct DebouncedPersister {
    inner: Arc<PersisterInner>,
}

impl DebouncedPersister {
    /// Persister writing through `store` after `debounce` without new mutations.
    pub fn new(store: StoreSlot, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(PersisterInner {
                store,
                debounce,
                generation: AtomicU64::new(0),
                pending: DashMap::new(),
                states: DashMap::new(),
                write_locks: DashMap::new(),
            }),
        }
    }

    /// Replace the pending snapshot of `match_id` and restart its timer.
    pub fn schedule(&self, match_id: Uuid, snapshot: ScoreSnapshot) {
        let replaced = self
            .inner
            .pending
            .insert(match_id, self.arm(match_id, snapshot));
        if let Some(previous) = replaced {
            previous.timer.abort();
        }
        self.update_state(match_id, |state| state.pending = true);
    }

    /// Write the pending snapshot now, if any, after any write already in flight.
    pub async fn flush(&self, match_id: Uuid) -> StorageResult<()> {
        let lock = self.write_lock(match_id);
        let _guard = lock.lock().await;
        let Some((_, pending)) = self.inner.pending.remove(&match_id) else {
            return Ok(());
        };
        pending.timer.abort();
        self.write(match_id, pending.snapshot).await
    }

    /// Write `snapshot` now in place of whatever is pending. Used before status
    /// changes so the score the operator sees lands before the status.
    pub async fn persist(&self, match_id: Uuid, snapshot: ScoreSnapshot) -> StorageResult<()> {
        let lock = self.write_lock(match_id);
        let _guard = lock.lock().await;
        if let Some((_, pending)) = self.inner.pending.remove(&match_id) {
            pending.timer.abort();
        }
        self.write(match_id, snapshot).await
    }

    /// Drop the pending write of a match that no longer exists.
    pub fn discard(&self, match_id: Uuid) {
        if let Some((_, pending)) = self.inner.pending.remove(&match_id) {
            pending.timer.abort();
        }
        self.inner.write_locks.remove(&match_id);
        self.update_state(match_id, |state| {
            state.pending = false;
            state.last_error = None;
        });
    }

    /// Drop the bookkeeping of a match with nothing left to write.
    pub fn forget(&self, match_id: Uuid) {
        if self.inner.pending.contains_key(&match_id) {
            return;
        }
        self.inner.write_locks.remove(&match_id);
        self.inner.states.remove(&match_id);
    }

    /// Current persistence state of `match_id`.
    pub fn save_state(&self, match_id: Uuid) -> SaveState {
        self.inner
            .states
            .get(&match_id)
            .map(|sender| sender.borrow().clone())
            .unwrap_or_default()
    }

    /// Subscribe to persistence state changes of `match_id`.
    pub fn subscribe(&self, match_id: Uuid) -> watch::Receiver<SaveState> {
        self.inner
            .states
            .entry(match_id)
            .or_insert_with(|| watch::channel(SaveState::default()).0)
            .subscribe()
    }

    fn arm(&self, match_id: Uuid, snapshot: ScoreSnapshot) -> PendingWrite {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let persister = self.clone();
        let debounce = self.inner.debounce;
        let timer = tokio::spawn(async move {
            sleep(debounce).await;
            persister.fire(match_id, generation).await;
        });
        PendingWrite {
            generation,
            snapshot,
            timer,
        }
    }

    fn write_lock(&self, match_id: Uuid) -> Arc<Mutex<()>> {
        self.inner
            .write_locks
            .entry(match_id)
            .or_default()
            .clone()
    }

    async fn fire(&self, match_id: Uuid, generation: u64) {
        let lock = self.write_lock(match_id);
        let _guard = lock.lock().await;
        let Some((_, pending)) = self
            .inner
            .pending
            .remove_if(&match_id, |_, pending| pending.generation == generation)
        else {
            return;
        };
        // Failures are already logged and recorded on the save state.
        let _ = self.write(match_id, pending.snapshot).await;
    }

    async fn write(&self, match_id: Uuid, snapshot: ScoreSnapshot) -> StorageResult<()> {
        let result = match self.inner.store.get().await {
            Some(store) => store
                .patch_score(match_id, snapshot.clone())
                .await
                .map(|patched| {
                    if patched.is_none() {
                        debug!(match_id = %match_id, "score write targeted a deleted match");
                    }
                }),
            None => Err(StorageError::Offline),
        };

        if result.is_err() {
            self.retry_later(match_id, snapshot);
        }
        let still_pending = self.inner.pending.contains_key(&match_id);
        match &result {
            Ok(()) => {
                debug!(match_id = %match_id, "score persisted");
                self.update_state(match_id, |state| {
                    state.pending = still_pending;
                    state.last_error = None;
                });
            }
            Err(err) => {
                warn!(match_id = %match_id, error = %err, "failed to persist score");
                let message = err.to_string();
                self.update_state(match_id, |state| {
                    state.pending = still_pending;
                    state.last_error = Some(message);
                });
            }
        }
        result
    }

    /// Put a failed snapshot back as pending, unless a newer one took its place.
    fn retry_later(&self, match_id: Uuid, snapshot: ScoreSnapshot) {
        if let Entry::Vacant(slot) = self.inner.pending.entry(match_id) {
            slot.insert(self.arm(match_id, snapshot));
        }
    }

    fn update_state(&self, match_id: Uuid, update: impl FnOnce(&mut SaveState)) {
        self.inner
            .states
            .entry(match_id)
            .or_insert_with(|| watch::channel(SaveState::default()).0)
            .send_modify(update);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::{
            match_store::memory::{MemoryMatchStore, RecordedWrite, SeedData},
            models::MatchEntity,
        },
        scoring::{PointField, ScoreMutation, ScoringMode, Side},
        state::tournament::{GameFamily, MatchStatus, Round},
    };

    fn seeded() -> (MemoryMatchStore, Uuid) {
        let id = Uuid::new_v4();
        let entity = MatchEntity {
            id,
            team_a: Uuid::new_v4(),
            team_b: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            family: GameFamily::PointAccumulation,
            round: Round::LeagueStage,
            match_number: 1,
            status: MatchStatus::Live,
            match_type: None,
            result: ScoreSnapshot::empty(GameFamily::PointAccumulation),
            winner: None,
            updated_at: std::time::SystemTime::now(),
        };
        let store = MemoryMatchStore::from_seed(SeedData {
            matches: vec![entity],
            ..SeedData::default()
        });
        (store, id)
    }

    async fn persister_for(store: &MemoryMatchStore) -> DebouncedPersister {
        let slot = StoreSlot::default();
        slot.set(Some(Arc::new(store.clone()))).await;
        DebouncedPersister::new(slot, Duration::from_millis(800))
    }

    fn bumped(snapshot: &ScoreSnapshot, times: usize) -> Vec<ScoreSnapshot> {
        let engine = crate::scoring::ScoreEngine::Points(Default::default());
        let mut current = snapshot.clone();
        (0..times)
            .map(|_| {
                current = engine
                    .apply_delta(
                        &current,
                        &ScoreMutation::Increment {
                            side: Side::A,
                            field: PointField::RaidPoints,
                        },
                        ScoringMode::Live,
                    )
                    .unwrap();
                current.clone()
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_coalesced_into_one_write() {
        let (store, id) = seeded();
        let persister = persister_for(&store).await;
        let snapshots = bumped(&ScoreSnapshot::empty(GameFamily::PointAccumulation), 5);

        for snapshot in &snapshots {
            persister.schedule(id, snapshot.clone());
            sleep(Duration::from_millis(100)).await;
        }
        assert!(persister.save_state(id).pending);
        assert_eq!(store.score_write_count().await, 0);

        sleep(Duration::from_millis(900)).await;

        let writes = store.writes().await;
        assert_eq!(
            writes,
            vec![RecordedWrite::Score {
                id,
                result: snapshots[4].clone()
            }]
        );
        assert!(!persister.save_state(id).pending);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_immediately_and_cancels_timer() {
        let (store, id) = seeded();
        let persister = persister_for(&store).await;
        let snapshot = bumped(&ScoreSnapshot::empty(GameFamily::PointAccumulation), 1).remove(0);

        persister.schedule(id, snapshot);
        persister.flush(id).await.unwrap();
        assert_eq!(store.score_write_count().await, 1);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(store.score_write_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_stays_pending_until_it_lands() {
        let (store, id) = seeded();
        let persister = persister_for(&store).await;
        let snapshot = bumped(&ScoreSnapshot::empty(GameFamily::PointAccumulation), 1).remove(0);
        store.set_failing(true);

        persister.schedule(id, snapshot.clone());
        sleep(Duration::from_secs(1)).await;

        let state = persister.save_state(id);
        assert!(state.pending);
        assert!(state.last_error.is_some());
        assert_eq!(store.score_write_count().await, 0);

        store.set_failing(false);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(persister.save_state(id), SaveState::default());
        assert_eq!(
            store.writes().await,
            vec![RecordedWrite::Score {
                id,
                result: snapshot
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flush_can_be_retried() {
        let (store, id) = seeded();
        let persister = persister_for(&store).await;
        let snapshot = bumped(&ScoreSnapshot::empty(GameFamily::PointAccumulation), 2).remove(1);

        persister.schedule(id, snapshot.clone());
        store.set_failing(true);
        assert!(persister.flush(id).await.is_err());
        assert!(persister.save_state(id).pending);

        store.set_failing(false);
        persister.flush(id).await.unwrap();
        assert_eq!(
            store.writes().await,
            vec![RecordedWrite::Score {
                id,
                result: snapshot
            }]
        );
        assert_eq!(persister.save_state(id), SaveState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_snapshot_wins_over_failed_one() {
        let (store, id) = seeded();
        let persister = persister_for(&store).await;
        let snapshots = bumped(&ScoreSnapshot::empty(GameFamily::PointAccumulation), 2);

        store.set_failing(true);
        assert!(persister.persist(id, snapshots[0].clone()).await.is_err());
        persister.schedule(id, snapshots[1].clone());
        store.set_failing(false);
        sleep(Duration::from_secs(2)).await;

        assert_eq!(
            store.writes().await,
            vec![RecordedWrite::Score {
                id,
                result: snapshots[1].clone()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persist_waits_for_write_in_flight() {
        let (store, id) = seeded();
        let persister = persister_for(&store).await;
        let snapshot = bumped(&ScoreSnapshot::empty(GameFamily::PointAccumulation), 1).remove(0);

        let lock = persister.write_lock(id);
        let in_flight = lock.lock().await;
        let writer = persister.clone();
        let task = tokio::spawn({
            let snapshot = snapshot.clone();
            async move { writer.persist(id, snapshot).await }
        });

        sleep(Duration::from_millis(100)).await;
        assert!(!task.is_finished());
        assert_eq!(store.score_write_count().await, 0);

        drop(in_flight);
        task.await.unwrap().unwrap();
        assert_eq!(store.score_write_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn discard_drops_pending_write() {
        let (store, id) = seeded();
        let persister = persister_for(&store).await;

        persister.schedule(id, ScoreSnapshot::empty(GameFamily::PointAccumulation));
        persister.discard(id);
        sleep(Duration::from_secs(2)).await;

        assert_eq!(store.score_write_count().await, 0);
    }
}
