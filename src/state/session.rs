//! Live state of one match: current score, status machine, undo history and
//! edit mode. Every operation on a match serializes on its session lock.

use std::{future::Future, sync::Arc, time::Duration, time::SystemTime};

use tokio::{
    sync::{Mutex, watch},
    time::timeout,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        history::{HistoryKey, HistoryStore},
        models::MatchEntity,
    },
    error::ServiceError,
    scoring::{
        PointField, ScoreEngine, ScoreError, ScoreMutation, ScoringMode, ScoringRules,
        SetAdjustment, Side, settle,
    },
    state::{
        StoreSlot,
        persister::{DebouncedPersister, SaveState},
        state_machine::{InvalidTransition, MatchEvent, MatchStatusMachine, TransitionError},
        tournament::{GameFamily, Match, MatchStatus},
        undo::UndoStack,
    },
};

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionContext {
    /// Match store slot, empty while degraded.
    pub store: StoreSlot,
    /// Undo history persistence.
    pub history: Arc<dyn HistoryStore>,
    /// Debounced score writer.
    pub persister: DebouncedPersister,
    /// Scoring rules used to build engines.
    pub rules: ScoringRules,
    /// Undo entries kept per match.
    pub undo_capacity: usize,
    /// Upper bound on the persistence work of a status transition.
    pub transition_timeout: Option<Duration>,
}

/// Point-in-time view of a session, as shown to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// Match including its current score.
    pub game_match: Match,
    /// Totals of side A and side B.
    pub totals: (u32, u32),
    /// Whether the score alone decides the winner.
    pub is_complete: bool,
    /// Number of undo entries.
    pub undo_count: usize,
    /// Whether undo is offered.
    pub can_undo: bool,
    /// Whether a completed match is being corrected.
    pub editing: bool,
    /// Debounced persistence state.
    pub save: SaveState,
}

struct SessionInner {
    game_match: Match,
    engine: ScoreEngine,
    machine: MatchStatusMachine,
    undo: UndoStack,
    editing: bool,
}

impl SessionInner {
    fn scoring_mode(&self) -> Result<ScoringMode, ScoreError> {
        match self.machine.status() {
            MatchStatus::Live => Ok(ScoringMode::Live),
            MatchStatus::Completed if self.editing => Ok(ScoringMode::Edit),
            MatchStatus::Completed => Err(ScoreError::Locked),
            other => Err(ScoreError::NotLive(other)),
        }
    }

    fn history_key(&self) -> HistoryKey {
        HistoryKey::new(self.game_match.family, self.game_match.id)
    }

    /// Side the current result declares the winner, with `manual_winner`
    /// breaking tied totals. Binary contests are decided by their pick alone.
    fn decide(&self, manual_winner: Option<Side>) -> Result<((u32, u32), Side), ScoreError> {
        let result = &self.game_match.result;
        let totals = self.engine.compute_totals(result)?;
        if self.game_match.family == GameFamily::BinaryOutcome {
            if !self.engine.is_complete(result) {
                return Err(ScoreError::Validation(
                    "select the winner before ending the match".into(),
                ));
            }
            return Ok((totals, settle(totals, None)?));
        }
        Ok((totals, settle(totals, manual_winner)?))
    }
}

/// Single owner of one match's live state.
pub struct MatchSession {
    id: Uuid,
    context: SessionContext,
    inner: Mutex<SessionInner>,
    undo_count: watch::Sender<usize>,
}

impl MatchSession {
    /// Build a session from the stored match, restoring undo history of live matches.
    pub async fn load(context: SessionContext, entity: MatchEntity) -> Result<Self, ServiceError> {
        let game_match = Match::from(entity);
        let engine = ScoreEngine::for_match(&game_match, &context.rules)?;
        let key = HistoryKey::new(game_match.family, game_match.id);

        let history = if game_match.status == MatchStatus::Live {
            context.history.load(key).await.unwrap_or_else(|err| {
                warn!(match_id = %game_match.id, error = %err, "failed to restore undo history");
                Vec::new()
            })
        } else {
            Vec::new()
        };
        let undo = UndoStack::restore(history, context.undo_capacity);
        let (undo_count, _) = watch::channel(undo.len());

        Ok(Self {
            id: game_match.id,
            context,
            inner: Mutex::new(SessionInner {
                machine: MatchStatusMachine::new(game_match.status),
                game_match,
                engine,
                undo,
                editing: false,
            }),
            undo_count,
        })
    }

    /// Identifier of the match.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current view of the session.
    pub async fn view(&self) -> SessionView {
        let inner = self.inner.lock().await;
        self.render(&inner)
    }

    /// Current match record, score included.
    pub async fn current(&self) -> Match {
        self.inner.lock().await.game_match.clone()
    }

    /// Subscribe to undo-count changes.
    pub fn subscribe_undo(&self) -> watch::Receiver<usize> {
        self.undo_count.subscribe()
    }

    /// Add one point to a counter of a point-accumulation match.
    pub async fn apply_increment(
        &self,
        side: Side,
        field: PointField,
    ) -> Result<SessionView, ServiceError> {
        self.mutate(ScoreMutation::Increment { side, field }).await
    }

    /// Change a set score of a set-based match.
    pub async fn adjust_set(&self, adjustment: SetAdjustment) -> Result<SessionView, ServiceError> {
        self.mutate(ScoreMutation::AdjustSet(adjustment)).await
    }

    /// Pick the winner of a binary-outcome match.
    pub async fn select_winner(&self, side: Side) -> Result<SessionView, ServiceError> {
        self.mutate(ScoreMutation::SelectWinner { side }).await
    }

    /// Restore the snapshot preceding the last live mutation.
    pub async fn undo(&self) -> Result<SessionView, ServiceError> {
        let mut inner = self.inner.lock().await;
        if inner.scoring_mode()? != ScoringMode::Live {
            return Err(ServiceError::InvalidState(
                "undo is only available while the match is live".into(),
            ));
        }
        if !inner.undo.can_undo(&inner.game_match.result) {
            return Err(ServiceError::InvalidState("nothing to undo".into()));
        }
        let Some(previous) = inner.undo.pop() else {
            return Err(ServiceError::InvalidState("nothing to undo".into()));
        };

        inner.game_match.result = previous;
        inner.game_match.updated_at = SystemTime::now();
        self.save_history(&inner).await;
        self.context
            .persister
            .schedule(self.id, inner.game_match.result.clone());
        Ok(self.render(&inner))
    }

    /// Move a scheduled match to live.
    pub async fn start(&self) -> Result<SessionView, ServiceError> {
        let mut inner = self.inner.lock().await;
        let store = self.context.store.require().await?;
        let id = self.id;

        self.run_transition(&mut inner, MatchEvent::Start, move || async move {
            store
                .patch_status(id, MatchStatus::Live, None)
                .await?
                .map(|_| ())
                .ok_or_else(|| ServiceError::NotFound(format!("match {id} not found")))
        })
        .await?;

        info!(match_id = %id, "match started");
        Ok(self.render(&inner))
    }

    /// Complete a live match. The winner follows the totals; `manual_winner`
    /// is only consulted when they tie.
    pub async fn end_match(&self, manual_winner: Option<Side>) -> Result<SessionView, ServiceError> {
        let mut inner = self.inner.lock().await;
        let from = inner.machine.status();
        if from != MatchStatus::Live {
            return Err(TransitionError::InvalidTransition(InvalidTransition {
                from,
                event: MatchEvent::Complete { winner: None },
            })
            .into());
        }

        let (totals, side) = inner.decide(manual_winner)?;
        let winner = inner.game_match.team_on(side);
        let store = self.context.store.require().await?;
        let persister = self.context.persister.clone();
        let result = inner.game_match.result.clone();
        let id = self.id;

        self.run_transition(
            &mut inner,
            MatchEvent::Complete {
                winner: Some(winner),
            },
            move || async move {
                persister.persist(id, result).await?;
                store
                    .patch_status(id, MatchStatus::Completed, Some(winner))
                    .await?
                    .map(|_| ())
                    .ok_or_else(|| ServiceError::NotFound(format!("match {id} not found")))
            },
        )
        .await?;

        inner.game_match.winner = Some(winner);
        self.drop_history(&mut inner).await;
        info!(match_id = %id, winner = %winner, totals = ?totals, "match completed");
        Ok(self.render(&inner))
    }

    /// Abandon a scheduled or live match.
    pub async fn cancel(&self) -> Result<SessionView, ServiceError> {
        let mut inner = self.inner.lock().await;
        let store = self.context.store.require().await?;
        let persister = self.context.persister.clone();
        let result = inner.game_match.result.clone();
        let id = self.id;

        self.run_transition(&mut inner, MatchEvent::Cancel, move || async move {
            persister.persist(id, result).await?;
            store
                .patch_status(id, MatchStatus::Cancelled, None)
                .await?
                .map(|_| ())
                .ok_or_else(|| ServiceError::NotFound(format!("match {id} not found")))
        })
        .await?;

        inner.editing = false;
        self.drop_history(&mut inner).await;
        info!(match_id = %id, "match cancelled");
        Ok(self.render(&inner))
    }

    /// Open a correction session on a completed match.
    pub async fn begin_edit(&self) -> Result<SessionView, ServiceError> {
        let mut inner = self.inner.lock().await;
        if inner.machine.status() != MatchStatus::Completed {
            return Err(ServiceError::InvalidState(
                "only completed matches can be edited".into(),
            ));
        }
        if inner.game_match.family == GameFamily::PointAccumulation {
            return Err(ServiceError::InvalidInput(
                "point-accumulation results cannot be edited".into(),
            ));
        }
        inner.editing = true;
        Ok(self.render(&inner))
    }

    /// Close the correction session, persisting the corrected score and the
    /// winner it implies.
    pub async fn finish_edit(
        &self,
        manual_winner: Option<Side>,
    ) -> Result<SessionView, ServiceError> {
        let mut inner = self.inner.lock().await;
        if !inner.editing {
            return Err(ServiceError::InvalidState("no edit session is open".into()));
        }

        let (_, side) = inner.decide(manual_winner)?;
        let winner = inner.game_match.team_on(side);
        let store = self.context.store.require().await?;

        self.context
            .persister
            .persist(self.id, inner.game_match.result.clone())
            .await?;
        if inner.game_match.winner != Some(winner) {
            store
                .patch_status(self.id, MatchStatus::Completed, Some(winner))
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("match {} not found", self.id)))?;
            info!(match_id = %self.id, winner = %winner, "winner corrected");
            inner.game_match.winner = Some(winner);
        }
        inner.editing = false;
        Ok(self.render(&inner))
    }

    async fn mutate(&self, mutation: ScoreMutation) -> Result<SessionView, ServiceError> {
        let mut inner = self.inner.lock().await;
        let mode = inner.scoring_mode()?;
        let next = inner
            .engine
            .apply_delta(&inner.game_match.result, &mutation, mode)?;

        let previous = std::mem::replace(&mut inner.game_match.result, next);
        inner.game_match.updated_at = SystemTime::now();

        let records_undo =
            mode == ScoringMode::Live && !matches!(mutation, ScoreMutation::SelectWinner { .. });
        if records_undo {
            inner.undo.push(previous);
            self.save_history(&inner).await;
        }

        self.context
            .persister
            .schedule(self.id, inner.game_match.result.clone());
        Ok(self.render(&inner))
    }

    async fn run_transition<F, Fut>(
        &self,
        inner: &mut SessionInner,
        event: MatchEvent,
        work: F,
    ) -> Result<MatchStatus, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ServiceError>>,
    {
        let next = inner.machine.transition(event)?;

        let work_future = work();
        let outcome = match self.context.transition_timeout {
            Some(limit) => timeout(limit, work_future)
                .await
                .unwrap_or(Err(ServiceError::Timeout)),
            None => work_future.await,
        };

        if let Err(err) = outcome {
            warn!(match_id = %self.id, event = ?event, error = %err, "status transition not applied");
            return Err(err);
        }

        inner.machine.commit(next);
        inner.game_match.status = next;
        inner.game_match.updated_at = SystemTime::now();
        Ok(next)
    }

    async fn save_history(&self, inner: &SessionInner) {
        let key = inner.history_key();
        if let Err(err) = self
            .context
            .history
            .save(key, inner.undo.to_history())
            .await
        {
            warn!(history = %key, error = %err, "failed to persist undo history");
        }
    }

    async fn drop_history(&self, inner: &mut SessionInner) {
        inner.undo.clear();
        let key = inner.history_key();
        if let Err(err) = self.context.history.delete(key).await {
            warn!(history = %key, error = %err, "failed to delete undo history");
        }
    }

    fn render(&self, inner: &SessionInner) -> SessionView {
        let undo_count = inner.undo.len();
        self.undo_count.send_if_modified(|current| {
            let changed = *current != undo_count;
            *current = undo_count;
            changed
        });

        let totals = inner
            .engine
            .compute_totals(&inner.game_match.result)
            .unwrap_or_default();
        SessionView {
            totals,
            is_complete: inner.engine.is_complete(&inner.game_match.result),
            undo_count,
            can_undo: inner.machine.status() == MatchStatus::Live
                && inner.undo.can_undo(&inner.game_match.result),
            editing: inner.editing,
            save: self.context.persister.save_state(self.id),
            game_match: inner.game_match.clone(),
        }
    }
}
