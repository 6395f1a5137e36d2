use std::collections::VecDeque;

use crate::scoring::ScoreSnapshot;

/// Default number of snapshots kept per match.
pub const DEFAULT_UNDO_CAPACITY: usize = 500;

/// Bounded last-in-first-out history of pre-mutation snapshots for one match.
///
/// When full, the oldest snapshot is evicted to make room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStack {
    entries: VecDeque<ScoreSnapshot>,
    capacity: usize,
}

impl UndoStack {
    /// Empty stack holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild a stack from persisted history (oldest first), keeping the newest entries.
    pub fn restore(history: Vec<ScoreSnapshot>, capacity: usize) -> Self {
        let mut stack = Self::new(capacity);
        for snapshot in history {
            stack.push(snapshot);
        }
        stack
    }

    /// Record the snapshot that preceded a mutation.
    pub fn push(&mut self, snapshot: ScoreSnapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Take the most recent snapshot back.
    pub fn pop(&mut self) -> Option<ScoreSnapshot> {
        self.entries.pop_back()
    }

    /// Number of snapshots available.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no snapshot is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether undo is offered given the `current` snapshot.
    ///
    /// An all-zero current score never offers undo, even with history left.
    pub fn can_undo(&self, current: &ScoreSnapshot) -> bool {
        !self.entries.is_empty() && !current.is_zeroed()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// History oldest first, as persisted.
    pub fn to_history(&self) -> Vec<ScoreSnapshot> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        scoring::{PointCounters, PointScore},
        state::tournament::GameFamily,
    };

    fn points(raid_a: u32) -> ScoreSnapshot {
        ScoreSnapshot::PointAccumulation(PointScore {
            team_a: PointCounters {
                raid_points: raid_a,
                ..PointCounters::default()
            },
            team_b: PointCounters::default(),
        })
    }

    #[test]
    fn pop_after_push_restores_exactly() {
        let mut stack = UndoStack::default();
        let snapshot = points(4);
        stack.push(snapshot.clone());
        assert_eq!(stack.pop(), Some(snapshot));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn lifo_order() {
        let mut stack = UndoStack::default();
        stack.push(points(1));
        stack.push(points(2));
        assert_eq!(stack.pop(), Some(points(2)));
        assert_eq!(stack.pop(), Some(points(1)));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut stack = UndoStack::new(2);
        stack.push(points(1));
        stack.push(points(2));
        stack.push(points(3));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.to_history(), vec![points(2), points(3)]);
    }

    #[test]
    fn zeroed_current_score_disables_undo() {
        let mut stack = UndoStack::default();
        stack.push(points(3));
        assert!(!stack.can_undo(&ScoreSnapshot::empty(GameFamily::PointAccumulation)));
        assert!(stack.can_undo(&points(1)));
        assert!(!UndoStack::default().can_undo(&points(1)));
    }

    #[test]
    fn restore_keeps_newest_within_capacity() {
        let stack = UndoStack::restore(vec![points(1), points(2), points(3)], 2);
        assert_eq!(stack.to_history(), vec![points(2), points(3)]);
    }
}
