use thiserror::Error;
use uuid::Uuid;

use crate::state::tournament::MatchStatus;

/// Events that can be applied to a match status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// Operator starts scoring.
    Start,
    /// Operator ends the match; a winner must be determined.
    Complete {
        /// Team that won, if one was determined.
        winner: Option<Uuid>,
    },
    /// Operator abandons the match.
    Cancel,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The status the match was in when the invalid event was received.
    pub from: MatchStatus,
    /// The event that cannot be applied from this status.
    pub event: MatchEvent,
}

/// Errors returned when a status transition cannot be taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested transition is not valid from the current status.
    InvalidTransition(InvalidTransition),
    /// Completion was requested without a determined winner.
    WinnerRequired,
}

/// Status machine of one match: Scheduled → Live → Completed, with Cancelled
/// reachable from every non-terminal status.
///
/// `transition` only validates. The caller runs the persistence work and
/// calls `commit` once it succeeded, so a failed write leaves the status as is.
#[derive(Debug, Clone)]
pub struct MatchStatusMachine {
    status: MatchStatus,
}

impl Default for MatchStatusMachine {
    fn default() -> Self {
        Self::new(MatchStatus::Scheduled)
    }
}

impl MatchStatusMachine {
    /// Create a machine resuming from a persisted status.
    pub fn new(status: MatchStatus) -> Self {
        Self { status }
    }

    /// Inspect the current status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Status `event` leads to from the current one.
    pub fn transition(&self, event: MatchEvent) -> Result<MatchStatus, TransitionError> {
        let next = match (self.status, event) {
            (MatchStatus::Scheduled, MatchEvent::Start) => MatchStatus::Live,
            (MatchStatus::Live, MatchEvent::Complete { winner: Some(_) }) => MatchStatus::Completed,
            (MatchStatus::Live, MatchEvent::Complete { winner: None }) => {
                return Err(TransitionError::WinnerRequired);
            }
            (MatchStatus::Scheduled | MatchStatus::Live, MatchEvent::Cancel) => {
                MatchStatus::Cancelled
            }
            (from, event) => {
                return Err(TransitionError::InvalidTransition(InvalidTransition {
                    from,
                    event,
                }));
            }
        };

        Ok(next)
    }

    /// Record a status returned by `transition`.
    pub fn commit(&mut self, next: MatchStatus) {
        self.status = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut MatchStatusMachine, event: MatchEvent) -> MatchStatus {
        let next = sm.transition(event).unwrap();
        sm.commit(next);
        sm.status()
    }

    fn winner() -> MatchEvent {
        MatchEvent::Complete {
            winner: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn initial_status_is_scheduled() {
        let sm = MatchStatusMachine::default();
        assert_eq!(sm.status(), MatchStatus::Scheduled);
    }

    #[test]
    fn happy_path_to_completed() {
        let mut sm = MatchStatusMachine::default();
        assert_eq!(apply(&mut sm, MatchEvent::Start), MatchStatus::Live);
        assert_eq!(apply(&mut sm, winner()), MatchStatus::Completed);
    }

    #[test]
    fn cancel_from_scheduled_and_live() {
        let mut sm = MatchStatusMachine::default();
        assert_eq!(apply(&mut sm, MatchEvent::Cancel), MatchStatus::Cancelled);

        let mut sm = MatchStatusMachine::new(MatchStatus::Live);
        assert_eq!(apply(&mut sm, MatchEvent::Cancel), MatchStatus::Cancelled);
    }

    #[test]
    fn completion_requires_winner() {
        let sm = MatchStatusMachine::new(MatchStatus::Live);
        let err = sm
            .transition(MatchEvent::Complete { winner: None })
            .unwrap_err();
        assert_eq!(err, TransitionError::WinnerRequired);
        assert_eq!(sm.status(), MatchStatus::Live);
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        for status in [MatchStatus::Completed, MatchStatus::Cancelled] {
            let sm = MatchStatusMachine::new(status);
            for event in [MatchEvent::Start, MatchEvent::Cancel, winner()] {
                match sm.transition(event).unwrap_err() {
                    TransitionError::InvalidTransition(invalid) => {
                        assert_eq!(invalid.from, status);
                        assert_eq!(invalid.event, event);
                    }
                    other => panic!("unexpected error: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn scheduled_cannot_complete() {
        let sm = MatchStatusMachine::default();
        assert!(matches!(
            sm.transition(winner()),
            Err(TransitionError::InvalidTransition(_))
        ));
    }

    #[test]
    fn validating_does_not_change_status() {
        let sm = MatchStatusMachine::default();
        assert_eq!(sm.transition(MatchEvent::Start), Ok(MatchStatus::Live));
        assert_eq!(sm.status(), MatchStatus::Scheduled);
    }
}
