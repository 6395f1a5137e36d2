use std::cmp::Ordering;

use super::{ScoreError, Side};

/// Outcome of comparing the two totals of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Totals differ; the side with the higher total wins.
    Winner(Side),
    /// Totals are level; an operator must pick the winner.
    RequiresManualChoice,
}

/// Compare totals. There is no fallback winner for a tie.
pub fn resolve(total_a: u32, total_b: u32) -> Decision {
    match total_a.cmp(&total_b) {
        Ordering::Greater => Decision::Winner(Side::A),
        Ordering::Less => Decision::Winner(Side::B),
        Ordering::Equal => Decision::RequiresManualChoice,
    }
}

/// Determine the winner, consulting `manual_choice` only when the totals tie.
pub fn settle(
    (total_a, total_b): (u32, u32),
    manual_choice: Option<Side>,
) -> Result<Side, ScoreError> {
    match resolve(total_a, total_b) {
        Decision::Winner(side) => Ok(side),
        Decision::RequiresManualChoice => {
            manual_choice.ok_or(ScoreError::TieUnresolved { total_a, total_b })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_requires_manual_choice() {
        assert_eq!(resolve(15, 15), Decision::RequiresManualChoice);
        assert_eq!(resolve(0, 0), Decision::RequiresManualChoice);
    }

    #[test]
    fn higher_total_wins_automatically() {
        assert_eq!(resolve(16, 15), Decision::Winner(Side::A));
        assert_eq!(resolve(2, 3), Decision::Winner(Side::B));
    }

    #[test]
    fn settle_uses_manual_choice_only_for_ties() {
        assert_eq!(settle((15, 15), Some(Side::B)), Ok(Side::B));
        assert_eq!(settle((16, 15), Some(Side::B)), Ok(Side::A));
        assert_eq!(
            settle((15, 15), None),
            Err(ScoreError::TieUnresolved {
                total_a: 15,
                total_b: 15
            })
        );
    }
}
