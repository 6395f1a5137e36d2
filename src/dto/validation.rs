//! Validation helpers for DTOs.

use uuid::Uuid;
use validator::ValidationError;

/// Validates that a match opposes two different teams.
///
/// # Examples
///
/// ```ignore
/// validate_distinct_teams(a, b) // Ok when a != b
/// validate_distinct_teams(a, a) // Err - same team twice
/// ```
pub fn validate_distinct_teams(team_a: Uuid, team_b: Uuid) -> Result<(), ValidationError> {
    if team_a == team_b {
        let mut err = ValidationError::new("distinct_teams");
        err.message = Some("A match needs two different teams".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_distinct_teams() {
        let team = Uuid::new_v4();
        assert!(validate_distinct_teams(team, Uuid::new_v4()).is_ok());
        assert!(validate_distinct_teams(team, team).is_err());
    }
}
