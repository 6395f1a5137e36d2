//! Runtime representation of the tournament entities the scoring engine works on.

use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, MatchEntity, TeamEntity},
    scoring::{ScoreSnapshot, Side},
};

/// Sport family a game belongs to; decides which scorer drives its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameFamily {
    /// Kabaddi-style four-category point accumulation.
    PointAccumulation,
    /// Table-tennis-style sets with a deuce rule.
    SetBased,
    /// Tug-of-war-style contests decided by picking a winner.
    BinaryOutcome,
}

impl GameFamily {
    /// Infer the family from a legacy game name.
    ///
    /// Only used once, when a game record without an explicit family is read.
    pub fn infer_from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "KABADDI" => Some(Self::PointAccumulation),
            "TABLE TENNIS" | "BADMINTON" | "VOLLEYBALL" => Some(Self::SetBased),
            "TUG OF WAR" => Some(Self::BinaryOutcome),
            _ => None,
        }
    }

    /// Short stable key used to scope persisted history entries.
    pub fn key(self) -> &'static str {
        match self {
            Self::PointAccumulation => "points",
            Self::SetBased => "sets",
            Self::BinaryOutcome => "binary",
        }
    }
}

impl fmt::Display for GameFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Scheduling phase; team exclusivity is enforced per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    /// Group stage, single set for set-based sports.
    LeagueStage,
    /// Semi final, best of three.
    SemiFinal,
    /// Final, best of three.
    Final,
}

impl Round {
    /// Maximum number of sets a set-based match may be played over in this round.
    pub fn max_sets(self) -> usize {
        match self {
            Self::LeagueStage => 1,
            Self::SemiFinal | Self::Final => 3,
        }
    }
}

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Created, not started yet.
    Scheduled,
    /// Being scored right now.
    Live,
    /// Finished with a fixed winner.
    Completed,
    /// Abandoned; terminal.
    Cancelled,
}

/// Sport-specific match format, required for set-based sports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// One player per side.
    Singles,
    /// Two players per side.
    Doubles,
}

/// Letter distinguishing the teams a hall registers for the same game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TeamLetter {
    /// First team of the hall.
    A,
    /// Second team of the hall.
    B,
}

impl fmt::Display for TeamLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// A game (sport) teams register for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    /// Stable identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Sport family resolved when the record was read.
    pub family: GameFamily,
}

/// A registered team. Owned by the registration collaborator, never mutated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Stable identifier.
    pub id: Uuid,
    /// Housing unit the team belongs to.
    pub hall_id: Uuid,
    /// Name of the housing unit.
    pub hall_name: String,
    /// Game the team registered for.
    pub game_id: Uuid,
    /// Team letter within the hall.
    pub letter: TeamLetter,
    /// Optional override name chosen by the team.
    pub name: Option<String>,
}

impl Team {
    /// Human readable name combining hall, letter and the optional override.
    pub fn display_name(&self) -> String {
        let base = format!("{} {}", self.hall_name, self.letter);
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{name} ({base})"),
            _ => base,
        }
    }
}

/// A scheduled pairing of two teams for one game and round.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Stable identifier.
    pub id: Uuid,
    /// First side.
    pub team_a: Uuid,
    /// Second side.
    pub team_b: Uuid,
    /// Game played.
    pub game_id: Uuid,
    /// Sport family, fixed when the match was created.
    pub family: GameFamily,
    /// Round the pairing belongs to.
    pub round: Round,
    /// Operator-facing number, unique across the tournament.
    pub match_number: u32,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Singles / doubles for set-based sports.
    pub match_type: Option<MatchType>,
    /// Sport-specific score payload.
    pub result: ScoreSnapshot,
    /// Winner once completed.
    pub winner: Option<Uuid>,
    /// Last modification time.
    pub updated_at: SystemTime,
}

impl Match {
    /// Team id playing on `side`.
    pub fn team_on(&self, side: Side) -> Uuid {
        match side {
            Side::A => self.team_a,
            Side::B => self.team_b,
        }
    }

    /// Side `team_id` plays on, if it takes part in this match.
    pub fn side_of(&self, team_id: Uuid) -> Option<Side> {
        if team_id == self.team_a {
            Some(Side::A)
        } else if team_id == self.team_b {
            Some(Side::B)
        } else {
            None
        }
    }

    /// Whether `team_id` plays on either side.
    pub fn involves(&self, team_id: Uuid) -> bool {
        self.side_of(team_id).is_some()
    }
}

impl TryFrom<GameEntity> for Game {
    type Error = GameEntity;

    /// Resolve the family once; hand the entity back when it cannot be resolved.
    fn try_from(value: GameEntity) -> Result<Self, Self::Error> {
        let family = match value.family {
            Some(family) => family,
            None => match GameFamily::infer_from_name(&value.name) {
                Some(family) => family,
                None => return Err(value),
            },
        };

        Ok(Self {
            id: value.id,
            name: value.name,
            family,
        })
    }
}

impl From<TeamEntity> for Team {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            hall_id: value.hall_id,
            hall_name: value.hall_name,
            game_id: value.game_id,
            letter: value.letter,
            name: value.name,
        }
    }
}

impl From<MatchEntity> for Match {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            team_a: value.team_a,
            team_b: value.team_b,
            game_id: value.game_id,
            family: value.family,
            round: value.round,
            match_number: value.match_number,
            status: value.status,
            match_type: value.match_type,
            result: value.result,
            winner: value.winner,
            updated_at: value.updated_at,
        }
    }
}

impl From<Match> for MatchEntity {
    fn from(value: Match) -> Self {
        Self {
            id: value.id,
            team_a: value.team_a,
            team_b: value.team_b,
            game_id: value.game_id,
            family: value.family,
            round: value.round,
            match_number: value.match_number,
            status: value.status,
            match_type: value.match_type,
            result: value.result,
            winner: value.winner,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: Option<&str>) -> Team {
        Team {
            id: Uuid::new_v4(),
            hall_id: Uuid::new_v4(),
            hall_name: "Raman Hall".into(),
            game_id: Uuid::new_v4(),
            letter: TeamLetter::B,
            name: name.map(Into::into),
        }
    }

    #[test]
    fn display_name_without_override() {
        assert_eq!(team(None).display_name(), "Raman Hall B");
        assert_eq!(team(Some("  ")).display_name(), "Raman Hall B");
    }

    #[test]
    fn display_name_with_override() {
        assert_eq!(
            team(Some("Thunder")).display_name(),
            "Thunder (Raman Hall B)"
        );
    }

    #[test]
    fn family_inference_is_case_insensitive() {
        assert_eq!(
            GameFamily::infer_from_name("kabaddi"),
            Some(GameFamily::PointAccumulation)
        );
        assert_eq!(
            GameFamily::infer_from_name(" Table Tennis "),
            Some(GameFamily::SetBased)
        );
        assert_eq!(
            GameFamily::infer_from_name("Tug of War"),
            Some(GameFamily::BinaryOutcome)
        );
        assert_eq!(GameFamily::infer_from_name("chess"), None);
    }

    #[test]
    fn explicit_family_wins_over_name() {
        let entity = GameEntity {
            id: Uuid::new_v4(),
            name: "Kabaddi".into(),
            family: Some(GameFamily::BinaryOutcome),
        };
        let game = Game::try_from(entity).unwrap();
        assert_eq!(game.family, GameFamily::BinaryOutcome);
    }

    #[test]
    fn unknown_game_is_handed_back() {
        let entity = GameEntity {
            id: Uuid::new_v4(),
            name: "Chess".into(),
            family: None,
        };
        let err = Game::try_from(entity).unwrap_err();
        assert_eq!(err.name, "Chess");
    }
}
