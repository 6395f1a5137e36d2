//! Round-scoped team eligibility: within one game and round a team plays at most once.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    error::ServiceError,
    state::tournament::{Match, MatchStatus, Round, Team},
};

/// Teams registered for `game_id` that are not yet paired in `round`.
///
/// `excluding` skips one match (the one being edited) so its own teams stay
/// available. Cancelled matches do not consume teams.
pub fn eligible_teams(
    teams: &[Team],
    matches: &[Match],
    game_id: Uuid,
    round: Round,
    excluding: Option<Uuid>,
) -> Vec<Team> {
    let used = used_teams(matches, game_id, round, excluding);
    teams
        .iter()
        .filter(|team| team.game_id == game_id && !used.contains(&team.id))
        .cloned()
        .collect()
}

/// Reject a pairing that would book a team twice in the same game and round.
pub fn ensure_pairing_available(
    matches: &[Match],
    game_id: Uuid,
    round: Round,
    pairing: [Uuid; 2],
    excluding: Option<Uuid>,
) -> Result<(), ServiceError> {
    let conflict = matches
        .iter()
        .filter(|other| books_round(other, game_id, round, excluding))
        .find_map(|other| {
            pairing
                .into_iter()
                .find(|team| other.involves(*team))
                .map(|team| (team, other.match_number))
        });

    match conflict {
        Some((team, match_number)) => Err(ServiceError::InvalidInput(format!(
            "team {team} already plays match #{match_number} in this round"
        ))),
        None => Ok(()),
    }
}

fn used_teams(
    matches: &[Match],
    game_id: Uuid,
    round: Round,
    excluding: Option<Uuid>,
) -> HashSet<Uuid> {
    matches
        .iter()
        .filter(|other| books_round(other, game_id, round, excluding))
        .flat_map(|other| [other.team_a, other.team_b])
        .collect()
}

fn books_round(other: &Match, game_id: Uuid, round: Round, excluding: Option<Uuid>) -> bool {
    other.game_id == game_id
        && other.round == round
        && other.status != MatchStatus::Cancelled
        && Some(other.id) != excluding
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::{
        scoring::ScoreSnapshot,
        state::tournament::{GameFamily, TeamLetter},
    };

    fn team(game_id: Uuid, letter: TeamLetter) -> Team {
        Team {
            id: Uuid::new_v4(),
            hall_id: Uuid::new_v4(),
            hall_name: "North".into(),
            game_id,
            letter,
            name: None,
        }
    }

    fn pairing(game_id: Uuid, round: Round, a: &Team, b: &Team, number: u32) -> Match {
        Match {
            id: Uuid::new_v4(),
            team_a: a.id,
            team_b: b.id,
            game_id,
            family: GameFamily::PointAccumulation,
            round,
            match_number: number,
            status: MatchStatus::Scheduled,
            match_type: None,
            result: ScoreSnapshot::empty(GameFamily::PointAccumulation),
            winner: None,
            updated_at: SystemTime::now(),
        }
    }

    struct Fixture {
        game: Uuid,
        teams: Vec<Team>,
    }

    fn fixture() -> Fixture {
        let game = Uuid::new_v4();
        let teams = (0..4)
            .map(|i| team(game, if i % 2 == 0 { TeamLetter::A } else { TeamLetter::B }))
            .collect();
        Fixture { game, teams }
    }

    #[test]
    fn paired_teams_leave_the_pool() {
        let f = fixture();
        let matches = vec![pairing(f.game, Round::LeagueStage, &f.teams[0], &f.teams[1], 1)];

        let eligible = eligible_teams(&f.teams, &matches, f.game, Round::LeagueStage, None);
        let ids: Vec<_> = eligible.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![f.teams[2].id, f.teams[3].id]);
    }

    #[test]
    fn rounds_are_independent_pools() {
        let f = fixture();
        let matches = vec![pairing(f.game, Round::LeagueStage, &f.teams[0], &f.teams[1], 1)];

        let eligible = eligible_teams(&f.teams, &matches, f.game, Round::SemiFinal, None);
        assert_eq!(eligible.len(), 4);
    }

    #[test]
    fn edited_match_keeps_its_own_teams() {
        let f = fixture();
        let edited = pairing(f.game, Round::Final, &f.teams[0], &f.teams[1], 7);
        let matches = vec![edited.clone()];

        let eligible = eligible_teams(&f.teams, &matches, f.game, Round::Final, Some(edited.id));
        assert_eq!(eligible.len(), 4);
    }

    #[test]
    fn other_games_and_cancelled_matches_do_not_count() {
        let f = fixture();
        let other_game = Uuid::new_v4();
        let mut cancelled = pairing(f.game, Round::LeagueStage, &f.teams[2], &f.teams[3], 2);
        cancelled.status = MatchStatus::Cancelled;
        let matches = vec![
            pairing(other_game, Round::LeagueStage, &f.teams[0], &f.teams[1], 1),
            cancelled,
        ];

        let mut foreign = team(other_game, TeamLetter::A);
        foreign.hall_name = "South".into();
        let mut teams = f.teams.clone();
        teams.push(foreign);

        let eligible = eligible_teams(&teams, &matches, f.game, Round::LeagueStage, None);
        assert_eq!(eligible.len(), 4);
        assert!(eligible.iter().all(|t| t.game_id == f.game));
    }

    #[test]
    fn double_booking_is_rejected_with_match_number() {
        let f = fixture();
        let matches = vec![pairing(f.game, Round::LeagueStage, &f.teams[0], &f.teams[1], 3)];

        let err = ensure_pairing_available(
            &matches,
            f.game,
            Round::LeagueStage,
            [f.teams[1].id, f.teams[2].id],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(message) if message.contains("#3")));

        assert!(
            ensure_pairing_available(
                &matches,
                f.game,
                Round::LeagueStage,
                [f.teams[2].id, f.teams[3].id],
                None,
            )
            .is_ok()
        );
    }
}
