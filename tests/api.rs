use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use uuid::Uuid;

use score_desk_back::{
    config::AppConfig,
    dao::{
        history::MemoryHistoryStore,
        match_store::memory::{MemoryMatchStore, RecordedWrite, SeedData},
        models::{GameEntity, TeamEntity},
    },
    routes,
    state::{AppState, SharedState, tournament::TeamLetter},
};

struct Harness {
    state: SharedState,
    store: MemoryMatchStore,
    kabaddi: Uuid,
    table_tennis: Uuid,
    kabaddi_teams: Vec<Uuid>,
    tt_teams: Vec<Uuid>,
}

impl Harness {
    async fn new() -> Self {
        let kabaddi = Uuid::new_v4();
        let table_tennis = Uuid::new_v4();
        let mut teams = Vec::new();
        let mut kabaddi_teams = Vec::new();
        let mut tt_teams = Vec::new();
        for (game_id, ids, halls) in [
            (kabaddi, &mut kabaddi_teams, ["North", "South", "East"]),
            (table_tennis, &mut tt_teams, ["North", "South", "West"]),
        ] {
            for hall in halls {
                let id = Uuid::new_v4();
                ids.push(id);
                teams.push(TeamEntity {
                    id,
                    hall_id: Uuid::new_v4(),
                    hall_name: format!("{hall} Hall"),
                    game_id,
                    letter: TeamLetter::A,
                    name: None,
                });
            }
        }

        let store = MemoryMatchStore::from_seed(SeedData {
            games: vec![
                GameEntity {
                    id: kabaddi,
                    name: "Kabaddi".into(),
                    family: None,
                },
                GameEntity {
                    id: table_tennis,
                    name: "Table Tennis".into(),
                    family: None,
                },
            ],
            teams,
            matches: Vec::new(),
        });
        let state = AppState::new(&AppConfig::default(), Arc::new(MemoryHistoryStore::new()));
        state.set_match_store(Arc::new(store.clone())).await;

        Self {
            state,
            store,
            kabaddi,
            table_tennis,
            kabaddi_teams,
            tt_teams,
        }
    }

    fn router(&self) -> Router {
        routes::router(self.state.clone())
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(self.router(), method, uri, body).await
    }

    async fn create_kabaddi(&self, match_number: u32, a: usize, b: usize) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/matches",
                Some(json!({
                    "team_a": self.kabaddi_teams[a],
                    "team_b": self.kabaddi_teams[b],
                    "game_id": self.kabaddi,
                    "round": "league_stage",
                    "match_number": match_number,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn increment(side: &str, field: &str) -> Option<Value> {
    Some(json!({ "side": side, "field": field }))
}

#[tokio::test(start_paused = true)]
async fn kabaddi_match_from_schedule_to_completion() {
    let harness = Harness::new().await;
    let created = harness.create_kabaddi(1, 0, 1).await;
    let id = created["id"].as_str().unwrap().to_owned();
    assert_eq!(created["status"], "scheduled");
    assert_eq!(created["family"], "point_accumulation");

    let (status, body) = harness.send("POST", &format!("/matches/{id}/start"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["match"]["status"], "live");

    for field in ["raid_points", "raid_points", "bonus_points"] {
        let (status, _) = harness
            .send("POST", &format!("/matches/{id}/score/increment"), increment("a", field))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = harness
        .send("POST", &format!("/matches/{id}/score/increment"), increment("b", "all_out_points"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"], json!({ "team_a": 3, "team_b": 1 }));
    assert_eq!(body["undo_count"], 4);
    assert_eq!(body["pending_save"], true);

    let (status, body) = harness.send("POST", &format!("/matches/{id}/end"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["match"]["status"], "completed");
    assert_eq!(body["match"]["winner"], json!(harness.kabaddi_teams[0]));
    assert_eq!(body["undo_count"], 0);
    assert_eq!(harness.state.session_count(), 0);

    let writes = harness.store.writes().await;
    assert_eq!(harness.store.score_write_count().await, 1);
    assert!(matches!(writes.last(), Some(RecordedWrite::Status { .. })));

    let (status, body) = harness
        .send("POST", &format!("/matches/{id}/score/increment"), increment("a", "raid_points"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[tokio::test(start_paused = true)]
async fn score_bursts_are_written_once_after_the_quiet_window() {
    let harness = Harness::new().await;
    let id = harness.create_kabaddi(1, 0, 1).await["id"]
        .as_str()
        .unwrap()
        .to_owned();
    harness.send("POST", &format!("/matches/{id}/start"), None).await;

    for _ in 0..5 {
        harness
            .send("POST", &format!("/matches/{id}/score/increment"), increment("a", "raid_points"))
            .await;
    }
    assert_eq!(harness.store.score_write_count().await, 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let writes = harness.store.writes().await;
    let scores = writes
        .iter()
        .filter_map(|write| match write {
            RecordedWrite::Score { result, .. } => Some(result),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(scores.len(), 1);
    assert_eq!(
        serde_json::to_value(scores[0]).unwrap()["team_a"]["raid_points"],
        5
    );

    let (_, body) = harness.send("GET", &format!("/matches/{id}/session"), None).await;
    assert_eq!(body["pending_save"], false);
    assert_eq!(body["last_save_error"], Value::Null);
}

#[tokio::test(start_paused = true)]
async fn tied_match_needs_an_explicit_winner() {
    let harness = Harness::new().await;
    let id = harness.create_kabaddi(1, 0, 1).await["id"]
        .as_str()
        .unwrap()
        .to_owned();
    harness.send("POST", &format!("/matches/{id}/start"), None).await;

    let (status, body) = harness.send("POST", &format!("/matches/{id}/end"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "tie_unresolved");

    let (_, body) = harness.send("GET", &format!("/matches/{id}"), None).await;
    assert_eq!(body["status"], "live");

    let (status, body) = harness
        .send("POST", &format!("/matches/{id}/end"), Some(json!({ "winner": "b" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["match"]["winner"], json!(harness.kabaddi_teams[1]));
}

#[tokio::test(start_paused = true)]
async fn teams_play_once_per_round() {
    let harness = Harness::new().await;
    harness.create_kabaddi(1, 0, 1).await;

    let (status, body) = harness
        .send(
            "POST",
            "/matches",
            Some(json!({
                "team_a": harness.kabaddi_teams[1],
                "team_b": harness.kabaddi_teams[2],
                "game_id": harness.kabaddi,
                "round": "league_stage",
                "match_number": 2,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("#1"));

    let uri = format!("/games/{}/rounds/league_stage/eligible-teams", harness.kabaddi);
    let (status, body) = harness.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let eligible = body.as_array().unwrap();
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0]["id"], json!(harness.kabaddi_teams[2]));

    let uri = format!("/games/{}/rounds/semi_final/eligible-teams", harness.kabaddi);
    let (_, body) = harness.send("GET", &uri, None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn invalid_payloads_are_rejected() {
    let harness = Harness::new().await;

    let (status, _) = harness
        .send(
            "POST",
            "/matches",
            Some(json!({
                "team_a": harness.kabaddi_teams[0],
                "team_b": harness.kabaddi_teams[0],
                "game_id": harness.kabaddi,
                "round": "league_stage",
                "match_number": 1,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = harness
        .send(
            "POST",
            "/matches",
            Some(json!({
                "team_a": harness.tt_teams[0],
                "team_b": harness.tt_teams[1],
                "game_id": harness.table_tennis,
                "round": "final",
                "match_number": 3,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("match type"));

    let (status, _) = harness
        .send(
            "POST",
            "/matches",
            Some(json!({
                "team_a": harness.kabaddi_teams[0],
                "team_b": harness.tt_teams[1],
                "game_id": harness.kabaddi,
                "round": "league_stage",
                "match_number": 4,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn table_tennis_result_can_be_corrected() {
    let harness = Harness::new().await;
    let (status, created) = harness
        .send(
            "POST",
            "/matches",
            Some(json!({
                "team_a": harness.tt_teams[0],
                "team_b": harness.tt_teams[1],
                "game_id": harness.table_tennis,
                "round": "league_stage",
                "match_number": 7,
                "match_type": "singles",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let id = created["id"].as_str().unwrap().to_owned();
    harness.send("POST", &format!("/matches/{id}/start"), None).await;

    let point = |side: &str| Some(json!({ "side": side, "delta": "increment" }));
    for _ in 0..11 {
        harness
            .send("POST", &format!("/matches/{id}/score/sets"), point("a"))
            .await;
    }
    let (_, body) = harness.send("GET", &format!("/matches/{id}/session"), None).await;
    assert_eq!(body["is_complete"], true);
    assert_eq!(body["totals"], json!({ "team_a": 1, "team_b": 0 }));

    let (status, body) = harness.send("POST", &format!("/matches/{id}/end"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["match"]["winner"], json!(harness.tt_teams[0]));

    let (status, body) = harness.send("POST", &format!("/matches/{id}/edit"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["editing"], true);

    let correction = |side: &str, delta: &str| {
        Some(json!({ "side": side, "delta": delta, "set_index": 0 }))
    };
    for _ in 0..3 {
        harness
            .send("POST", &format!("/matches/{id}/score/sets"), correction("a", "decrement"))
            .await;
    }
    for _ in 0..11 {
        let (status, body) = harness
            .send("POST", &format!("/matches/{id}/score/sets"), correction("b", "increment"))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, body) = harness
        .send("POST", &format!("/matches/{id}/edit/finish"), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["editing"], false);
    assert_eq!(body["match"]["status"], "completed");
    assert_eq!(body["match"]["winner"], json!(harness.tt_teams[1]));
}

#[tokio::test(start_paused = true)]
async fn degraded_mode_reports_unavailable() {
    let state = AppState::new(&AppConfig::default(), Arc::new(MemoryHistoryStore::new()));
    let router = routes::router(state);

    let (status, body) = send(router.clone(), "GET", "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    let (status, body) = send(router, "GET", "/matches", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "service_unavailable");
}

#[tokio::test(start_paused = true)]
async fn deleting_a_match_frees_its_teams() {
    let harness = Harness::new().await;
    let id = harness.create_kabaddi(1, 0, 1).await["id"]
        .as_str()
        .unwrap()
        .to_owned();

    let (status, _) = harness.send("DELETE", &format!("/matches/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = harness.send("GET", &format!("/matches/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    harness.create_kabaddi(1, 1, 2).await;
}
