use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use trivia_board::api::router;
use trivia_board::auth::AdminAuthConfig;
use trivia_board::state::AppState;
use trivia_board::store::snapshot::StoreSnapshot;

/// Two categories. History (newer, so first on the board) is short:
/// 1 easy, 1 medium, 3 hard. Science has three questions per tier.
fn seed() -> Value {
    let q = |id: i64, category: i64, difficulty: &str, key: f64| {
        json!({
            "id": id,
            "category_id": category,
            "text": format!("Question {}", id),
            "answer": format!("Answer {}", id),
            "difficulty": difficulty,
            "shuffle_key": key,
        })
    };
    json!({
        "schema_version": 1,
        "categories": [
            {"id": 1, "name": "Science", "created_at": "2024-01-01T00:00:00Z"},
            {"id": 2, "name": "History", "created_at": "2024-02-01T00:00:00Z"},
            {"id": 3, "name": "Empty", "created_at": "2023-01-01T00:00:00Z"}
        ],
        "questions": [
            q(1, 1, "200", 0.5), q(2, 1, "200", 0.2), q(3, 1, "200", 0.8),
            q(4, 1, "400", 0.1), q(5, 1, "400", 0.9), q(6, 1, "400", 0.4),
            q(7, 1, "600", 0.3), q(8, 1, "600", 0.6), q(9, 1, "600", 0.05),
            q(10, 2, "200", 0.7), q(11, 2, "400", 0.2),
            q(12, 2, "600", 0.9), q(13, 2, "600", 0.1), q(14, 2, "600", 0.5)
        ]
    })
}

const FULL_BOARD: [i64; 11] = [10, 11, 13, 14, 12, 2, 1, 4, 6, 9, 7];

fn open_auth() -> Arc<AdminAuthConfig> {
    Arc::new(AdminAuthConfig::disabled())
}

async fn seeded_app() -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::default());
    let snapshot: StoreSnapshot = serde_json::from_value(seed()).unwrap();
    state.store.import_snapshot(snapshot).await.unwrap();
    let app = router(state.clone(), open_auth());
    (state, app)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    player: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(player) = player {
        builder = builder.header("x-player-id", player);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .expect("expected a list of questions")
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect()
}

async fn create_game(app: &Router, player: &str, categories: Value) -> i64 {
    let (status, game) = send(
        app,
        "POST",
        "/api/games",
        Some(player),
        Some(json!({"mode": "offline", "categories": categories})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // Keep creation timestamps strictly ordered
    tokio::time::sleep(Duration::from_millis(5)).await;
    game["id"].as_i64().unwrap()
}

/// End-to-end flow for two players sharing the pre-shuffled order
#[tokio::test]
async fn test_full_game_flow() {
    let (_state, app) = seeded_app().await;

    // 1. Alice opens a game: History first (newer), short category backfilled from hard
    let alice_1 = create_game(&app, "alice", json!([1, 2])).await;
    let uri = format!("/api/games/{}/available_questions", alice_1);
    let (status, board) = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&board), FULL_BOARD.to_vec());
    assert_eq!(board[0]["difficulty"], "200");

    // 2. Finish a round; integer strings are accepted
    let finish = format!("/api/games/{}/finish_round", alice_1);
    let (status, body) = send(
        &app,
        "POST",
        &finish,
        Some("alice"),
        Some(json!({"played_question_ids": [10, "11"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "saved": 2}));

    // Same completion again is a no-op
    let (_, body) = send(
        &app,
        "POST",
        &finish,
        Some("alice"),
        Some(json!({"played_question_ids": [10]})),
    )
    .await;
    assert_eq!(body["saved"], 0);

    let (_, board) = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(ids(&board), FULL_BOARD[2..].to_vec());

    // 3. Bob has no history and sees exactly Alice's original board
    let bob_1 = create_game(&app, "bob", json!([2, 1])).await;
    let (_, bob_board) = send(
        &app,
        "GET",
        &format!("/api/games/{}/available_questions", bob_1),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(ids(&bob_board), FULL_BOARD.to_vec());

    // 4. Alice's second game avoids everything she already played
    let alice_2 = create_game(&app, "alice", json!([1, 2])).await;
    let uri_2 = format!("/api/games/{}/available_questions", alice_2);
    let (_, board_2) = send(&app, "GET", &uri_2, Some("alice"), None).await;
    let board_2 = ids(&board_2);
    assert_eq!(board_2, vec![13, 14, 12, 2, 1, 4, 6, 9, 7]);

    // 5. Playing in game 2 fixes its board; game 1's board is untouched
    send(
        &app,
        "POST",
        &format!("/api/games/{}/finish_round", alice_2),
        Some("alice"),
        Some(json!({"played_question_ids": [13]})),
    )
    .await;
    let (_, fixed_2) = send(&app, "GET", &uri_2, Some("alice"), None).await;
    assert_eq!(ids(&fixed_2), board_2[1..].to_vec());
    let (_, board_1) = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(ids(&board_1), FULL_BOARD[2..].to_vec());

    // 6. Spare questions come from outside the board
    let (status, spare) = send(
        &app,
        "GET",
        &format!("/api/games/{}/prefetch_outside_board?count=10", alice_1),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mut spare = ids(&spare);
    spare.sort();
    assert_eq!(spare, vec![3, 5, 8]);

    // 7. Stats and recent games
    let (_, stats) = send(&app, "GET", "/api/games/stats", Some("alice"), None).await;
    assert_eq!(
        stats,
        json!({"total_games": 2, "total_questions_answered": 3})
    );
    let (_, recent) = send(&app, "GET", "/api/games/recent", Some("alice"), None).await;
    assert_eq!(ids(&recent), vec![alice_2, alice_1]);
    assert_eq!(recent[0]["categories"][0]["name"], "History");
}

#[tokio::test]
async fn test_no_repeats_across_a_players_games() {
    let (_state, app) = seeded_app().await;
    let mut seen = HashSet::new();

    // Each game plays its whole board; the next board must be all new
    loop {
        let game = create_game(&app, "carol", json!([1, 2])).await;
        let (_, board) = send(
            &app,
            "GET",
            &format!("/api/games/{}/available_questions", game),
            Some("carol"),
            None,
        )
        .await;
        let board = ids(&board);
        if board.is_empty() {
            break;
        }
        assert!(board.len() <= 12);
        for id in &board {
            assert!(seen.insert(*id), "question {} repeated", id);
        }
        send(
            &app,
            "POST",
            &format!("/api/games/{}/finish_round", game),
            Some("carol"),
            Some(json!({"played_question_ids": board})),
        )
        .await;
    }

    assert_eq!(seen.len(), 14);
}

#[tokio::test]
async fn test_cache_hit_drops_deleted_question() {
    let (state, app) = seeded_app().await;
    let game = create_game(&app, "alice", json!([1, 2])).await;
    let uri = format!("/api/games/{}/available_questions", game);

    let (_, first) = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(ids(&first), FULL_BOARD.to_vec());

    assert!(state.store.remove_question(13).await);

    let (status, second) = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    let expected: Vec<i64> = FULL_BOARD.iter().copied().filter(|id| *id != 13).collect();
    assert_eq!(ids(&second), expected);
}

#[tokio::test]
async fn test_player_scoping_and_validation() {
    let (_state, app) = seeded_app().await;
    let game = create_game(&app, "alice", json!([1])).await;
    let uri = format!("/api/games/{}/available_questions", game);

    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", &uri, Some("mallory"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/games/999/available_questions", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let finish = format!("/api/games/{}/finish_round", game);
    let (status, body) = send(
        &app,
        "POST",
        &finish,
        Some("alice"),
        Some(json!({"played_question_ids": ["abc"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("integers"));

    let (status, _) = send(
        &app,
        "POST",
        &finish,
        Some("alice"),
        Some(json!({"played_question_ids": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "POST", &finish, Some("alice"), Some(json!({}))).await;
    assert_eq!(body["saved"], 0);

    let (status, _) = send(
        &app,
        "POST",
        "/api/games",
        Some("alice"),
        Some(json!({"mode": "solo", "categories": [77]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reshuffle_endpoints() {
    let (state, app) = seeded_app().await;

    let (status, body) = send(&app, "POST", "/api/admin/reshuffle", None, Some(json!({"category": 3}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"category": 3, "shuffled": 0}));

    let (_, body) = send(&app, "POST", "/api/admin/reshuffle", None, Some(json!({"category": 1}))).await;
    assert_eq!(body, json!({"category": 1, "shuffled": 9}));

    let (_, body) = send(&app, "POST", "/api/admin/reshuffle", None, Some(json!({"all": true}))).await;
    assert_eq!(body, json!({"categories_shuffled": 2, "total_questions": 14}));

    let (status, _) = send(&app, "POST", "/api/admin/reshuffle", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/admin/reshuffle", None, Some(json!({"category": 404}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let exported = state.store.export_snapshot().await;
    assert!(exported
        .questions
        .iter()
        .all(|q| (0.0..1.0).contains(&q.shuffle_key)));
}

#[tokio::test]
async fn test_reshuffle_all_with_only_empty_categories() {
    let state = Arc::new(AppState::default());
    let snapshot: StoreSnapshot = serde_json::from_value(json!({
        "schema_version": 1,
        "categories": [{"id": 1, "name": "Nothing yet", "created_at": "2024-01-01T00:00:00Z"}]
    }))
    .unwrap();
    state.store.import_snapshot(snapshot).await.unwrap();
    let app = router(state, open_auth());

    let (status, body) = send(&app, "POST", "/api/admin/reshuffle", None, Some(json!({"all": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"categories_shuffled": 0, "total_questions": 0}));
}

#[tokio::test]
async fn test_admin_routes_require_credentials_when_configured() {
    let state = Arc::new(AppState::default());
    let app = router(
        state,
        Arc::new(AdminAuthConfig::with_credentials("admin", "secret")),
    );

    let (status, _) = send(&app, "GET", "/api/admin/state/export", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/admin/state/export")
        // "admin:secret"
        .header(header::AUTHORIZATION, "Basic YWRtaW46c2VjcmV0")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Player routes are not behind admin auth
    let (status, _) = send(&app, "GET", "/api/games/stats", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_state_import_export_roundtrip() {
    let (_state, app) = seeded_app().await;
    let game = create_game(&app, "alice", json!([2])).await;
    send(
        &app,
        "POST",
        &format!("/api/games/{}/finish_round", game),
        Some("alice"),
        Some(json!({"played_question_ids": [10]})),
    )
    .await;

    let (status, exported) = send(&app, "GET", "/api/admin/state/export", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(exported["played"], json!([{"game_id": game, "question_id": 10}]));

    let (fresh_state, fresh_app) = {
        let state = Arc::new(AppState::default());
        let app = router(state.clone(), open_auth());
        (state, app)
    };
    let (status, _) = send(&fresh_app, "POST", "/api/admin/state/import", None, Some(exported)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(fresh_state.store.export_snapshot().await.questions.len(), 14);

    // The restored game is already fixed and skips the played question
    let (_, board) = send(
        &fresh_app,
        "GET",
        &format!("/api/games/{}/available_questions", game),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(ids(&board), vec![11, 13, 14, 12]);

    let (status, _) = send(
        &fresh_app,
        "POST",
        "/api/admin/state/import",
        None,
        Some(json!({"schema_version": 99})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_replaces_cached_boards() {
    let (_state, app) = seeded_app().await;
    let game = create_game(&app, "alice", json!([1])).await;
    let uri = format!("/api/games/{}/available_questions", game);
    let (_, board) = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(ids(&board), FULL_BOARD[5..].to_vec());

    // Restore data in which the same game id is bob's History game
    let mut snapshot = seed();
    snapshot["games"] = json!([{
        "id": game,
        "player": "bob",
        "mode": "solo",
        "categories": [2, 2],
        "created_at": "2024-03-01T00:00:00Z"
    }]);
    let (status, _) = send(&app, "POST", "/api/admin/state/import", None, Some(snapshot)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, board) = send(&app, "GET", &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&board), FULL_BOARD[..5].to_vec());

    // New games never take an id that was already handed out
    let next = create_game(&app, "alice", json!([1])).await;
    assert!(next > game);
}

#[test]
fn test_bundled_seed_file_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/seed.json");
    let snapshot = StoreSnapshot::load_file(path).unwrap();
    assert!(snapshot.validate().is_ok());
    assert_eq!(snapshot.categories.len(), 2);
    assert_eq!(snapshot.questions.len(), 14);
}
