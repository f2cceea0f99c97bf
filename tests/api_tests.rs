use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use uuid::Uuid;

use movie_night_api::{
    config::Config,
    error::{AppError, AppResult},
    models::{TmdbMovieDetails, TmdbSearchResult},
    routes::{create_router, AppState},
    services::providers::MovieLookup,
};

/// Lookup that knows a single movie
struct StubLookup;

#[async_trait::async_trait]
impl MovieLookup for StubLookup {
    async fn search(&self, query: &str) -> AppResult<Vec<TmdbSearchResult>> {
        if !"the matrix".contains(&query.to_lowercase()) {
            return Ok(vec![]);
        }
        Ok(vec![TmdbSearchResult {
            id: 603,
            title: "The Matrix".to_string(),
            poster_path: Some("/matrix.jpg".to_string()),
            backdrop_path: None,
            overview: String::new(),
            release_date: Some("1999-03-30".to_string()),
            vote_average: Some(8.2),
            vote_count: Some(25000),
        }])
    }

    async fn details(&self, tmdb_id: i64) -> AppResult<TmdbMovieDetails> {
        if tmdb_id != 603 {
            return Err(AppError::NotFound("Movie not found on TMDB".to_string()));
        }
        Ok(TmdbMovieDetails {
            id: 603,
            title: "The Matrix".to_string(),
            poster_path: Some("/matrix.jpg".to_string()),
            backdrop_path: None,
            overview: "A hacker learns the truth".to_string(),
            release_date: Some("1999-03-30".to_string()),
            vote_average: Some(8.2),
            vote_count: Some(25000),
            runtime: Some(136),
            genres: vec![],
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn server_with(config: Config, lookup: Option<Arc<dyn MovieLookup>>) -> TestServer {
    let state = Arc::new(AppState::in_memory(&config, lookup));
    TestServer::new(create_router(state)).unwrap()
}

fn create_test_server() -> TestServer {
    server_with(Config::default(), Some(Arc::new(StubLookup)))
}

fn as_user(request: TestRequest, user: Uuid) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user.to_string()).unwrap(),
    )
}

async fn create_movie(server: &TestServer, user: Uuid, tmdb_id: i64, title: &str) -> String {
    let response = as_user(server.post("/api/v1/movies"), user)
        .json(&json!({ "tmdb_id": tmdb_id, "title": title, "release_year": 2000 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let movie: Value = response.json();
    movie["id"].as_str().unwrap().to_string()
}

async fn create_night(server: &TestServer, host: Uuid) -> String {
    let response = as_user(server.post("/api/v1/nights"), host)
        .json(&json!({ "title": "Friday movie night", "date": "2026-10-23T19:00:00Z" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let night: Value = response.json();
    night["id"].as_str().unwrap().to_string()
}

/// Night with four candidates, returned with their ids in wheel order
async fn night_with_candidates(server: &TestServer, host: Uuid) -> (String, Vec<String>) {
    let night_id = create_night(server, host).await;
    let mut movie_ids = Vec::new();
    for (i, title) in ["Alien", "Heat", "Ran", "Up"].iter().enumerate() {
        let movie_id = create_movie(server, host, 100 + i as i64, title).await;
        as_user(
            server.post(&format!("/api/v1/nights/{}/candidates", night_id)),
            host,
        )
        .json(&json!({ "movie_id": movie_id }))
        .await
        .assert_status_ok();
        movie_ids.push(movie_id);
    }
    (night_id, movie_ids)
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let id = Uuid::new_v4().to_string();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_str(&id).unwrap(),
        )
        .await;
    assert_eq!(response.header("x-request-id").to_str().unwrap(), id);
}

#[tokio::test]
async fn test_api_requires_identity() {
    let server = create_test_server();

    server
        .get("/api/v1/nights")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/v1/nights")
        .add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("not-a-uuid"),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("identity"));
}

#[tokio::test]
async fn test_profile_upsert_and_stats() {
    let server = create_test_server();
    let me = Uuid::new_v4();

    as_user(server.get("/api/v1/users/me"), me)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = as_user(server.put("/api/v1/users/me"), me)
        .json(&json!({ "name": "Ada" }))
        .await;
    response.assert_status_ok();
    let user: Value = response.json();
    assert_eq!(user["name"], "Ada");

    let response = as_user(server.get(&format!("/api/v1/users/{}/stats", me)), me).await;
    response.assert_status_ok();
    let stats: Value = response.json();
    assert_eq!(stats["movies_watched"], 0);
    assert_eq!(stats["ratings_given"], 0);
}

#[tokio::test]
async fn test_movie_search_and_import() {
    let server = create_test_server();
    let me = Uuid::new_v4();

    let response = as_user(server.get("/api/v1/movies/search?q=matrix"), me).await;
    response.assert_status_ok();
    let results: Vec<Value> = response.json();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], 603);

    let response = as_user(server.post("/api/v1/movies/tmdb/603"), me).await;
    response.assert_status(StatusCode::CREATED);
    let movie: Value = response.json();
    assert_eq!(movie["release_year"], 1999);
    assert_eq!(movie["poster"], "https://image.tmdb.org/t/p/w342/matrix.jpg");

    as_user(server.post("/api/v1/movies/tmdb/1"), me)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lookup_unconfigured_is_unavailable() {
    let server = server_with(Config::default(), None);
    let me = Uuid::new_v4();

    as_user(server.get("/api/v1/movies/search?q=matrix"), me)
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    // stored movies still work without TMDB
    create_movie(&server, me, 1, "Home Video").await;
}

#[tokio::test]
async fn test_movie_upsert_dedupes_on_tmdb_id() {
    let server = create_test_server();
    let me = Uuid::new_v4();

    let first = create_movie(&server, me, 42, "Hitchhiker").await;
    let second = create_movie(&server, me, 42, "Hitchhiker again").await;
    assert_eq!(first, second);

    let response = as_user(server.get(&format!("/api/v1/movies/{}", first)), me).await;
    let movie: Value = response.json();
    assert_eq!(movie["title"], "Hitchhiker");
    assert_eq!(movie["poster"], "/placeholder.jpg");
}

#[tokio::test]
async fn test_watchlist_flow() {
    let server = create_test_server();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let heat = create_movie(&server, alice, 949, "Heat").await;
    let alien = create_movie(&server, alice, 348, "Alien").await;

    as_user(server.post("/api/v1/watchlist"), alice)
        .json(&json!({ "movie_id": heat }))
        .await
        .assert_status(StatusCode::CREATED);
    let response = as_user(server.post("/api/v1/watchlist"), bob)
        .json(&json!({ "movie_id": alien, "note": "for Halloween" }))
        .await;
    let alien_entry: Value = response.json();
    let alien_entry_id = alien_entry["id"].as_str().unwrap();

    as_user(
        server.post(&format!("/api/v1/watchlist/{}/upvote", alien_entry_id)),
        alice,
    )
    .await
    .assert_status_ok();

    let response = as_user(server.get("/api/v1/watchlist"), alice).await;
    let items: Vec<Value> = response.json();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["movie"]["title"], "Alien");
    assert_eq!(items[0]["upvote_count"], 1);

    as_user(
        server.delete(&format!("/api/v1/watchlist/{}", alien_entry_id)),
        alice,
    )
    .await
    .assert_status(StatusCode::NO_CONTENT);

    let response = as_user(server.get("/api/v1/watchlist/count"), alice).await;
    let count: Value = response.json();
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_spin_needs_two_candidates() {
    let server = create_test_server();
    let host = Uuid::new_v4();
    let night_id = create_night(&server, host).await;

    let response = as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let movie_id = create_movie(&server, host, 7, "Solo").await;
    as_user(
        server.post(&format!("/api/v1/nights/{}/candidates", night_id)),
        host,
    )
    .json(&json!({ "movie_id": movie_id }))
    .await
    .assert_status_ok();

    as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_spin_commit_flow() {
    let server = create_test_server();
    let host = Uuid::new_v4();
    let (night_id, movie_ids) = night_with_candidates(&server, host).await;

    let response = as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host).await;
    response.assert_status_ok();
    let outcome: Value = response.json();
    let winner_index = outcome["winner_index"].as_u64().unwrap() as usize;
    let winner_id = outcome["winner_id"].as_str().unwrap().to_string();
    let rotation = outcome["rotation_degrees"].as_f64().unwrap();
    assert_eq!(movie_ids[winner_index], winner_id);
    assert!((4.0 * 360.0..5.0 * 360.0).contains(&rotation));
    assert_eq!(outcome["sector_width_degrees"].as_f64().unwrap(), 90.0);

    // a second spin while the first is pending is refused
    as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host)
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = as_user(server.get(&format!("/api/v1/nights/{}", night_id)), host).await;
    let details: Value = response.json();
    assert_eq!(details["spinning"], true);
    assert!(details["picked_movie"].is_null());
    assert_eq!(details["candidate_movies"].as_array().unwrap().len(), 4);

    let response = as_user(
        server.post(&format!("/api/v1/nights/{}/spin/commit", night_id)),
        host,
    )
    .await;
    response.assert_status_ok();
    let night: Value = response.json();
    assert_eq!(night["picked_movie"], winner_id.as_str());
    assert_eq!(night["status"], "active");

    as_user(
        server.post(&format!("/api/v1/nights/{}/spin/commit", night_id)),
        host,
    )
    .await
    .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancelled_spin_leaves_night_unpicked() {
    let server = create_test_server();
    let host = Uuid::new_v4();
    let (night_id, _) = night_with_candidates(&server, host).await;

    as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host)
        .await
        .assert_status_ok();
    let response = as_user(
        server.post(&format!("/api/v1/nights/{}/spin/cancel", night_id)),
        host,
    )
    .await;
    let body: Value = response.json();
    assert_eq!(body["cancelled"], true);

    let response = as_user(server.get(&format!("/api/v1/nights/{}", night_id)), host).await;
    let details: Value = response.json();
    assert_eq!(details["spinning"], false);
    assert!(details["picked_movie"].is_null());
    assert_eq!(details["status"], "upcoming");
}

#[tokio::test]
async fn test_repick_disabled() {
    let config = Config {
        allow_repick: false,
        ..Config::default()
    };
    let server = server_with(config, None);
    let host = Uuid::new_v4();
    let (night_id, _) = night_with_candidates(&server, host).await;

    as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host)
        .await
        .assert_status_ok();
    as_user(
        server.post(&format!("/api/v1/nights/{}/spin/commit", night_id)),
        host,
    )
    .await
    .assert_status_ok();

    as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_status_moves_forward_only() {
    let server = create_test_server();
    let host = Uuid::new_v4();
    let night_id = create_night(&server, host).await;

    let response = as_user(
        server.put(&format!("/api/v1/nights/{}/status", night_id)),
        host,
    )
    .json(&json!({ "status": "active" }))
    .await;
    response.assert_status_ok();

    as_user(
        server.put(&format!("/api/v1/nights/{}/status", night_id)),
        host,
    )
    .json(&json!({ "status": "upcoming" }))
    .await
    .assert_status(StatusCode::CONFLICT);

    let response = as_user(server.get("/api/v1/nights/upcoming"), host).await;
    let upcoming: Vec<Value> = response.json();
    assert!(upcoming.is_empty());
}

#[tokio::test]
async fn test_join_is_deduplicated() {
    let server = create_test_server();
    let host = Uuid::new_v4();
    let guest = Uuid::new_v4();
    let night_id = create_night(&server, host).await;

    for _ in 0..2 {
        as_user(server.post(&format!("/api/v1/nights/{}/join", night_id)), guest)
            .await
            .assert_status_ok();
    }
    let response = as_user(server.post(&format!("/api/v1/nights/{}/join", night_id)), host).await;
    let night: Value = response.json();
    assert_eq!(night["attendees"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_complete_with_rating_then_rerate() {
    let server = create_test_server();
    let host = Uuid::new_v4();
    let guest = Uuid::new_v4();
    let (night_id, _) = night_with_candidates(&server, host).await;

    as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host)
        .await
        .assert_status_ok();
    as_user(
        server.post(&format!("/api/v1/nights/{}/spin/commit", night_id)),
        host,
    )
    .await
    .assert_status_ok();

    // out-of-range score leaves the night untouched
    as_user(
        server.post(&format!("/api/v1/nights/{}/complete", night_id)),
        host,
    )
    .json(&json!({ "score": 11 }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    let response = as_user(
        server.post(&format!("/api/v1/nights/{}/complete", night_id)),
        host,
    )
    .json(&json!({ "score": 8, "note": "great pick" }))
    .await;
    response.assert_status_ok();
    let completion: Value = response.json();
    assert_eq!(completion["night"]["status"], "done");
    let entry_id = completion["watched"]["id"].as_str().unwrap().to_string();

    // the pick of a done night is final
    as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host)
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = as_user(
        server.put(&format!("/api/v1/watched/{}/rating", entry_id)),
        guest,
    )
    .json(&json!({ "score": 4 }))
    .await;
    response.assert_status_ok();
    let response = as_user(
        server.put(&format!("/api/v1/watched/{}/rating", entry_id)),
        guest,
    )
    .json(&json!({ "score": 6 }))
    .await;
    let entry: Value = response.json();
    assert_eq!(entry["ratings"].as_object().unwrap().len(), 2);
    assert_eq!(entry["ratings"][guest.to_string()]["score"], 6);

    as_user(
        server.put(&format!("/api/v1/watched/{}/rating", entry_id)),
        guest,
    )
    .json(&json!({ "score": 0 }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    let response = as_user(server.get("/api/v1/nights/calendar"), host).await;
    let calendar: Vec<Value> = response.json();
    assert_eq!(calendar[0]["avg_rating"], 7.0);

    let response = as_user(server.get("/api/v1/watched/recent?limit=1"), host).await;
    let recent: Vec<Value> = response.json();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["average_score"], 7.0);
}

#[tokio::test]
async fn test_complete_rejects_mistyped_score() {
    let server = create_test_server();
    let host = Uuid::new_v4();
    let (night_id, _) = night_with_candidates(&server, host).await;

    as_user(server.post(&format!("/api/v1/nights/{}/spin", night_id)), host)
        .await
        .assert_status_ok();
    as_user(
        server.post(&format!("/api/v1/nights/{}/spin/commit", night_id)),
        host,
    )
    .await
    .assert_status_ok();

    as_user(
        server.post(&format!("/api/v1/nights/{}/complete", night_id)),
        host,
    )
    .json(&json!({ "score": "9", "note": "great" }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    let response = as_user(server.get(&format!("/api/v1/nights/{}", night_id)), host).await;
    let details: Value = response.json();
    assert_eq!(details["status"], "active");

    let response = as_user(server.get("/api/v1/watched/count"), host).await;
    let count: Value = response.json();
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_complete_without_body() {
    let server = create_test_server();
    let host = Uuid::new_v4();
    let night_id = create_night(&server, host).await;

    let response = as_user(
        server.post(&format!("/api/v1/nights/{}/complete", night_id)),
        host,
    )
    .await;
    response.assert_status_ok();
    let completion: Value = response.json();
    assert!(completion["watched"].is_null());

    let response = as_user(server.get("/api/v1/watched/count"), host).await;
    let count: Value = response.json();
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_manual_watched_entry() {
    let server = create_test_server();
    let me = Uuid::new_v4();
    let movie_id = create_movie(&server, me, 13, "Forrest Gump").await;

    let response = as_user(server.post("/api/v1/watched"), me)
        .json(&json!({ "movie_id": movie_id, "watched_at": "2026-09-01T20:00:00Z" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    as_user(server.post("/api/v1/watched"), me)
        .json(&json!({ "movie_id": Uuid::new_v4() }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = as_user(server.get("/api/v1/watched"), me).await;
    let items: Vec<Value> = response.json();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["movie"]["title"], "Forrest Gump");
}
