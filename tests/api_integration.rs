//! End-to-end tests for the HTTP API.
//!
//! Each test drives the real router with `tower::ServiceExt::oneshot`
//! against the in-memory store. Enrichment goes to a small axum stub bound
//! to an ephemeral local port.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::Query;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use music_library::api::docs::{OPENAPI_PATH, SWAGGER_UI_PATH};
use music_library::api::mock_info::{DEMO_LINK, DEMO_RELEASE_DATE};
use music_library::api::{AppState, SERVER_ERROR_MESSAGE, router};
use music_library::enrichment::SongInfoPayload;
use music_library::observability::REQUEST_ID_HEADER;
use music_library::{HttpSongInfoClient, MemorySongStore, RetryPolicy, SongLibrary};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const STUB_TEXT: &str = "A\nB\n\nC\nD\n\nE";

// ============================================================================
// Helpers
// ============================================================================

/// Metadata stub: 400 for group "unknown", 500 for group "broken", the
/// received request id as the link for group "echo", a fixed payload
/// otherwise.
async fn stub_info(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("group").map(String::as_str) {
        Some("unknown") => StatusCode::BAD_REQUEST.into_response(),
        Some("broken") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some("echo") => axum::Json(SongInfoPayload {
            release_date: None,
            text: None,
            link: headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
        .into_response(),
        _ => axum::Json(SongInfoPayload {
            release_date: Some("16.07.2006".to_string()),
            text: Some(STUB_TEXT.to_string()),
            link: Some("https://example.com/song".to_string()),
        })
        .into_response(),
    }
}

async fn spawn_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let app = Router::new().route("/info", get(stub_info));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{addr}/info")
}

async fn test_app() -> Router {
    let endpoint = spawn_upstream().await;
    let client = HttpSongInfoClient::new(endpoint, RetryPolicy::new(3, Duration::from_secs(2)))
        .expect("client");
    let library = SongLibrary::new(Arc::new(MemorySongStore::new()), Arc::new(client));
    router(AppState::new(library), false)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn get_req(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete_req(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

fn json_req(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create(app: &Router, group: &str, song: &str) -> (StatusCode, Value) {
    send(
        app,
        json_req("POST", "/songs", &json!({ "group": group, "song": song })),
    )
    .await
}

fn message(body: &Value) -> &str {
    body["message"].as_str().expect("message field")
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_song_enriches_and_normalizes() {
    let app = test_app().await;

    let (status, body) = create(&app, "Muse", "Supermassive Black Hole").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        message(&body),
        "Song successfully added. Group: muse, song: supermassive black hole"
    );

    let (status, body) = send(&app, get_req("/songs?offset=0&limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    let songs = body["songs"].as_array().expect("songs array");
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0]["group"], "muse");
    assert_eq!(songs[0]["releaseDate"], "16.07.2006");
    assert_eq!(songs[0]["text"], json!(["A\nB", "C\nD", "E"]));
    assert_eq!(songs[0]["link"], "https://example.com/song");
}

#[tokio::test]
async fn test_create_duplicate_is_rejected() {
    let app = test_app().await;

    let (status, _) = create(&app, "Muse", "Uprising").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create(&app, "  MUSE ", "uprising").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("existing song"));
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = test_app().await;

    let (status, body) = create(&app, "", "Uprising").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("group and song value must be not empty"));

    let request = Request::post("/songs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).starts_with("You provided incorrect JSON"));
}

#[tokio::test]
async fn test_create_maps_upstream_answers() {
    let app = test_app().await;

    let (status, body) = create(&app, "unknown", "Song").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).starts_with("Song does not exist"));

    let (status, body) = create(&app, "broken", "Song").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message(&body), SERVER_ERROR_MESSAGE);

    // Nothing was stored for either failure.
    let (_, body) = send(&app, get_req("/songs?offset=0&limit=10")).await;
    assert_eq!(body["songs"], json!([]));
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_list_filters_and_pages() {
    let app = test_app().await;
    for (group, song) in [("Muse", "Uprising"), ("Muse", "Starlight"), ("Queen", "Bicycle")] {
        let (status, _) = create(&app, group, song).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get_req("/songs?offset=0&limit=10&group=MUSE")).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["songs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["song"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["starlight", "uprising"]);

    let (_, body) = send(&app, get_req("/songs?offset=1&limit=1")).await;
    assert_eq!(body["songs"].as_array().unwrap().len(), 1);
    assert_eq!(body["songs"][0]["song"], "uprising");

    let (_, body) = send(&app, get_req("/songs?offset=0&limit=10&text=C%0AD")).await;
    assert_eq!(body["songs"].as_array().unwrap().len(), 3);

    // Verses are joined without a separator before matching.
    let (_, body) = send(&app, get_req("/songs?offset=0&limit=10&text=BC")).await;
    assert_eq!(body["songs"].as_array().unwrap().len(), 3);
    let (_, body) = send(&app, get_req("/songs?offset=0&limit=10&text=B%0A%0AC")).await;
    assert_eq!(body["songs"], json!([]));

    let (status, body) = send(&app, get_req("/songs?offset=0&limit=10&group=nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["songs"], json!([]));
}

#[tokio::test]
async fn test_list_requires_valid_pagination() {
    let app = test_app().await;

    for uri in [
        "/songs",
        "/songs?offset=0",
        "/songs?offset=abc&limit=1",
        "/songs?offset=0&limit=-1",
    ] {
        let (status, body) = send(&app, get_req(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(
            message(&body).starts_with("URL has incorrect parameters"),
            "{uri}"
        );
    }
}

// ============================================================================
// Text
// ============================================================================

#[tokio::test]
async fn test_song_text_pages_verses() {
    let app = test_app().await;
    create(&app, "Muse", "Uprising").await;

    let (status, body) = send(
        &app,
        get_req("/songs/text?group=Muse&song=Uprising&offset=1&limit=1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verses"], json!(["C\nD"]));

    let (_, body) = send(
        &app,
        get_req("/songs/text?group=muse&song=uprising&offset=0&limit=10"),
    )
    .await;
    assert_eq!(body["verses"], json!(["A\nB", "C\nD", "E"]));

    let (status, body) = send(
        &app,
        get_req("/songs/text?group=muse&song=uprising&offset=10&limit=2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verses"], json!([]));
}

#[tokio::test]
async fn test_song_text_missing_song() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        get_req("/songs/text?group=a&song=b&offset=0&limit=1"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("does not exist"));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_missing_song_is_not_found() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        json_req(
            "PUT",
            "/songs?group=nobody&song=nothing",
            &json!({ "group": "a", "song": "b" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(message(&body).contains("update a song that does not exist"));
}

#[tokio::test]
async fn test_update_renames_and_replaces_text() {
    let app = test_app().await;
    create(&app, "Muse", "Uprising").await;

    let (status, body) = send(
        &app,
        json_req(
            "PUT",
            "/songs?group=muse&song=uprising",
            &json!({ "group": "Muse", "song": "Resistance", "text": "X\n\nY" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        message(&body),
        "Song successfully updated. Group: muse, song: resistance"
    );

    let (_, body) = send(
        &app,
        get_req("/songs/text?group=muse&song=resistance&offset=0&limit=5"),
    )
    .await;
    assert_eq!(body["verses"], json!(["X", "Y"]));

    let (status, _) = send(
        &app,
        get_req("/songs/text?group=muse&song=uprising&offset=0&limit=5"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_without_text_keeps_verses() {
    let app = test_app().await;
    create(&app, "Muse", "Uprising").await;

    let (status, _) = send(
        &app,
        json_req(
            "PUT",
            "/songs?group=muse&song=uprising",
            &json!({ "group": "muse", "song": "uprising live" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        get_req("/songs/text?group=muse&song=uprising%20live&offset=0&limit=5"),
    )
    .await;
    assert_eq!(body["verses"], json!(["A\nB", "C\nD", "E"]));
}

#[tokio::test]
async fn test_update_onto_existing_song_is_rejected() {
    let app = test_app().await;
    create(&app, "Muse", "Uprising").await;
    create(&app, "Muse", "Starlight").await;

    let (status, body) = send(
        &app,
        json_req(
            "PUT",
            "/songs?group=muse&song=uprising",
            &json!({ "group": "muse", "song": "starlight" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("already uses this name"));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_song() {
    let app = test_app().await;
    create(&app, "Muse", "Uprising").await;

    let (status, body) = send(&app, delete_req("/songs?group=MUSE&song=Uprising")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        message(&body),
        "Song successfully deleted. Group: muse, song: uprising"
    );

    let (status, body) = send(&app, delete_req("/songs?group=muse&song=uprising")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("delete a song that does not exist"));

    let (status, _) = send(&app, delete_req("/songs?group=muse")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Middleware and demo source
// ============================================================================

#[tokio::test]
async fn test_request_id_and_headers() {
    let app = test_app().await;

    let request = Request::get("/songs?offset=0&limit=1")
        .header(REQUEST_ID_HEADER, "trace-me-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-me-123");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let response = app.clone().oneshot(get_req("/songs?offset=0&limit=1")).await.unwrap();
    let generated = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(!generated.is_empty());
}

#[tokio::test]
async fn test_request_id_reaches_metadata_source() {
    let app = test_app().await;

    let request = Request::post("/songs")
        .header(header::CONTENT_TYPE, "application/json")
        .header(REQUEST_ID_HEADER, "create-echo-7")
        .body(Body::from(json!({ "group": "echo", "song": "id" }).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get_req("/songs?offset=0&limit=10&group=echo")).await;
    assert_eq!(body["songs"][0]["link"], "create-echo-7");
}

#[tokio::test]
async fn test_demo_info_route() {
    let library = SongLibrary::new(
        Arc::new(MemorySongStore::new()),
        Arc::new(music_library::enrichment::NoopSongInfo),
    );

    let without = router(AppState::new(library.clone()), false);
    let (status, _) = send(&without, get_req("/info?group=a&song=b")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let with = router(AppState::new(library), true);
    let (status, body) = send(&with, get_req("/info?group=a&song=b")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["releaseDate"], DEMO_RELEASE_DATE);
    assert_eq!(body["link"], DEMO_LINK);
    assert!(body["text"].as_str().unwrap().contains("\n\n"));

    let (status, _) = send(&with, get_req("/info?group=a")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app().await;

    let (status, doc) = send(&app, get_req(OPENAPI_PATH)).await;
    assert_eq!(status, StatusCode::OK);
    for method in ["get", "post", "put", "delete"] {
        assert!(doc["paths"]["/songs"][method].is_object(), "{method} /songs");
    }
    assert!(doc["paths"]["/songs/text"]["get"].is_object());

    let response = app
        .clone()
        .oneshot(get_req(&format!("{SWAGGER_UI_PATH}/")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
