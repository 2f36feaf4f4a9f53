//! In-process stub of the dialogue backend for HTTP client tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use lorechat_client::HttpBackend;
use lorechat_test_support::fixtures;
use serde_json::{Value, json};

/// Character whose history request fails with a 500.
pub const BROKEN_HISTORY_ID: i64 = 99;

/// Message text that makes the stub answer without a `reply` field.
pub const SILENT_MESSAGE: &str = "...";

/// Message text that makes the stub answer with a non-JSON body.
pub const GARBLED_MESSAGE: &str = "garble";

/// Message text that makes the stub answer after two seconds.
pub const SLOW_MESSAGE: &str = "take your time";

/// A request the stub received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
struct StubState {
    recorded: Arc<Mutex<Vec<Recorded>>>,
    lore: Arc<Mutex<String>>,
}

impl StubState {
    fn push(&self, recorded: Recorded) {
        self.recorded.lock().unwrap().push(recorded);
    }

    fn record(&self, method: &'static str, path: impl Into<String>, body: Option<Value>) {
        self.push(Recorded {
            method,
            path: path.into(),
            query: HashMap::new(),
            body,
        });
    }
}

/// A running stub server.
pub struct StubServer {
    pub base_url: String,
    state: StubState,
}

impl StubServer {
    /// Requests received so far, in order.
    pub fn recorded(&self) -> Vec<Recorded> {
        self.state.recorded.lock().unwrap().clone()
    }

    /// An `HttpBackend` pointed at this server.
    pub fn backend(&self) -> HttpBackend {
        HttpBackend::new(&self.base_url, Duration::from_secs(5)).unwrap()
    }
}

/// Binds the stub on an ephemeral port and serves it in the background.
pub async fn spawn_stub() -> StubServer {
    let state = StubState::default();
    let app = Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route("/locations/{id}", delete(delete_location))
        .route("/characters", get(list_characters).post(create_character))
        .route("/characters/{id}", delete(delete_character))
        .route("/dialogue", post(send_turn))
        .route("/dialogue/{character_id}", get(dialogue_history))
        .route("/lore", get(get_lore).put(put_lore))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubServer {
        base_url: format!("http://{addr}"),
        state,
    }
}

/// A base URL nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn list_locations(State(state): State<StubState>) -> Json<Value> {
    state.record("GET", "/locations", None);
    Json(json!(fixtures::locations()))
}

async fn list_characters(State(state): State<StubState>) -> Json<Value> {
    state.record("GET", "/characters", None);
    // Optional columns come back as null from the real backend.
    Json(json!([
        {
            "id": 5, "name": "Bram", "age": 52, "sex": "male",
            "traits": ["gruff"], "attitude": "friendly", "location_id": 1
        },
        {
            "id": 6, "name": "Ilsa", "age": null, "sex": null,
            "traits": null, "attitude": null, "location_id": 1
        }
    ]))
}

async fn dialogue_history(
    State(state): State<StubState>,
    Path(character_id): Path<i64>,
) -> Response {
    state.record("GET", format!("/dialogue/{character_id}"), None);
    if character_id == BROKEN_HISTORY_ID {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "database is locked"})),
        )
            .into_response();
    }
    Json(json!([
        {"role": "user", "message": "Any rooms?", "timestamp": "2026-01-15T10:00:00"},
        {"role": "assistant", "message": "One left.", "timestamp": "2026-01-15T10:00:05"}
    ]))
    .into_response()
}

async fn send_turn(
    State(state): State<StubState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.push(Recorded {
        method: "POST",
        path: "/dialogue".to_owned(),
        query: query.clone(),
        body: None,
    });
    let message = query.get("message").cloned().unwrap_or_default();
    match message.as_str() {
        SILENT_MESSAGE => Json(json!({})).into_response(),
        GARBLED_MESSAGE => (StatusCode::OK, "<html>oops</html>").into_response(),
        SLOW_MESSAGE => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"reply": "Finally."})).into_response()
        }
        _ if query.get("character_id").map(String::as_str) == Some("404") => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Character or location not found"})),
        )
            .into_response(),
        _ => Json(json!({"reply": format!("You said: {message}")})).into_response(),
    }
}

async fn get_lore(State(state): State<StubState>) -> Json<Value> {
    state.record("GET", "/lore", None);
    let content = state.lore.lock().unwrap().clone();
    Json(json!({"content": content}))
}

async fn put_lore(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("PUT", "/lore", Some(body.clone()));
    let content = body["content"].as_str().unwrap_or_default().to_owned();
    *state.lore.lock().unwrap() = content.clone();
    Json(json!({"content": content}))
}

async fn create_location(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("POST", "/locations", Some(body.clone()));
    let mut created = body;
    created["id"] = json!(10);
    Json(created)
}

async fn delete_location(State(state): State<StubState>, Path(id): Path<i64>) -> Response {
    state.record("DELETE", format!("/locations/{id}"), None);
    if id == 1 {
        Json(json!({"detail": "Location deleted successfully"})).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Location not found"})),
        )
            .into_response()
    }
}

async fn create_character(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("POST", "/characters", Some(body.clone()));
    let mut created = body;
    created["id"] = json!(11);
    Json(created)
}

async fn delete_character(State(state): State<StubState>, Path(id): Path<i64>) -> Json<Value> {
    state.record("DELETE", format!("/characters/{id}"), None);
    Json(json!({"detail": "Character deleted successfully"}))
}
