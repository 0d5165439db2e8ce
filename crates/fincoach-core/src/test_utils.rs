//! Test utilities for fincoach-core
//!
//! This module provides a mock chat-completions server that can be used for
//! development and integration tests of the HTTP backend and the dispatcher's
//! failure boundary.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// How the mock server answers `/v1/chat/completions`
#[derive(Debug, Clone)]
pub enum ChatScenario {
    /// 200 with a single choice containing this text
    Reply(String),
    /// Respond with this HTTP status and an error body
    Status(u16),
    /// 200 with an empty `choices` array
    EmptyChoices,
    /// Sleep before replying
    Slow(Duration, String),
}

#[derive(Clone)]
struct ServerState {
    scenario: ChatScenario,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Mock OpenAI-compatible server for testing and development
pub struct MockChatServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockChatServer {
    /// Start the mock server on an available port
    pub async fn start(scenario: ChatScenario) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            scenario,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            requests,
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Model list endpoint (health check)
async fn handle_models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{ "id": "mock-model", "object": "model" }]
    }))
}

/// Chat completions endpoint
async fn handle_chat(State(state): State<ServerState>, Json(body): Json<Value>) -> Response {
    let model = body["model"].as_str().unwrap_or("mock-model").to_string();
    state.requests.lock().unwrap().push(body);

    match state.scenario {
        ChatScenario::Reply(text) => Json(completion(&model, Some(&text))).into_response(),
        ChatScenario::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(json!({ "error": { "message": "mock failure", "code": code } })),
            )
                .into_response()
        }
        ChatScenario::EmptyChoices => Json(completion(&model, None)).into_response(),
        ChatScenario::Slow(delay, text) => {
            tokio::time::sleep(delay).await;
            Json(completion(&model, Some(&text))).into_response()
        }
    }
}

fn completion(model: &str, text: Option<&str>) -> Value {
    let choices = match text {
        Some(text) => json!([{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]),
        None => json!([]),
    };
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": choices
    })
}
