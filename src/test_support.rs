// src/test_support.rs
//
// In-process stand-in for the n8n webhooks, bound to 127.0.0.1:0.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::webhook_client::{WebhookClient, WebhookConfig};

pub const STUB_PREFIX: &str = "/webhook/";

#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl StubReply {
    pub fn json(value: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: value.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request as the stub saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<RecordedCall>>>);

impl Recorder {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }
}

#[derive(Clone)]
struct StubState {
    replies: Arc<HashMap<String, StubReply>>,
    recorder: Recorder,
}

async fn stub_handler(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(STUB_PREFIX)
        .unwrap_or(uri.path())
        .to_string();
    let parsed = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    state.recorder.0.lock().unwrap().push(RecordedCall {
        method,
        path: path.clone(),
        body: parsed,
    });

    match state.replies.get(&path) {
        Some(reply) => {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            (reply.status, reply.body.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "no stub for this webhook").into_response(),
    }
}

/// Starts the stub and returns its base URL (`http://127.0.0.1:<port>/webhook`).
pub async fn spawn_stub(replies: Vec<(&str, StubReply)>) -> (String, Recorder) {
    let recorder = Recorder::default();
    let state = StubState {
        replies: Arc::new(
            replies
                .into_iter()
                .map(|(path, reply)| (path.to_string(), reply))
                .collect(),
        ),
        recorder: recorder.clone(),
    };
    let app = Router::new().fallback(stub_handler).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/webhook", addr), recorder)
}

/// A base URL nothing is listening on.
pub async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/webhook", addr)
}

pub fn client_for(base_url: &str, timeout: Duration) -> WebhookClient {
    WebhookClient::new(WebhookConfig {
        base_url: base_url.to_string(),
        timeout,
    })
    .unwrap()
}
