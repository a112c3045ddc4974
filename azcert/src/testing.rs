//! In-process stand-in for the remote certificate API.
//!
//! Binds an axum router on `127.0.0.1:0` that answers with canned replies per
//! `METHOD /path`, records every request, and can delay responses to exercise
//! client timeouts.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const API_PREFIX: &str = "/api";

#[derive(Clone, Debug)]
pub enum Reply {
    Json(StatusCode, Value),
    Text(StatusCode, String),
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Default)]
struct MockState {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Mutex<Duration>,
}

pub struct MockBackend {
    base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("resolve mock backend address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}{}", addr, API_PREFIX),
            state,
        }
    }

    /// Base URL including the `/api` prefix, ready for `ClientConfig::new`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the reply for `method path`, where `path` is relative to `/api`.
    pub fn reply(&self, method: Method, path: &str, reply: Reply) {
        self.state
            .replies
            .lock()
            .insert(route_key(&method, &format!("{}{}", API_PREFIX, path)), reply);
    }

    pub fn reply_json(&self, method: Method, path: &str, body: Value) {
        self.reply(method, path, Reply::Json(StatusCode::OK, body));
    }

    pub fn reply_status(&self, method: Method, path: &str, status: StatusCode) {
        self.reply(method, path, Reply::Json(status, Value::Null));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = delay;
    }

    /// Requests received for `method path`, oldest first.
    pub fn requests(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        let full_path = format!("{}{}", API_PREFIX, path);
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == full_path)
            .cloned()
            .collect()
    }

    pub fn hits(&self, method: Method, path: &str) -> usize {
        self.requests(method, path).len()
    }

    pub fn total_hits(&self) -> usize {
        self.state.requests.lock().len()
    }
}

fn route_key(method: &Method, path: &str) -> String {
    format!("{} {}", method, path)
}

async fn respond(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    state.requests.lock().push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body,
    });

    let delay = *state.delay.lock();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = state
        .replies
        .lock()
        .get(&route_key(&method, uri.path()))
        .cloned();
    match reply {
        Some(Reply::Json(status, body)) => (status, Json(body)).into_response(),
        Some(Reply::Text(status, text)) => (status, text).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A minimal wire-format record.
pub fn record(id: i64, name: &str, serial: &str) -> Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "s_N": serial,
        "method": 1,
        "startDate": "2024-01-01T00:00:00",
        "endDate": "2099-01-01T00:00:00",
        "location": {"country": "Egypt", "state": "Cairo", "streetAddress": "Nasr City"}
    })
}

/// Wrap records the way the backend does for collections.
pub fn enveloped(records: Vec<Value>) -> Value {
    serde_json::json!({"$id": "1", "$values": records})
}
