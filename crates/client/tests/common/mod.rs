#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use miimine_client::api::MiningApi;
use miimine_client::controller::JobController;
use miimine_client::prompt::UserPrompt;
use miimine_core::identity::{IdentityResolver, MemoryCookieStore, SessionHistory};
use miimine_core::submission::{MiiSource, MiiSubmission};

pub const ID0: &str = "0123456789abcdef0123456789abcdef";

/// Canned HTTP reply from the mock service.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn success(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "result": "success", "message": "", "data": data }).to_string(),
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "result": "error", "message": message, "data": null }).to_string(),
        }
    }

    /// A body that is not JSON, like a proxy error page.
    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn status(status: &str) -> Self {
        Self::success(json!({ "status": status }))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

/// One multipart submission as the service received it.
#[derive(Debug, Clone, Default)]
pub struct ReceivedSubmission {
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub mii: Vec<u8>,
}

/// Scripted behaviour and call log of the mock service.
#[derive(Debug, Default)]
pub struct MockState {
    /// Status replies per id0. The front is popped on each call until one
    /// reply is left, which then repeats.
    pub statuses: HashMap<String, VecDeque<Reply>>,
    pub status_calls: HashMap<String, usize>,
    /// `None` accepts every submission under its own id0.
    pub submit_reply: Option<Reply>,
    pub submissions: Vec<ReceivedSubmission>,
    pub cancel_reply: Option<Reply>,
    pub cancel_calls: Vec<String>,
    pub reset_reply: Option<Reply>,
    pub reset_calls: Vec<String>,
    pub jobs_reply: Option<Reply>,
    pub list_jobs_calls: usize,
    pub miners_reply: Option<Reply>,
    pub friendbots_reply: Option<Reply>,
    pub stats_reply: Option<Reply>,
    /// Body served at `/files/mii.bin`; `None` answers 404.
    pub mii_download: Option<Vec<u8>>,
}

impl MockState {
    pub fn script_status(&mut self, id0: &str, replies: impl IntoIterator<Item = Reply>) {
        self.statuses
            .insert(id0.to_string(), replies.into_iter().collect());
    }
}

type Shared = Arc<Mutex<MockState>>;

/// A running mock service bound to an ephemeral port.
pub struct MockService {
    pub base_url: String,
    pub state: Shared,
}

impl MockService {
    pub fn api(&self) -> MiningApi {
        MiningApi::new(self.base_url.clone())
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn status_calls(&self, id0: &str) -> usize {
        self.state().status_calls.get(id0).copied().unwrap_or(0)
    }
}

/// Start the mock service with the given script.
pub async fn spawn_service(state: MockState) -> MockService {
    let state: Shared = Arc::new(Mutex::new(state));
    let app = build_mock_app(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockService {
        base_url: format!("http://{addr}"),
        state,
    }
}

pub fn build_mock_app(state: Shared) -> Router {
    Router::new()
        .route("/api/submit_mii_job", post(submit_job))
        .route("/api/check_job_status/{id0}", get(check_job_status))
        .route("/api/cancel_job/{key}", get(cancel_job))
        .route("/api/admin/reset_job/{key}", get(reset_job))
        .route("/api/admin/list_jobs", get(list_jobs))
        .route("/api/admin/list_miners", get(list_miners))
        .route("/api/admin/list_friendbots", get(list_friendbots))
        .route("/api/check_network_stats", get(network_stats))
        .route("/files/mii.bin", get(download_mii))
        .with_state(state)
}

async fn submit_job(State(state): State<Shared>, mut multipart: Multipart) -> Reply {
    let mut received = ReceivedSubmission::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name() {
            received.file_name = Some(file_name.to_string());
            received.mii = field.bytes().await.unwrap().to_vec();
        } else {
            received.fields.insert(name, field.text().await.unwrap());
        }
    }

    let id0 = received.fields.get("id0").cloned().unwrap_or_default();
    let mut state = state.lock().unwrap();
    state.submissions.push(received);
    state
        .submit_reply
        .clone()
        .unwrap_or_else(|| Reply::success(json!({ "id0": id0 })))
}

async fn check_job_status(State(state): State<Shared>, Path(id0): Path<String>) -> Reply {
    let mut state = state.lock().unwrap();
    *state.status_calls.entry(id0.clone()).or_default() += 1;
    match state.statuses.get_mut(&id0) {
        Some(replies) if replies.len() > 1 => replies.pop_front().unwrap(),
        Some(replies) if !replies.is_empty() => replies[0].clone(),
        _ => Reply::error(StatusCode::NOT_FOUND, "Job not found"),
    }
}

async fn cancel_job(State(state): State<Shared>, Path(key): Path<String>) -> Reply {
    let mut state = state.lock().unwrap();
    state.cancel_calls.push(key);
    state
        .cancel_reply
        .clone()
        .unwrap_or_else(|| Reply::success(Value::Null))
}

async fn reset_job(State(state): State<Shared>, Path(key): Path<String>) -> Reply {
    let mut state = state.lock().unwrap();
    state.reset_calls.push(key);
    state
        .reset_reply
        .clone()
        .unwrap_or_else(|| Reply::success(Value::Null))
}

async fn list_jobs(State(state): State<Shared>) -> Reply {
    let mut state = state.lock().unwrap();
    state.list_jobs_calls += 1;
    state
        .jobs_reply
        .clone()
        .unwrap_or_else(|| Reply::success(json!({ "jobs": [], "queue": [] })))
}

async fn list_miners(State(state): State<Shared>) -> Reply {
    let state = state.lock().unwrap();
    state
        .miners_reply
        .clone()
        .unwrap_or_else(|| Reply::success(json!({ "miners": [] })))
}

async fn list_friendbots(State(state): State<Shared>) -> Reply {
    let state = state.lock().unwrap();
    state
        .friendbots_reply
        .clone()
        .unwrap_or_else(|| Reply::success(json!({ "friendbots": [] })))
}

async fn network_stats(State(state): State<Shared>) -> Reply {
    let state = state.lock().unwrap();
    state.stats_reply.clone().unwrap_or_else(|| {
        Reply::success(json!({ "waiting": 0, "working": 0, "miners": 0, "totalMined": 0 }))
    })
}

async fn download_mii(State(state): State<Shared>) -> Response {
    let state = state.lock().unwrap();
    match &state.mii_download {
        Some(bytes) => (StatusCode::OK, bytes.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// ---- prompt and controller helpers ----

/// Prompt that records every alert and confirm, answering confirms from
/// a script (then `false`).
#[derive(Debug, Default)]
pub struct RecordingPrompt {
    alerts: Mutex<Vec<String>>,
    confirms: Mutex<Vec<String>>,
    answers: Mutex<VecDeque<bool>>,
}

impl RecordingPrompt {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.confirms.lock().unwrap().clone()
    }
}

impl UserPrompt for RecordingPrompt {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirms.lock().unwrap().push(message.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

pub type TestController<'a> = JobController<MemoryCookieStore, SessionHistory, &'a RecordingPrompt>;

/// Controller against `service`, starting at `location` with empty cookies.
pub fn controller<'a>(
    service: &MockService,
    prompt: &'a RecordingPrompt,
    location: &str,
    poll_interval: Duration,
) -> TestController<'a> {
    let identity = IdentityResolver::new(MemoryCookieStore::new(), SessionHistory::new(location));
    JobController::new(service.api(), identity, prompt, poll_interval)
}

pub fn file_submission(id0: &str) -> MiiSubmission {
    MiiSubmission {
        id0: id0.to_string(),
        model: "new".to_string(),
        year: Some("2015".to_string()),
        source: MiiSource::File {
            file_name: "friend.bin".to_string(),
            bytes: vec![0x4d; 112],
        },
    }
}
