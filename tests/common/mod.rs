#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use skillerbot::config::AppConfig;
use skillerbot::error::UpstreamError;
use skillerbot::models::CompletionMessage;
use skillerbot::prompts::PromptBuilder;
use skillerbot::server::{build_router, AppState};
use skillerbot::CompletionClient;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// What a [`StubCompletion`] answers with.
#[derive(Clone)]
pub enum StubAnswer {
    Content(Option<String>),
    Transport(String),
    Status(StatusCode, String),
}

/// In-process completion double that records every call.
pub struct StubCompletion {
    answer: StubAnswer,
    calls: AtomicUsize,
    seen: Mutex<Vec<(Vec<CompletionMessage>, String)>>,
}

impl StubCompletion {
    pub fn new(answer: StubAnswer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(content: &str) -> Arc<Self> {
        Self::new(StubAnswer::Content(Some(content.to_string())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn take_requests(&self) -> Vec<(Vec<CompletionMessage>, String)> {
        let mut guard = self.seen.lock().expect("lock stub requests");
        guard.drain(..).collect()
    }
}

#[async_trait]
impl CompletionClient for StubCompletion {
    async fn complete(
        &self,
        messages: &[CompletionMessage],
        model: &str,
    ) -> Result<Option<String>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.seen.lock() {
            guard.push((messages.to_vec(), model.to_string()));
        }
        match &self.answer {
            StubAnswer::Content(c) => Ok(c.clone()),
            StubAnswer::Transport(msg) => Err(UpstreamError::Transport(msg.clone())),
            StubAnswer::Status(status, body) => Err(UpstreamError::from_status(*status, body)),
        }
    }
}

/// The real router bound to an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    fn make_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed building reqwest client")
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
    }

    /// POST raw bytes with an explicit content type.
    pub async fn post_bytes(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header(axum::http::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Config pointing at a dead upstream (port 9 is discard and fails fast).
pub fn test_config() -> AppConfig {
    AppConfig::for_upstream("sk-test", "http://127.0.0.1:9/v1")
}

pub async fn spawn_with_state(state: AppState) -> TestServer {
    let app = build_router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let base_url = format!("http://{}", addr);
    let server = axum::serve(listener, app.into_make_service());

    let join = tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("Test server error: {e:?}");
        }
    });

    TestServer {
        base_url,
        addr,
        join,
        client: TestServer::make_client(),
    }
}

/// Spawn the relay with an in-process completion double.
pub async fn spawn_with_stub(stub: Arc<StubCompletion>) -> TestServer {
    let config = test_config();
    spawn_with_state(AppState::new(&config, stub, PromptBuilder::default())).await
}

// ============================================================================
// Upstream Chat Completions stub
// ============================================================================

/// Canned answer served by [`UpstreamStub`].
#[derive(Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl UpstreamResponse {
    pub fn content(text: &str) -> Self {
        Self::json(serde_json::json!({
            "id": "chatcmpl-stub",
            "object": "chat.completion",
            "created": 0,
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        }))
    }

    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn error(status: StatusCode, body: &str) -> Self {
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

#[derive(Clone)]
struct StubState {
    response: UpstreamResponse,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>,
}

/// Minimal HTTP server standing in for `POST /v1/chat/completions`.
pub struct UpstreamStub {
    base_url: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl UpstreamStub {
    pub async fn start(response: UpstreamResponse) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(StubState {
            response,
            calls: calls.clone(),
            requests: requests.clone(),
        });

        let router = Router::new()
            .route("/v1/chat/completions", post(completions_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream stub");
        let addr = listener.local_addr().expect("upstream stub local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Upstream stub server error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        UpstreamStub {
            base_url: format!("http://{}/v1", addr),
            calls,
            requests,
            shutdown: Some(tx),
        }
    }

    /// Base URL to use as `OPENAI_BASE_URL`.
    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Recorded `(authorization header, json body)` pairs.
    pub fn take_requests(&self) -> Vec<(Option<String>, serde_json::Value)> {
        let mut guard = self.requests.lock().expect("lock upstream requests");
        guard.drain(..).collect()
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn completions_handler(
    State(state): State<Arc<StubState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, [(axum::http::HeaderName, &'static str); 1], String) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Ok(mut guard) = state.requests.lock() {
        guard.push((auth, body));
    }

    let resp = &state.response;
    if !resp.delay.is_zero() {
        tokio::time::sleep(resp.delay).await;
    }
    (
        resp.status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        resp.body.clone(),
    )
}
