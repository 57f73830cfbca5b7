#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use uuid::Uuid;

use warfare_counselor::auth::issue_token;
use warfare_counselor::billing::{
    CheckoutProvider, CheckoutRequest, CheckoutSession, CompletedCheckout,
};
use warfare_counselor::config::AppConfig;
use warfare_counselor::database::Database;
use warfare_counselor::error::{CounselorError, CounselorResult};
use warfare_counselor::llm::{CompletionProvider, CompletionRequest};
use warfare_counselor::{build_router, AppState};

/// Setup an in-memory SQLite database for testing
pub async fn setup_test_db() -> Database {
    Database::new_in_memory().await.expect("Failed to create test database")
}

/// Configuration with the secrets filled in and the default 3/60s limit
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.openai.api_key = "sk-test".to_string();
    config.stripe.price_id = "price_default".to_string();
    config.stripe.success_url = "https://app.test/success".to_string();
    config.stripe.cancel_url = "https://app.test/cancel".to_string();
    config
}

/// Same as [`test_config`] with the rate limit out of the way
pub fn unlimited_config() -> AppConfig {
    let mut config = test_config();
    config.rate_limit.max_requests = 1000;
    config
}

/// Completion provider that replays canned replies and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fail: bool,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// System prompt of the most recent request
    pub fn last_system_prompt(&self) -> String {
        self.requests()
            .last()
            .and_then(|r| r.messages.first().map(|m| m.content.clone()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn provider_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> CounselorResult<String> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(CounselorError::LlmError("scripted failure".to_string()));
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "Stand firm.".to_string()))
    }
}

/// Checkout provider returning a fixed session
pub struct FakeCheckout {
    pub completed: CompletedCheckout,
    pub created: Mutex<Vec<CheckoutRequest>>,
}

impl FakeCheckout {
    pub fn paid_for(user_id: &str) -> Self {
        Self {
            completed: CompletedCheckout {
                session_id: "cs_test_1".to_string(),
                paid: true,
                user_id: Some(user_id.to_string()),
                customer_id: Some("cus_123".to_string()),
                customer_email: None,
            },
            created: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CheckoutProvider for FakeCheckout {
    async fn create_session(&self, request: CheckoutRequest) -> CounselorResult<CheckoutSession> {
        self.created.lock().unwrap().push(request);
        Ok(CheckoutSession {
            session_id: "cs_test_1".to_string(),
            url: Some("https://checkout.test/cs_test_1".to_string()),
        })
    }

    async fn retrieve_session(&self, _session_id: &str) -> CounselorResult<CompletedCheckout> {
        Ok(self.completed.clone())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub llm: Arc<ScriptedProvider>,
}

pub async fn spawn_app(config: AppConfig, llm: ScriptedProvider) -> TestApp {
    spawn_app_with_checkout(config, llm, None).await
}

pub async fn spawn_app_with_checkout(
    config: AppConfig,
    llm: ScriptedProvider,
    checkout: Option<Arc<dyn CheckoutProvider>>,
) -> TestApp {
    let database = setup_test_db().await;
    let llm = Arc::new(llm);
    let state = AppState::new(config, database, llm.clone(), checkout);
    TestApp {
        router: build_router(state.clone()),
        state,
        llm,
    }
}

/// Fresh user id plus a signed access token for it
pub fn new_user(config: &AppConfig) -> (String, String) {
    let user_id = Uuid::new_v4().to_string();
    let token = issue_token(
        &config.auth,
        &user_id,
        Some(&format!("{}@example.com", &user_id[..8])),
        chrono::Duration::hours(1),
    )
    .expect("Failed to mint token");
    (user_id, token)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> TestResponse {
    send_from(router, method, uri, token, body, "203.0.113.7:40000", Some("203.0.113.7")).await
}

/// Send as if from socket peer `peer`, optionally claiming `forwarded_for`.
pub async fn send_from(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
    peer: &str,
    forwarded_for: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(forwarded_for) = forwarded_for {
        builder = builder.header("x-forwarded-for", forwarded_for);
    }
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let mut request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    request
        .extensions_mut()
        .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
