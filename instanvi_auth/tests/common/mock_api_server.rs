//! In-process mock of the back-office API and its token refresh endpoint
//!
//! Each test starts its own server on an ephemeral port, so tests do not
//! share state and can run in parallel.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use url::Url;

pub const INITIAL_ACCESS_TOKEN: &str = "access-token-0001";
pub const INITIAL_REFRESH_TOKEN: &str = "refresh-token-0001";
pub const ROTATED_ACCESS_TOKEN: &str = "access-token-0002";
pub const ROTATED_REFRESH_TOKEN: &str = "refresh-token-0002";

/// How the refresh endpoint answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Succeed,
    Reject,
    Hang,
}

#[derive(Debug)]
struct Inner {
    valid_access: String,
    refresh_mode: RefreshMode,
    refresh_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct MockApi {
    pub base_url: Url,
    refresh_calls: Arc<AtomicUsize>,
    ledger_calls: Arc<AtomicUsize>,
    inner: Arc<Mutex<Inner>>,
}

impl MockApi {
    pub async fn start(refresh_mode: RefreshMode) -> Self {
        let api = MockApi {
            base_url: Url::parse("http://127.0.0.1").unwrap(),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            ledger_calls: Arc::new(AtomicUsize::new(0)),
            inner: Arc::new(Mutex::new(Inner {
                valid_access: INITIAL_ACCESS_TOKEN.to_string(),
                refresh_mode,
                refresh_delay: Duration::ZERO,
            })),
        };

        let app = Router::new()
            .route("/ledger", get(ledger).post(create_entry))
            .route("/ledger/{id}", delete(delete_entry))
            .route("/reports/missing", get(missing))
            .route("/auth/refresh_token/", post(refresh_token))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockApi {
            base_url: Url::parse(&format!("http://{addr}/")).unwrap(),
            ..api
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn ledger_calls(&self) -> usize {
        self.ledger_calls.load(Ordering::SeqCst)
    }

    /// Invalidate every access token the client may hold
    pub fn expire_access_tokens(&self) {
        self.inner.lock().unwrap().valid_access = "expired-everything".to_string();
    }

    /// Delay successful refresh answers, to widen the window for concurrent 401s
    pub fn set_refresh_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().refresh_delay = delay;
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.inner.lock().unwrap().valid_access);
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

async fn ledger(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    api.ledger_calls.fetch_add(1, Ordering::SeqCst);
    if !api.is_authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "entries": [{ "id": 1, "amount": 1250 }] })).into_response()
}

async fn create_entry(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api.is_authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(json!({ "created": body }))).into_response()
}

async fn delete_entry(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    if !api.is_authorized(&headers) {
        return unauthorized();
    }
    StatusCode::OK.into_response()
}

async fn missing() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
}

async fn refresh_token(State(api): State<MockApi>, Json(body): Json<Value>) -> Response {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let (mode, delay) = {
        let inner = api.inner.lock().unwrap();
        (inner.refresh_mode, inner.refresh_delay)
    };

    match mode {
        RefreshMode::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            unauthorized()
        }
        RefreshMode::Reject => unauthorized(),
        RefreshMode::Succeed => {
            if body["refresh_token"] != INITIAL_REFRESH_TOKEN {
                return unauthorized();
            }
            tokio::time::sleep(delay).await;
            api.inner.lock().unwrap().valid_access = ROTATED_ACCESS_TOKEN.to_string();
            Json(json!({
                "access_token": ROTATED_ACCESS_TOKEN,
                "refresh_token": ROTATED_REFRESH_TOKEN,
            }))
            .into_response()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Given token not valid for any token type" })),
    )
        .into_response()
}
