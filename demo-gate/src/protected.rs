use axum::{
    Json, Router,
    response::{Html, IntoResponse},
    routing::get,
};
use serde_json::json;

pub(super) fn router() -> Router<()> {
    Router::new()
        .route("/", get(dashboard))
        .route("/reports", get(reports))
        .route("/auth/login", get(login))
        .route("/api/ledger", get(ledger))
        .route("/api/health", get(health))
}

async fn dashboard() -> impl IntoResponse {
    Html(page(
        "Dashboard",
        r#"<p>Signed in.</p><ul><li><a href="/reports">Reports</a></li><li><a href="/api/ledger">Ledger API</a></li></ul>"#,
    ))
}

async fn reports() -> impl IntoResponse {
    Html(page(
        "Reports",
        "<p>Accounts payable, receivable and payroll summaries.</p>",
    ))
}

// Public: the gate lets everything under /auth through
async fn login() -> impl IntoResponse {
    Html(page(
        "Sign in",
        r#"<p>Open a protected page with <code>?token=...</code> or set the <code>auth_token</code> cookie.</p>"#,
    ))
}

async fn ledger() -> impl IntoResponse {
    Json(json!({
        "entries": [
            { "id": 1, "account": "accounts-payable", "amount": 1250 },
            { "id": 2, "account": "payroll", "amount": -840 },
        ]
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><title>{title}</title></head><body><h1>{title}</h1>{body}</body></html>"
    )
}
