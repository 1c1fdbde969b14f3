use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use instanvi_auth::{GateConfig, GateDecision, GateRequest, evaluate};

use super::config::GATE_CONFIG;
use super::response::{apply_headers, into_response};

/// Gate every request using the process-wide [`GATE_CONFIG`].
///
/// Mount with `axum::middleware::from_fn(auth_gate)`.
pub async fn auth_gate(req: Request, next: Next) -> Response {
    run_gate(&GATE_CONFIG, req, next).await
}

/// Gate every request using an explicit configuration.
///
/// Mount with `axum::middleware::from_fn_with_state(Arc::new(config), auth_gate_with_config)`.
pub async fn auth_gate_with_config(
    State(config): State<Arc<GateConfig>>,
    req: Request,
    next: Next,
) -> Response {
    run_gate(&config, req, next).await
}

async fn run_gate(config: &GateConfig, req: Request, next: Next) -> Response {
    let gate_request = GateRequest::from_http(req.method(), req.uri(), req.headers());

    match evaluate(config, &gate_request) {
        GateDecision::Allow { headers } => {
            let response = next.run(req).await;
            apply_headers(response, &headers)
        }
        decision => {
            tracing::debug!("Auth gate stopped {} {}", req.method(), gate_request.path);
            into_response(decision)
        }
    }
}
