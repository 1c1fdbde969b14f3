use axum::{Router, middleware::from_fn};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use instanvi_auth_axum::auth_gate;

mod protected;
mod server;

use crate::server::{Ports, init_tracing, spawn_http_server, spawn_https_server, tls_paths};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install default CryptoProvider for rustls to prevent:
    // "no process-level CryptoProvider available -- call CryptoProvider::install_default() before this point"
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install default CryptoProvider")?;

    dotenvy::dotenv().ok();
    init_tracing("demo_gate");

    // Fail on a broken gate configuration instead of silently using defaults
    instanvi_auth_axum::init()?;

    let app = Router::new()
        .merge(protected::router())
        .layer(from_fn(auth_gate))
        .layer(
            TraceLayer::new_for_http()
                // Headers carry bearer tokens and the auth cookie
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        );

    let ports = Ports::from_env();
    let http_server = spawn_http_server(ports.http, app.clone());

    match tls_paths() {
        Some((cert, key)) => {
            let https_server = spawn_https_server(ports.https, app, &cert, &key).await?;
            tokio::try_join!(http_server, https_server)?;
        }
        None => {
            tracing::info!("DEMO_TLS_CERT/DEMO_TLS_KEY not set, serving HTTP only");
            http_server.await?;
        }
    }

    Ok(())
}
