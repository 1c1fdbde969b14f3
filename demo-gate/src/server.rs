use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub(crate) struct Ports {
    pub(crate) http: u16,
    pub(crate) https: u16,
}

impl Ports {
    pub(crate) fn from_env() -> Self {
        Self {
            http: port_from_env("DEMO_HTTP_PORT", 3001),
            https: port_from_env("DEMO_HTTPS_PORT", 3443),
        }
    }
}

fn port_from_env(name: &str, default: u16) -> u16 {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Certificate and key paths, when both are configured
pub(crate) fn tls_paths() -> Option<(String, String)> {
    let cert = std::env::var("DEMO_TLS_CERT").ok()?;
    let key = std::env::var("DEMO_TLS_KEY").ok()?;
    Some((cert, key))
}

pub(crate) fn spawn_http_server(port: u16, app: Router) -> JoinHandle<()> {
    tokio::spawn(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tracing::info!("HTTP server listening on {}", addr);
        if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
            tracing::error!("HTTP server stopped: {}", e);
        }
    })
}

pub(crate) async fn spawn_https_server(
    port: u16,
    app: Router,
    cert: &str,
    key: &str,
) -> Result<JoinHandle<()>, std::io::Error> {
    let config = RustlsConfig::from_pem_file(cert, key).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTPS server listening on {}", addr);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum_server::bind_rustls(addr, config)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("HTTPS server stopped: {}", e);
        }
    }))
}

pub(crate) fn init_tracing(app_name: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            format!(
                "instanvi_auth_axum=trace,instanvi_auth=trace,tower_http=debug,{}=trace,info",
                app_name
            )
            .into()
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = app_name;
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    #[cfg(debug_assertions)]
    tracing::info!("Debug mode enabled - showing detailed logs by default");
    tracing::info!("You can increase verbosity by setting the RUST_LOG environment variable.");
    tracing::info!("Example: RUST_LOG=debug ./demo-gate");
}
