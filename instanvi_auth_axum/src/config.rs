//! Process-wide gate configuration

use std::sync::LazyLock;

use instanvi_auth::{ConfigError, GateConfig};

/// Gate configuration read from the environment on first use.
///
/// Falls back to the built-in defaults when the environment holds an invalid
/// value; call [`init`] at startup to surface that error instead.
pub static GATE_CONFIG: LazyLock<GateConfig> = LazyLock::new(|| {
    GateConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("Invalid gate configuration, using defaults: {}", e);
        GateConfig::default()
    })
});

/// Validate the gate configuration eagerly and warm [`GATE_CONFIG`].
pub fn init() -> Result<(), ConfigError> {
    let config = GateConfig::from_env()?;
    tracing::info!(
        "Auth gate configured: auth_url={}, development={}",
        config.auth_url,
        config.development
    );
    let _ = &*GATE_CONFIG;
    Ok(())
}
