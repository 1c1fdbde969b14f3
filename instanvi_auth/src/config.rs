//! Configuration for the gate and the API client
//!
//! Both configs can be built from the process environment or from any lookup
//! function, so tests can feed values without touching `std::env`.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Base URL of the external auth service used as the redirect target
pub const DEFAULT_AUTH_URL: &str = "https://instanvi-auth.vercel.app";

/// Token injected by the gate when running in development without credentials
pub const DEFAULT_DEV_TOKEN: &str = "dev-token";

/// Cookie carrying the bearer token between the browser and the gate
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// Rolling lifetime of the auth cookie, in seconds (7 days)
pub const AUTH_COOKIE_MAX_AGE: i64 = 7 * 24 * 60 * 60;

const DEFAULT_INTERNAL_PREFIXES: &[&str] = &["/_next/", "/favicon.ico", "/robots.txt", "/public/"];

const DEFAULT_STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "map", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "woff",
    "woff2", "ttf", "otf", "eot",
];

const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/auth",
    "/login",
    "/register",
    "/forgot-password",
    "/reset-password",
    "/api/public",
    "/static",
    "/images",
    "/assets",
    "/vendor-portal/kyc",
    "/vendor-portal/onboarding",
];

const DEFAULT_PUBLIC_API_ROUTES: &[&str] = &["/api/auth", "/api/health", "/api/webhooks"];

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "https://app.instanvi.com",
    "https://instanvi-auth.vercel.app",
];

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid URL in {name}: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Settings that drive the edge authentication gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// External auth service that unauthenticated page requests are sent to
    pub auth_url: Url,
    /// `NODE_ENV=development`: enables the dev-token bypass and diagnostics
    pub development: bool,
    /// Token written into the cookie by the development bypass
    pub dev_token: String,
    /// Path prefixes that never require authentication
    pub public_paths: Vec<String>,
    /// API route prefixes that never require authentication
    pub public_api_routes: Vec<String>,
    /// Framework and build internals, passed through untouched
    pub internal_prefixes: Vec<String>,
    /// File extensions (without the dot) treated as static assets
    pub static_extensions: Vec<String>,
    /// Origins whose CORS requests get credentials echoed back
    pub cors_allowed_origins: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            development: false,
            dev_token: DEFAULT_DEV_TOKEN.to_string(),
            public_paths: to_owned_list(DEFAULT_PUBLIC_PATHS),
            public_api_routes: to_owned_list(DEFAULT_PUBLIC_API_ROUTES),
            internal_prefixes: to_owned_list(DEFAULT_INTERNAL_PREFIXES),
            static_extensions: to_owned_list(DEFAULT_STATIC_EXTENSIONS),
            cors_allowed_origins: to_owned_list(DEFAULT_CORS_ORIGINS),
        }
    }
}

impl GateConfig {
    /// Load the gate configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the gate configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = non_empty(lookup("NEXT_PUBLIC_AUTH_URL")) {
            config.auth_url = parse_url("NEXT_PUBLIC_AUTH_URL", &raw)?;
        }

        config.development = lookup("NODE_ENV")
            .map(|v| v.trim().eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        if let Some(token) = non_empty(lookup("NEXT_PUBLIC_DEV_TOKEN")) {
            config.dev_token = token;
        }
        if let Some(raw) = lookup("AUTH_GATE_PUBLIC_PATHS") {
            config.public_paths = split_list(&raw);
        }
        if let Some(raw) = lookup("AUTH_GATE_PUBLIC_API_ROUTES") {
            config.public_api_routes = split_list(&raw);
        }
        if let Some(raw) = lookup("AUTH_GATE_CORS_ORIGINS") {
            config.cors_allowed_origins = split_list(&raw);
        }

        Ok(config)
    }

    pub fn is_cors_allowed(&self, origin: &str) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == origin)
    }
}

/// Settings for the credential-refreshing API client
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every relative API path is joined onto
    pub base_url: Url,
    /// Secret the envelope key is derived from
    pub secret: String,
    /// Retired secrets still accepted when opening envelopes
    pub previous_secrets: Vec<String>,
    pub request_timeout: Duration,
    /// Upper bound for the refresh call; exceeding it counts as refresh failure
    pub refresh_timeout: Duration,
    /// Retry the triggering call once after a successful refresh
    pub retry_after_refresh: bool,
    /// Collapse concurrent refreshes of the same refresh token into one call
    pub single_flight_refresh: bool,
}

// Keep secrets out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("secret", &"<redacted>")
            .field("previous_secrets", &self.previous_secrets.len())
            .field("request_timeout", &self.request_timeout)
            .field("refresh_timeout", &self.refresh_timeout)
            .field("retry_after_refresh", &self.retry_after_refresh)
            .field("single_flight_refresh", &self.single_flight_refresh)
            .finish()
    }
}

impl ClientConfig {
    /// Client configuration with default timeouts and policies
    pub fn new(base_url: Url, secret: impl Into<String>) -> Self {
        Self {
            base_url,
            secret: secret.into(),
            previous_secrets: Vec::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            refresh_timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
            retry_after_refresh: false,
            single_flight_refresh: true,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = non_empty(lookup("API_BASE_URL")).ok_or(ConfigError::Missing("API_BASE_URL"))?;
        let base_url = parse_url("API_BASE_URL", &base_url)?;

        let secret =
            non_empty(lookup("CREDENTIAL_SECRET")).ok_or(ConfigError::Missing("CREDENTIAL_SECRET"))?;

        let mut config = Self::new(base_url, secret);

        if let Some(raw) = lookup("CREDENTIAL_SECRET_PREVIOUS") {
            config.previous_secrets = split_list(&raw);
        }
        if let Some(raw) = lookup("API_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("API_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("API_REFRESH_TIMEOUT_SECS") {
            config.refresh_timeout = parse_secs("API_REFRESH_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("API_RETRY_AFTER_REFRESH") {
            config.retry_after_refresh = parse_flag("API_RETRY_AFTER_REFRESH", &raw)?;
        }
        if let Some(raw) = lookup("API_SINGLE_FLIGHT_REFRESH") {
            config.single_flight_refresh = parse_flag("API_SINGLE_FLIGHT_REFRESH", &raw)?;
        }

        Ok(config)
    }
}

fn default_auth_url() -> Url {
    Url::parse(DEFAULT_AUTH_URL).expect("DEFAULT_AUTH_URL is a valid absolute URL")
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })
}

fn parse_secs(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
        })
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
        }),
    }
}
