//! instanvi_auth - request authentication for the Instanvi back office
//!
//! This crate holds the two pieces of authentication control flow the back office
//! depends on:
//!
//! - an edge gate that classifies every inbound request and decides whether to
//!   pass it through, redirect it to the external auth service, or reject it;
//! - an API client that attaches the stored bearer token to outgoing calls and
//!   performs a bounded token refresh when the server answers 401.
//!
//! The two never share state directly. They meet at the credential storage
//! contract: tokens are persisted only as encrypted envelopes.

mod client;
mod config;
mod credential;
mod gate;
mod utils;

pub use config::{
    AUTH_COOKIE_NAME, AUTH_COOKIE_MAX_AGE, ClientConfig, ConfigError, DEFAULT_AUTH_URL,
    DEFAULT_DEV_TOKEN, GateConfig,
};

pub use gate::{
    GateDecision, GateRequest, MIN_TOKEN_LENGTH, ResolvedToken, RouteClass, TokenSource,
    auth_redirect_url, classify, evaluate, resolve_token,
};

pub use credential::{
    ACCESS_TOKEN_KEY, CipherError, CredentialError, CredentialStore, CredentialVault,
    EnvelopeCipher, InMemoryCredentialStore, REFRESH_TOKEN_KEY, RedisCredentialStore,
    StorageError, credential_store_from_env,
};

pub use client::{ApiClient, ApiError, REFRESH_TOKEN_PATH, RefreshOutcome};
