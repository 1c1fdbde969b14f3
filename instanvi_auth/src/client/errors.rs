use http::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;
use crate::credential::{CipherError, CredentialError};

use super::types::RefreshOutcome;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered 401; `refresh` tells what happened to the stored credentials
    #[error("Unauthorized (credential refresh {refresh})")]
    Unauthorized { refresh: RefreshOutcome },

    /// Any response other than 200, 201 or 401
    #[error("Request failed with status {status}")]
    Status { status: StatusCode, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Invalid request URL: {0}")]
    Url(String),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<CipherError> for ApiError {
    fn from(err: CipherError) -> Self {
        Self::Credential(err.into())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err.to_string())
    }
}
