use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to the stored credentials after a 401
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No refresh token was stored, nothing was attempted
    Skipped,
    /// New tokens are stored, either by this call or by a concurrent one
    Refreshed,
    /// The refresh did not succeed and all credentials were cleared
    Failed,
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Skipped => "skipped",
            Self::Refreshed => "refreshed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshRequest<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Deserialize)]
pub(super) struct RefreshResponse {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
}
