//! Credential-refreshing API client
//!
//! Every call carries the stored access token. A 401 triggers one bounded
//! refresh through the refresh endpoint; whether the triggering call is then
//! retried is a [`ClientConfig`](crate::ClientConfig) choice.

mod errors;
mod interceptor;
mod refresh;
mod types;

pub use errors::ApiError;
pub use interceptor::{ApiClient, REFRESH_TOKEN_PATH};
pub use types::RefreshOutcome;
