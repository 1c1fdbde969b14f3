use thiserror::Error;

use crate::utils::UtilError;

/// Internal failures while assembling a gate decision.
///
/// These never reach callers of [`evaluate`](super::evaluate): the gate turns
/// them into a redirect to the auth service.
#[derive(Debug, Error, Clone)]
pub(crate) enum GateError {
    #[error("Header error: {0}")]
    Header(String),

    #[error("No rule produced a decision")]
    NoDecision,

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}
