//! Edge authentication gate
//!
//! Every inbound request is reduced to a typed [`GateRequest`], classified by
//! path, and run through an ordered chain of rules. The first rule that
//! produces a [`GateDecision`] wins. Evaluation is a pure function of the
//! request and the [`GateConfig`](crate::GateConfig): no I/O, no shared state.

mod classify;
mod decision;
mod errors;
mod headers;
mod request;
mod token;
mod types;

pub use classify::classify;
pub use decision::{auth_redirect_url, evaluate};
pub use request::GateRequest;
pub use token::{MIN_TOKEN_LENGTH, resolve_token};
pub use types::{GateDecision, ResolvedToken, RouteClass, TokenSource};
