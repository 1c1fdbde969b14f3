use super::request::GateRequest;
use super::types::{ResolvedToken, TokenSource};

/// Tokens shorter than this are treated as malformed
pub const MIN_TOKEN_LENGTH: usize = 10;

/// Pick the active token of a request.
///
/// Priority: URL `token` parameter, then the `Authorization` header (with any
/// `Bearer ` prefix removed), then the `auth_token` cookie. Empty values are
/// skipped.
pub fn resolve_token(request: &GateRequest) -> Option<ResolvedToken> {
    let from_query = request
        .query_token
        .as_deref()
        .map(|t| (t, TokenSource::Query));
    let from_header = request
        .authorization
        .as_deref()
        .map(|h| (strip_bearer(h), TokenSource::Header));
    let from_cookie = request
        .cookie_token
        .as_deref()
        .map(|c| (c, TokenSource::Cookie));

    [from_query, from_header, from_cookie]
        .into_iter()
        .flatten()
        .map(|(value, source)| (value.trim(), source))
        .find(|(value, _)| !value.is_empty())
        .map(|(value, source)| ResolvedToken {
            value: value.to_string(),
            source,
        })
}

fn strip_bearer(header: &str) -> &str {
    header.strip_prefix("Bearer ").unwrap_or(header)
}

impl ResolvedToken {
    /// Minimal shape check; real validation happens at the auth service
    pub fn is_well_formed(&self) -> bool {
        self.value.chars().count() >= MIN_TOKEN_LENGTH
    }
}
