use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// Category of a request path, derived from the path alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Framework/build internals (`/_next/...`, `favicon.ico`, ...)
    Internal,
    /// Script, stylesheet, image and font files
    StaticAsset,
    /// Pages and namespaces open to anonymous users
    PublicPath,
    /// API routes open to anonymous callers
    PublicApi,
    /// Everything else: a token is required
    Protected,
}

impl RouteClass {
    pub fn requires_auth(self) -> bool {
        matches!(self, RouteClass::Protected)
    }
}

/// Where the active token of a request was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSource {
    /// `?token=` URL query parameter, set by the auth service on its redirect back
    Query,
    /// `Authorization: Bearer ...`
    Header,
    /// `auth_token` cookie
    Cookie,
}

/// The single token that is active for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub value: String,
    pub source: TokenSource,
}

/// What the gate decided for one request
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Hand the request to the application, then add `headers` to its response.
    /// `Set-Cookie` entries are appended; every other header replaces.
    Allow { headers: HeaderMap },
    /// Send the browser elsewhere (307), with `headers` on the redirect response
    Redirect { location: String, headers: HeaderMap },
    /// Answer directly with a JSON body
    Reject { status: StatusCode, body: Value },
}

impl GateDecision {
    pub(crate) fn pass_through() -> Self {
        GateDecision::Allow {
            headers: HeaderMap::new(),
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, GateDecision::Allow { .. })
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            GateDecision::Allow { headers } | GateDecision::Redirect { headers, .. } => {
                Some(headers)
            }
            GateDecision::Reject { .. } => None,
        }
    }
}
