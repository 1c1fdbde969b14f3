use headers::{Cookie, HeaderMapExt};
use http::header::{AUTHORIZATION, HOST, HeaderMap, ORIGIN};
use http::{Method, Uri};

use crate::config::AUTH_COOKIE_NAME;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Typed view of an inbound request, holding only what the gate looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    pub method: Method,
    pub path: String,
    /// Absolute URL of the request as the browser sees it
    pub url: String,
    /// `scheme://host` of the request itself
    pub origin: String,
    /// The `Origin` request header, if any
    pub origin_header: Option<String>,
    pub authorization: Option<String>,
    /// `token` URL query parameter
    pub query_token: Option<String>,
    /// Value of the `auth_token` cookie
    pub cookie_token: Option<String>,
}

impl GateRequest {
    /// Build the gate's view from raw HTTP parts.
    ///
    /// Header values that are not valid visible ASCII are treated as absent.
    pub fn from_http(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let scheme = header_str(headers, X_FORWARDED_PROTO)
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        let host = header_str(headers, X_FORWARDED_HOST)
            .or_else(|| header_str(headers, HOST.as_str()))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        let origin = format!("{scheme}://{host}");
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let query_token = uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(name, _)| name == "token")
                .map(|(_, value)| value.into_owned())
        });

        let cookie_token = headers
            .typed_get::<Cookie>()
            .and_then(|cookies| cookies.get(AUTH_COOKIE_NAME).map(str::to_string));

        Self {
            method: method.clone(),
            path: uri.path().to_string(),
            url: format!("{origin}{path_and_query}"),
            origin,
            origin_header: header_str(headers, ORIGIN.as_str()).map(str::to_string),
            authorization: header_str(headers, AUTHORIZATION.as_str()).map(str::to_string),
            query_token,
            cookie_token,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_path(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            url: format!("https://app.instanvi.com{path}"),
            origin: "https://app.instanvi.com".to_string(),
            origin_header: None,
            authorization: None,
            query_token: None,
            cookie_token: None,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
