use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, HeaderMap, HeaderValue, REFERRER_POLICY, VARY,
    X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};

use crate::config::{AUTH_COOKIE_MAX_AGE, AUTH_COOKIE_NAME};
use crate::utils::{CookieAttrs, header_set_cookie};

use super::errors::GateError;

const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

pub(super) fn add_security_headers(headers: &mut HeaderMap) {
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
}

pub(super) fn add_referrer_policy(headers: &mut HeaderMap) {
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
}

/// Echo CORS headers for an origin that has already been checked against the allow-list
pub(super) fn add_cors_headers(headers: &mut HeaderMap, origin: &str) -> Result<(), GateError> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|_| GateError::Header(format!("Invalid origin header value: {origin}")))?;

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
    Ok(())
}

/// Re-issue the auth cookie with a fresh 7-day lifetime
pub(super) fn set_rolling_auth_cookie(
    headers: &mut HeaderMap,
    token: &str,
    secure: bool,
) -> Result<(), GateError> {
    let attrs = CookieAttrs {
        max_age: Some(AUTH_COOKIE_MAX_AGE),
        secure,
    };
    header_set_cookie(headers, AUTH_COOKIE_NAME, token, &attrs)?;
    Ok(())
}

/// Session cookie holding the development token; never `Secure`
pub(super) fn set_dev_auth_cookie(headers: &mut HeaderMap, token: &str) -> Result<(), GateError> {
    let attrs = CookieAttrs {
        max_age: None,
        secure: false,
    };
    header_set_cookie(headers, AUTH_COOKIE_NAME, token, &attrs)?;
    Ok(())
}

pub(super) fn clear_auth_cookie(headers: &mut HeaderMap) -> Result<(), GateError> {
    let attrs = CookieAttrs {
        max_age: Some(0),
        secure: false,
    };
    header_set_cookie(headers, AUTH_COOKIE_NAME, "", &attrs)?;
    Ok(())
}
