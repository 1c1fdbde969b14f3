use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use ring::rand::SecureRandom;
use thiserror::Error;

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), UtilError> {
    ring::rand::SystemRandom::new()
        .fill(buf)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))
}

/// Attributes of a `Set-Cookie` header written by the gate.
///
/// The gate never sets `HttpOnly`: browser code reads the token cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CookieAttrs {
    pub(crate) max_age: Option<i64>,
    pub(crate) secure: bool,
}

pub(crate) fn header_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    attrs: &CookieAttrs,
) -> Result<(), UtilError> {
    let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax");
    if let Some(max_age) = attrs.max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if attrs.secure {
        cookie.push_str("; Secure");
    }

    let header_value = HeaderValue::from_str(&cookie)
        .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?;
    headers.append(SET_COOKIE, header_value);
    Ok(())
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
