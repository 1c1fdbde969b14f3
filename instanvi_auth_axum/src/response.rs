use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use http::{
    HeaderMap, HeaderValue,
    header::{LOCATION, SET_COOKIE, VARY},
};

use instanvi_auth::GateDecision;

/// Turn a gate decision that does not pass through into a response.
///
/// For [`GateDecision::Allow`] the caller runs the inner service and then
/// applies the headers with [`apply_headers`].
pub fn into_response(decision: GateDecision) -> Response {
    match decision {
        GateDecision::Allow { headers } => apply_headers(StatusCode::OK.into_response(), &headers),
        GateDecision::Redirect { location, headers } => redirect(&location, &headers),
        GateDecision::Reject { status, body } => (status, Json(body)).into_response(),
    }
}

/// Merge gate headers into `response`; cookies and `Vary` are added, the rest replace.
///
/// Use this with the headers of [`GateDecision::Allow`] when running the
/// inner service yourself instead of going through [`auth_gate`](crate::auth_gate).
pub fn apply_headers(mut response: Response, headers: &HeaderMap) -> Response {
    let target = response.headers_mut();
    for (name, value) in headers {
        if name == SET_COOKIE || name == VARY {
            target.append(name.clone(), value.clone());
        } else {
            target.insert(name.clone(), value.clone());
        }
    }
    response
}

fn redirect(location: &str, headers: &HeaderMap) -> Response {
    let location = match HeaderValue::from_str(location) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Failed to build Location header: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = StatusCode::TEMPORARY_REDIRECT.into_response();
    response.headers_mut().insert(LOCATION, location);
    apply_headers(response, headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redirect_response() {
        // Given a redirect decision that also clears the cookie
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("auth_token=; Path=/; Max-Age=0"),
        );
        let decision = GateDecision::Redirect {
            location: "https://auth.example.com/?redirectUrl=x".to_string(),
            headers,
        };

        // When converting it
        let response = into_response(decision);

        // Then it is a temporary redirect carrying the cookie
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[LOCATION],
            "https://auth.example.com/?redirectUrl=x"
        );
        assert_eq!(
            response.headers()[SET_COOKIE],
            "auth_token=; Path=/; Max-Age=0"
        );
    }

    #[test]
    fn test_reject_response() {
        let decision = GateDecision::Reject {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "error": "Authentication required" }),
        };

        let response = into_response(decision);

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn test_allow_headers_on_handler_response() {
        // Given an authenticated request evaluated outside the middleware
        let request = instanvi_auth::GateRequest {
            method: http::Method::GET,
            path: "/payables".to_string(),
            url: "https://app.instanvi.com/payables".to_string(),
            origin: "https://app.instanvi.com".to_string(),
            origin_header: None,
            authorization: None,
            query_token: None,
            cookie_token: Some("valid-cookie-token".to_string()),
        };
        let decision = instanvi_auth::evaluate(&instanvi_auth::GateConfig::default(), &request);
        let GateDecision::Allow { headers } = decision else {
            panic!("Expected an Allow decision");
        };

        // When the caller renders its own response and applies the gate headers
        let response = crate::apply_headers(
            (StatusCode::CREATED, "created").into_response(),
            &headers,
        );

        // Then the handler status survives and the gate headers are attached
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[http::header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(
            response.headers()[SET_COOKIE]
                .to_str()
                .unwrap()
                .starts_with("auth_token=valid-cookie-token;")
        );
    }

    #[test]
    fn test_apply_headers_keeps_existing_cookies() {
        // Given a handler response that sets its own cookie
        let mut response = StatusCode::OK.into_response();
        response
            .headers_mut()
            .append(SET_COOKIE, HeaderValue::from_static("theme=dark; Path=/"));
        response
            .headers_mut()
            .insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));

        let mut gate_headers = HeaderMap::new();
        gate_headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
        gate_headers.append(SET_COOKIE, HeaderValue::from_static("auth_token=abc; Path=/"));

        // When applying gate headers
        let response = apply_headers(response, &gate_headers);

        // Then cookies accumulate and other headers are replaced
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }
}
