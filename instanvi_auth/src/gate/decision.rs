use http::{HeaderMap, StatusCode};
use serde_json::json;

use crate::config::GateConfig;

use super::classify::{classify, is_api_path};
use super::errors::GateError;
use super::headers::{
    add_cors_headers, add_referrer_policy, add_security_headers, clear_auth_cookie,
    set_dev_auth_cookie, set_rolling_auth_cookie,
};
use super::request::GateRequest;
use super::token::{MIN_TOKEN_LENGTH, resolve_token};
use super::types::{GateDecision, ResolvedToken, RouteClass, TokenSource};

/// Everything the rules look at, computed once per request
struct GateContext<'a> {
    config: &'a GateConfig,
    request: &'a GateRequest,
    route: RouteClass,
    token: Option<ResolvedToken>,
}

enum Step {
    Continue,
    Done(GateDecision),
}

type Rule = fn(&GateContext<'_>) -> Result<Step, GateError>;

/// Evaluated in order; the first rule returning `Step::Done` decides.
const RULES: &[(&str, Rule)] = &[
    ("unprotected_route", pass_unprotected_route),
    ("url_token", allow_url_token),
    ("dev_fallback", allow_dev_fallback),
    ("missing_token", deny_missing_token),
    ("malformed_token", deny_malformed_token),
    ("authenticated", allow_authenticated),
];

/// Decide what happens to a request.
///
/// Never fails: if a decision cannot be assembled the gate fails closed and
/// redirects to the auth service.
pub fn evaluate(config: &GateConfig, request: &GateRequest) -> GateDecision {
    let ctx = GateContext {
        config,
        request,
        route: classify(config, &request.path),
        token: resolve_token(request),
    };

    match run_rules(&ctx) {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!("Gate failed for {}: {}; redirecting to auth", request.path, e);
            GateDecision::Redirect {
                location: auth_redirect_url(config, request),
                headers: HeaderMap::new(),
            }
        }
    }
}

fn run_rules(ctx: &GateContext<'_>) -> Result<GateDecision, GateError> {
    for (name, rule) in RULES {
        if let Step::Done(decision) = rule(ctx)? {
            if ctx.config.development {
                tracing::debug!(
                    path = %ctx.request.path,
                    route = ?ctx.route,
                    token_source = ?ctx.token.as_ref().map(|t| t.source),
                    rule = name,
                    "Gate decision"
                );
            }
            return Ok(decision);
        }
    }
    Err(GateError::NoDecision)
}

/// Auth service URL carrying the return address and origin of `request`
pub fn auth_redirect_url(config: &GateConfig, request: &GateRequest) -> String {
    let mut url = config.auth_url.clone();
    url.query_pairs_mut()
        .append_pair("redirectUrl", &request.url)
        .append_pair("origin", &request.origin);
    url.to_string()
}

fn pass_unprotected_route(ctx: &GateContext<'_>) -> Result<Step, GateError> {
    if ctx.route.requires_auth() {
        Ok(Step::Continue)
    } else {
        Ok(Step::Done(GateDecision::pass_through()))
    }
}

// The auth service hands the token over in the URL on its redirect back; it is
// trusted for that single hop and not shape-checked.
fn allow_url_token(ctx: &GateContext<'_>) -> Result<Step, GateError> {
    match &ctx.token {
        Some(token) if token.source == TokenSource::Query => {
            let mut headers = HeaderMap::new();
            add_security_headers(&mut headers);
            Ok(Step::Done(GateDecision::Allow { headers }))
        }
        _ => Ok(Step::Continue),
    }
}

fn allow_dev_fallback(ctx: &GateContext<'_>) -> Result<Step, GateError> {
    if !ctx.config.development || ctx.token.is_some() {
        return Ok(Step::Continue);
    }

    tracing::debug!("No token on {}; using development token", ctx.request.path);
    let mut headers = HeaderMap::new();
    set_dev_auth_cookie(&mut headers, &ctx.config.dev_token)?;
    Ok(Step::Done(GateDecision::Allow { headers }))
}

fn deny_missing_token(ctx: &GateContext<'_>) -> Result<Step, GateError> {
    if ctx.token.is_some() {
        return Ok(Step::Continue);
    }

    if is_api_path(&ctx.request.path) {
        return Ok(Step::Done(GateDecision::Reject {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "error": "Authentication required" }),
        }));
    }

    Ok(Step::Done(GateDecision::Redirect {
        location: auth_redirect_url(ctx.config, ctx.request),
        headers: HeaderMap::new(),
    }))
}

fn deny_malformed_token(ctx: &GateContext<'_>) -> Result<Step, GateError> {
    match &ctx.token {
        Some(token) if !token.is_well_formed() => {
            if ctx.config.development {
                tracing::debug!("Malformed {:?} token on {}", token.source, ctx.request.path);
            }
            let mut headers = HeaderMap::new();
            clear_auth_cookie(&mut headers)?;
            Ok(Step::Done(GateDecision::Redirect {
                location: auth_redirect_url(ctx.config, ctx.request),
                headers,
            }))
        }
        _ => Ok(Step::Continue),
    }
}

fn allow_authenticated(ctx: &GateContext<'_>) -> Result<Step, GateError> {
    let mut headers = HeaderMap::new();
    add_security_headers(&mut headers);
    add_referrer_policy(&mut headers);

    if is_api_path(&ctx.request.path) {
        if let Some(origin) = ctx.request.origin_header.as_deref() {
            if ctx.config.is_cors_allowed(origin) {
                add_cors_headers(&mut headers, origin)?;
            }
        }
    }

    // The cookie may not be the token that authenticated this request
    match ctx
        .request
        .cookie_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        Some(cookie_token) if cookie_token.chars().count() >= MIN_TOKEN_LENGTH => {
            set_rolling_auth_cookie(&mut headers, cookie_token, !ctx.config.development)?;
        }
        Some(_) => clear_auth_cookie(&mut headers)?,
        None => {}
    }

    Ok(Step::Done(GateDecision::Allow { headers }))
}
