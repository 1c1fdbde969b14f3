use crate::config::GateConfig;

use super::types::RouteClass;

/// Classify a request path. First match wins, in this order:
/// internal, static asset, public path, public API, otherwise protected.
pub fn classify(config: &GateConfig, path: &str) -> RouteClass {
    if is_internal(config, path) {
        RouteClass::Internal
    } else if is_static_asset(config, path) {
        RouteClass::StaticAsset
    } else if matches_any_prefix(&config.public_paths, path) {
        RouteClass::PublicPath
    } else if matches_any_prefix(&config.public_api_routes, path) {
        RouteClass::PublicApi
    } else {
        RouteClass::Protected
    }
}

pub(super) fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

fn is_internal(config: &GateConfig, path: &str) -> bool {
    config
        .internal_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

fn is_static_asset(config: &GateConfig, path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => config
            .static_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

/// `prefix` matches the path itself and anything below it, so `/auth` covers
/// `/auth` and `/auth/login` but not `/authority`.
fn matches_any_prefix(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return false;
        }
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    })
}
