//! Router plumbing shared by protected services

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use warden_core::{config_error, ServerConfig, WardenResult, WILDCARD};

/// Build a CORS layer allowing `origin` and the comma separated `headers`.
///
/// Empty values leave the corresponding header unset. Preflight `OPTIONS`
/// requests are answered by the layer itself, before any authentication stage
/// placed inside it.
pub fn cors_layer(origin: &str, headers: &str) -> WardenResult<CorsLayer> {
    let mut cors = CorsLayer::new();

    let origin = origin.trim();
    if origin == WILDCARD {
        cors = cors.allow_origin(AllowOrigin::any());
    } else if !origin.is_empty() {
        let value = HeaderValue::from_str(origin)
            .map_err(|_| config_error!("invalid CORS origin '{}'", origin))?;
        cors = cors.allow_origin(value);
    }

    let headers = headers.trim();
    if headers == WILDCARD {
        cors = cors.allow_headers(AllowHeaders::any());
    } else if !headers.is_empty() {
        let names = headers
            .split(',')
            .map(|name| {
                name.trim()
                    .parse::<HeaderName>()
                    .map_err(|_| config_error!("invalid CORS header '{}'", name.trim()))
            })
            .collect::<WardenResult<Vec<_>>>()?;
        cors = cors.allow_headers(names);
    }

    info!(origin, headers, "CORS configured");
    Ok(cors)
}

/// Apply the upload limit and HTTP request tracing from `config` to `router`
pub fn harden<S>(router: Router<S>, config: &ServerConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(config.upload_limit_bytes()))
        .layer(TraceLayer::new_for_http())
}
