//! Authentication and authorization middleware stages
//!
//! Attach `authenticate` before `authorize`; [`Gatekeeper::protect`] does both.
//!
//! [`Gatekeeper::protect`]: crate::Gatekeeper::protect

use crate::{gatekeeper::Gatekeeper, identity::Identity, identity::Rejection};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// User-Agent fragments identifying interactive browsers
const BROWSER_MARKERS: [&str; 6] = ["Safari", "OP", "MSIE", "Edge", "Firefox", "Chrome"];

/// Whether a User-Agent looks like an interactive browser
pub fn is_browser(user_agent: &str) -> bool {
    BROWSER_MARKERS
        .iter()
        .any(|marker| user_agent.contains(marker))
}

/// Resolve the caller's identity and attach it to the request as an [`Identity`]
/// extension. Rejected requests never reach the next handler.
pub async fn authenticate(
    State(gate): State<Arc<Gatekeeper>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let identity = match gate.resolve(&parts).await {
        Ok(principal) => Identity::from(principal),
        Err(rejection) => {
            warn!(
                method = %parts.method,
                path = parts.uri.path(),
                status = rejection.status().as_u16(),
                "unauthenticated request"
            );
            return rejection.into_response();
        }
    };

    debug!(
        method = %parts.method,
        path = parts.uri.path(),
        user = identity.username().unwrap_or("-"),
        "request authenticated"
    );
    parts.extensions.insert(identity);

    next.run(Request::from_parts(parts, body)).await
}

/// Check the attached identity's rights against the request path and method in
/// the gatekeeper's realm
pub async fn authorize(
    State(gate): State<Arc<Gatekeeper>>,
    request: Request,
    next: Next,
) -> Response {
    let principal = request
        .extensions()
        .get::<Identity>()
        .and_then(Identity::principal);

    if let Err(err) = gate.check(principal, request.uri().path(), request.method().as_str()) {
        err.log();
        return Rejection::Forbidden.into_response();
    }

    next.run(request).await
}
