//! Request-scoped identity and rejection responses

use crate::authenticator::UNAUTHORISED;
use axum::{
    extract::FromRequestParts,
    http::{header::WWW_AUTHENTICATE, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::{convert::Infallible, sync::Arc};
use warden_core::{UserPrincipal, WardenError};

/// Identity resolved by the authentication stage.
///
/// Stored as a request extension; its type is the key downstream stages and
/// handlers look it up by. `None` means the request went through without one.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<Arc<UserPrincipal>>);

impl Identity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn principal(&self) -> Option<&UserPrincipal> {
        self.0.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.principal().map(UserPrincipal::username)
    }
}

impl From<Option<UserPrincipal>> for Identity {
    fn from(principal: Option<UserPrincipal>) -> Self {
        Self(principal.map(Arc::new))
    }
}

/// Identity extractor; never fails, yields an anonymous identity when the
/// authentication stage did not run or resolved nobody
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().unwrap_or_default())
    }
}

/// Authenticated caller extractor; rejects with 401 when there is no identity
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<UserPrincipal>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .and_then(|identity| identity.0.clone())
            .map(CurrentUser)
            .ok_or(Rejection::Unauthorized { message: None })
    }
}

/// Terminal outcome of a failed authentication or authorization stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// 401 with the authenticator's message, or the generic one
    Unauthorized { message: Option<String> },
    /// 401 asking a browser to prompt for credentials
    Challenge { realm: String },
    /// 403 without a body
    Forbidden,
    /// 500 for misconfiguration surfacing at request time
    Internal,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::Unauthorized { .. } | Rejection::Challenge { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Rejection::Forbidden => StatusCode::FORBIDDEN,
            Rejection::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WardenError> for Rejection {
    fn from(err: WardenError) -> Self {
        match err {
            WardenError::Authentication { message } => Rejection::Unauthorized { message },
            WardenError::Authorization { .. } => Rejection::Forbidden,
            WardenError::InvalidControlFormat { .. }
            | WardenError::MalformedPattern { .. }
            | WardenError::Config { .. } => Rejection::Internal,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                message.unwrap_or_else(|| UNAUTHORISED.to_string()),
            )
                .into_response(),
            Rejection::Challenge { realm } => (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", realm))],
            )
                .into_response(),
            Rejection::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Rejection::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
