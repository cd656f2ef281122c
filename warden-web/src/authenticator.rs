//! Authenticators resolve a request into a [`UserPrincipal`]

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, request::Parts};
use tracing::debug;
use warden_core::{read_basic_token, Controls, ServerConfig, UserPrincipal, WardenError};

/// Message used when an authenticator rejects a request without saying why
pub const UNAUTHORISED: &str = "Unauthorised";

/// Rejection returned by an authenticator, optionally carrying a message for the client
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", message.as_deref().unwrap_or(UNAUTHORISED))]
pub struct AuthenticationFailure {
    pub message: Option<String>,
}

impl AuthenticationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A rejection without a message; clients see the generic one
    pub fn silent() -> Self {
        Self::default()
    }
}

impl From<AuthenticationFailure> for WardenError {
    fn from(failure: AuthenticationFailure) -> Self {
        WardenError::Authentication {
            message: failure.message,
        }
    }
}

/// Resolves the identity behind a request.
///
/// Implementations may block on external credential stores; no timeout is applied
/// around them, so wrap slow stores in your own cancellation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &Parts) -> Result<UserPrincipal, AuthenticationFailure>;
}

/// Adapter turning a synchronous closure into an [`Authenticator`]
pub struct FnAuthenticator<F>(F);

/// Wrap a closure as an authenticator
pub fn authenticator_fn<F>(f: F) -> FnAuthenticator<F>
where
    F: Fn(&Parts) -> Result<UserPrincipal, AuthenticationFailure> + Send + Sync,
{
    FnAuthenticator(f)
}

#[async_trait]
impl<F> Authenticator for FnAuthenticator<F>
where
    F: Fn(&Parts) -> Result<UserPrincipal, AuthenticationFailure> + Send + Sync,
{
    async fn authenticate(&self, request: &Parts) -> Result<UserPrincipal, AuthenticationFailure> {
        (self.0)(request)
    }
}

/// HTTP Basic authentication against a single configured account
#[derive(Clone)]
pub struct BasicAuthenticator {
    user: String,
    password: String,
    rights: Controls,
}

impl BasicAuthenticator {
    pub fn new(user: impl Into<String>, password: impl Into<String>, rights: Controls) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            rights,
        }
    }

    /// Account and rights taken from the server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.user, &config.password, config.acl.clone())
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authenticate(&self, request: &Parts) -> Result<UserPrincipal, AuthenticationFailure> {
        let header = request
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(AuthenticationFailure::silent)?;

        let (user, password) = read_basic_token(header)
            .ok_or_else(|| AuthenticationFailure::new("Malformed basic credentials"))?;

        if user != self.user || password != self.password {
            debug!(user = %user, "basic credentials rejected");
            return Err(AuthenticationFailure::new("Invalid credentials"));
        }

        Ok(UserPrincipal::new(user, self.rights.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use warden_core::basic_token;

    fn parts_with_authorization(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/items/1");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn authenticator() -> BasicAuthenticator {
        BasicAuthenticator::new("test.user", "test-pwd", Controls::parse("app:*:GET").unwrap())
    }

    #[tokio::test]
    async fn test_basic_accepts_matching_credentials() {
        let parts = parts_with_authorization(Some(&basic_token("test.user", "test-pwd")));
        let user = authenticator().authenticate(&parts).await.unwrap();

        assert_eq!(user.username(), "test.user");
        assert!(user.is_allowed("app", "/items/1", "GET"));
    }

    #[tokio::test]
    async fn test_basic_rejects_wrong_password() {
        let parts = parts_with_authorization(Some(&basic_token("test.user", "nope")));
        let failure = authenticator().authenticate(&parts).await.unwrap_err();
        assert_eq!(failure.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_basic_without_header_is_silent() {
        let parts = parts_with_authorization(None);
        let failure = authenticator().authenticate(&parts).await.unwrap_err();
        assert_eq!(failure, AuthenticationFailure::silent());
        assert_eq!(failure.to_string(), UNAUTHORISED);
    }

    #[tokio::test]
    async fn test_basic_rejects_other_schemes() {
        let parts = parts_with_authorization(Some("Bearer abc"));
        let failure = authenticator().authenticate(&parts).await.unwrap_err();
        assert_eq!(failure.message.as_deref(), Some("Malformed basic credentials"));
    }

    #[tokio::test]
    async fn test_closure_authenticator() {
        let auth = authenticator_fn(|parts: &Parts| {
            if parts.uri.path().starts_with("/items") {
                Ok(UserPrincipal::new("guest", Controls::new()))
            } else {
                Err(AuthenticationFailure::new("wrong place"))
            }
        });

        let parts = parts_with_authorization(None);
        assert_eq!(auth.authenticate(&parts).await.unwrap().username(), "guest");
    }

    #[test]
    fn test_failure_converts_to_warden_error() {
        let err: WardenError = AuthenticationFailure::new("expired").into();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "expired");
    }
}
