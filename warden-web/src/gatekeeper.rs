//! Immutable access configuration shared by both middleware stages

use crate::authenticator::{AuthenticationFailure, Authenticator, BasicAuthenticator};
use crate::identity::Rejection;
use crate::middleware::{authenticate, authorize, is_browser};
use axum::{
    http::{
        header::{AUTHORIZATION, USER_AGENT},
        request::Parts,
        Method,
    },
    middleware::from_fn_with_state,
    Router,
};
use regex::Regex;
use std::{borrow::Cow, fmt, sync::Arc};
use tracing::{debug, warn};
use warden_core::{ServerConfig, UnconfiguredPolicy, UserPrincipal, WardenError, WardenResult};

/// An authenticator bound to the request paths its pattern matches
struct AuthRoute {
    pattern: Regex,
    /// `None` exempts matching paths from authentication
    authenticator: Option<Arc<dyn Authenticator>>,
}

/// Access configuration for one server: its realm, the per-path authenticators in
/// registration order, the default authenticator and the policy for requests no
/// authenticator applies to.
///
/// Built once at startup and shared by reference across requests; it has no
/// interior mutability.
pub struct Gatekeeper {
    realm: String,
    routes: Vec<AuthRoute>,
    default_authenticator: Option<Arc<dyn Authenticator>>,
    on_unconfigured: UnconfiguredPolicy,
}

impl fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<&str> = self.routes.iter().map(|r| r.pattern.as_str()).collect();
        f.debug_struct("Gatekeeper")
            .field("realm", &self.realm)
            .field("routes", &patterns)
            .field("default_authenticator", &self.default_authenticator.is_some())
            .field("on_unconfigured", &self.on_unconfigured)
            .finish()
    }
}

impl Gatekeeper {
    pub fn builder() -> GatekeeperBuilder {
        GatekeeperBuilder::new()
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Resolve the identity behind a request.
    ///
    /// The first registered pattern matching the path decides: its authenticator
    /// runs, or the request passes without identity when the pattern is exempt.
    /// Otherwise the default authenticator applies, except for `OPTIONS` requests
    /// and for credential-less browsers, which are challenged instead.
    pub async fn resolve(&self, parts: &Parts) -> Result<Option<UserPrincipal>, Rejection> {
        let raw_path = parts.uri.path();
        // patterns are written against decoded paths
        let path = urlencoding::decode(raw_path).unwrap_or(Cow::Borrowed(raw_path));
        let path = path.as_ref();

        if let Some(route) = self.routes.iter().find(|r| r.pattern.is_match(path)) {
            return match &route.authenticator {
                Some(authenticator) => self.run(authenticator.as_ref(), parts).await.map(Some),
                None => {
                    debug!(path, pattern = route.pattern.as_str(), "path exempt from authentication");
                    Ok(None)
                }
            };
        }

        let Some(default) = &self.default_authenticator else {
            return match self.on_unconfigured {
                UnconfiguredPolicy::Allow => Ok(None),
                UnconfiguredPolicy::Deny => {
                    warn!(path, "no authenticator configured for path");
                    Err(Rejection::Unauthorized { message: None })
                }
            };
        };

        if parts.method == Method::OPTIONS {
            return Ok(None);
        }

        let has_credentials = parts
            .headers
            .get(AUTHORIZATION)
            .is_some_and(|value| !value.is_empty());
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !has_credentials && is_browser(user_agent) {
            debug!(path, "challenging browser without credentials");
            return Err(Rejection::Challenge {
                realm: self.realm.clone(),
            });
        }

        self.run(default.as_ref(), parts).await.map(Some)
    }

    async fn run(
        &self,
        authenticator: &dyn Authenticator,
        parts: &Parts,
    ) -> Result<UserPrincipal, Rejection> {
        authenticator
            .authenticate(parts)
            .await
            .map_err(|failure: AuthenticationFailure| {
                let err = WardenError::from(failure);
                err.log();
                Rejection::from(err)
            })
    }

    /// Decide whether `identity` may invoke `method` on `path` in this server's realm
    pub fn check(
        &self,
        identity: Option<&UserPrincipal>,
        path: &str,
        method: &str,
    ) -> WardenResult<()> {
        match identity {
            Some(user) if user.is_allowed(&self.realm, path, method) => Ok(()),
            _ => Err(WardenError::Authorization {
                realm: self.realm.clone(),
                path: path.to_string(),
                method: method.to_string(),
            }),
        }
    }

    /// Wrap `router` with the authentication stage followed by the authorization stage
    pub fn protect<S>(self: &Arc<Self>, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(from_fn_with_state(Arc::clone(self), authorize))
            .layer(from_fn_with_state(Arc::clone(self), authenticate))
    }

    /// Wrap `router` with the authentication stage only
    pub fn authenticate_only<S>(self: &Arc<Self>, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(from_fn_with_state(Arc::clone(self), authenticate))
    }
}

/// Builder for [`Gatekeeper`]
pub struct GatekeeperBuilder {
    realm: String,
    routes: Vec<(String, Option<Arc<dyn Authenticator>>)>,
    default_authenticator: Option<Arc<dyn Authenticator>>,
    on_unconfigured: UnconfiguredPolicy,
}

impl GatekeeperBuilder {
    pub fn new() -> Self {
        Self {
            realm: warden_core::WILDCARD.to_string(),
            routes: Vec::new(),
            default_authenticator: None,
            on_unconfigured: UnconfiguredPolicy::default(),
        }
    }

    /// Realm, policy and a basic default authenticator taken from `config`
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new()
            .realm(config.realm.clone())
            .on_unconfigured(config.on_unconfigured)
            .default_authenticator(BasicAuthenticator::from_config(config))
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Authenticate paths matching `pattern` with `authenticator`.
    ///
    /// Patterns are tried in the order they were registered.
    pub fn route<A>(mut self, pattern: impl Into<String>, authenticator: A) -> Self
    where
        A: Authenticator + 'static,
    {
        self.routes
            .push((pattern.into(), Some(Arc::new(authenticator))));
        self
    }

    /// Exempt paths matching `pattern` from authentication
    pub fn unauthenticated(mut self, pattern: impl Into<String>) -> Self {
        self.routes.push((pattern.into(), None));
        self
    }

    pub fn default_authenticator<A>(mut self, authenticator: A) -> Self
    where
        A: Authenticator + 'static,
    {
        self.default_authenticator = Some(Arc::new(authenticator));
        self
    }

    pub fn on_unconfigured(mut self, policy: UnconfiguredPolicy) -> Self {
        self.on_unconfigured = policy;
        self
    }

    /// Compile the route patterns; a pattern that does not compile fails the build
    pub fn build(self) -> WardenResult<Arc<Gatekeeper>> {
        let routes = self
            .routes
            .into_iter()
            .map(|(pattern, authenticator)| {
                Regex::new(&pattern)
                    .map(|pattern| AuthRoute {
                        pattern,
                        authenticator,
                    })
                    .map_err(|source| WardenError::MalformedPattern { pattern, source })
            })
            .collect::<WardenResult<Vec<_>>>()?;

        Ok(Arc::new(Gatekeeper {
            realm: self.realm,
            routes,
            default_authenticator: self.default_authenticator,
            on_unconfigured: self.on_unconfigured,
        }))
    }
}

impl Default for GatekeeperBuilder {
    fn default() -> Self {
        Self::new()
    }
}
