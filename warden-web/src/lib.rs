//! Warden Web
//!
//! Authentication and authorization stages for axum routers. A [`Gatekeeper`]
//! holds the server's realm and authenticators; `protect` wraps a router so that
//! every request is first resolved into an [`Identity`] and then checked against
//! that identity's rights.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use warden_web::{CurrentUser, GatekeeperBuilder};
//! use warden_core::ServerConfig;
//!
//! async fn whoami(CurrentUser(user): CurrentUser) -> String {
//!     user.username().to_string()
//! }
//!
//! # fn main() -> Result<(), warden_core::WardenError> {
//! let config = ServerConfig::from_env()?;
//! let gate = GatekeeperBuilder::from_config(&config)
//!     .unauthenticated("^/health$")
//!     .build()?;
//!
//! let app = gate.protect(Router::new().route("/whoami", get(whoami)));
//! let app: Router = warden_web::harden(app, &config);
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod gatekeeper;
pub mod identity;
pub mod middleware;
pub mod server;

pub use authenticator::{
    authenticator_fn, AuthenticationFailure, Authenticator, BasicAuthenticator, FnAuthenticator,
};
pub use gatekeeper::{Gatekeeper, GatekeeperBuilder};
pub use identity::{CurrentUser, Identity, Rejection};
pub use middleware::{authenticate, authorize, is_browser};
pub use server::{cors_layer, harden};
