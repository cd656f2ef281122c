//! Warden Core - access-control decision engine
//!
//! Permission rules scoped by realm, resource pattern and method, the identities
//! that carry them, and the configuration shared by every request.

pub mod config;
pub mod control;
pub mod error;
pub mod logging;
pub mod principal;
pub mod token;

pub use config::{ServerConfig, UnconfiguredPolicy};
pub use control::{Control, Controls, WILDCARD};
pub use error::{WardenError, WardenResult};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use principal::UserPrincipal;
pub use token::{basic_token, random_password, read_basic_token};
