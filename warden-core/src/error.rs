//! Unified error handling
//!
//! Setup failures (bad ACL strings, bad patterns, bad configuration) surface to the
//! caller building the configuration. Request-time failures are terminal for that
//! request and are never retried.

use thiserror::Error;
use tracing::{error, warn};

pub type WardenResult<T> = Result<T, WardenError>;

/// Main error type for the access-control engine
#[derive(Error, Debug)]
pub enum WardenError {
    #[error("Invalid control format '{rule}', it should be realm:uri:method")]
    InvalidControlFormat { rule: String },

    #[error("Malformed pattern '{pattern}': {source}")]
    MalformedPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{}", message.as_deref().unwrap_or("Unauthorised"))]
    Authentication { message: Option<String> },

    #[error("Access to {method} {path} denied in realm '{realm}'")]
    Authorization {
        realm: String,
        path: String,
        method: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl WardenError {
    /// HTTP status code a request-time failure maps to
    pub fn status_code(&self) -> u16 {
        match self {
            WardenError::Authentication { .. } => 401,
            WardenError::Authorization { .. } => 403,
            _ => 500,
        }
    }

    /// Whether the error belongs to setup rather than to a single request
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            WardenError::InvalidControlFormat { .. }
                | WardenError::MalformedPattern { .. }
                | WardenError::Config { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        if self.is_setup_error() {
            error!(error = %self, "Access control misconfiguration");
        } else {
            warn!(error = %self, status = self.status_code(), "Request rejected");
        }
    }
}

/// Convenience macro for configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::WardenError::Config {
            message: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_message_falls_back_to_generic() {
        let err = WardenError::Authentication { message: None };
        assert_eq!(err.to_string(), "Unauthorised");

        let err = WardenError::Authentication {
            message: Some("token expired".to_string()),
        };
        assert_eq!(err.to_string(), "token expired");
        assert_eq!(err.status_code(), 401);
        assert!(!err.is_setup_error());
    }

    #[test]
    fn invalid_control_format_names_the_rule() {
        let err = WardenError::InvalidControlFormat {
            rule: "a:b".to_string(),
        };
        assert!(err.to_string().contains("'a:b'"));
        assert!(err.is_setup_error());
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn config_error_macro_formats_message() {
        let err = config_error!("invalid upload limit '{}'", "abc");
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid upload limit 'abc'"
        );
    }
}
