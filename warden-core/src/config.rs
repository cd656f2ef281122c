//! Server configuration loaded from the environment

use crate::control::Controls;
use crate::error::WardenResult;
use crate::token::{basic_token, random_password};
use crate::config_error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const VAR_HTTP_USER: &str = "HTTP_USER";
pub const VAR_HTTP_PASSWORD: &str = "HTTP_PASSWORD";
pub const VAR_HTTP_REALM: &str = "HTTP_REALM";
pub const VAR_HTTP_UPLOAD_LIMIT: &str = "HTTP_UPLOAD_LIMIT";
pub const VAR_HTTP_UPLOAD_IN_MEM_SIZE: &str = "HTTP_UPLOAD_IN_MEM_SIZE";
pub const VAR_HTTP_ACL: &str = "HTTP_ACL";
pub const VAR_HTTP_UNCONFIGURED_AUTH: &str = "HTTP_UNCONFIGURED_AUTH";

const GENERATED_PASSWORD_LEN: usize = 20;

/// What to do with a request no authenticator applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnconfiguredPolicy {
    /// Forward the request without an identity
    #[default]
    Allow,
    /// Reject the request as unauthenticated
    Deny,
}

impl fmt::Display for UnconfiguredPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnconfiguredPolicy::Allow => write!(f, "allow"),
            UnconfiguredPolicy::Deny => write!(f, "deny"),
        }
    }
}

impl FromStr for UnconfiguredPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(UnconfiguredPolicy::Allow),
            "deny" => Ok(UnconfiguredPolicy::Deny),
            _ => Err(format!("Unknown unconfigured policy: {}", s)),
        }
    }
}

/// Server-wide access configuration, built once at startup
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// User accepted by the basic authenticator
    pub user: String,
    /// Password accepted by the basic authenticator
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Realm every authorization decision is made in
    pub realm: String,
    /// Maximum request body size in megabytes
    pub upload_limit_mb: u64,
    /// Portion of an upload kept in memory, in megabytes
    pub upload_in_memory_mb: u64,
    /// Rights granted to the basic authenticator's user
    pub acl: Controls,
    pub on_unconfigured: UnconfiguredPolicy,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("realm", &self.realm)
            .field("upload_limit_mb", &self.upload_limit_mb)
            .field("upload_in_memory_mb", &self.upload_in_memory_mb)
            .field("acl", &self.acl.to_string())
            .field("on_unconfigured", &self.on_unconfigured)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            user: "admin".to_string(),
            password: random_password(GENERATED_PASSWORD_LEN, true),
            realm: "*".to_string(),
            upload_limit_mb: 250,
            upload_in_memory_mb: 150,
            acl: Controls::unrestricted(),
            on_unconfigured: UnconfiguredPolicy::Allow,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, reading a `.env` file first
    /// when one exists
    pub fn from_env() -> WardenResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`; unset and empty values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> WardenResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let defaults = ServerConfig::default();

        let password = match get(VAR_HTTP_PASSWORD) {
            Some(password) => password,
            None => {
                warn!(
                    variable = VAR_HTTP_PASSWORD,
                    password = %defaults.password,
                    "undefined http password, a random one has been generated"
                );
                defaults.password
            }
        };

        let upload_limit_mb = match get(VAR_HTTP_UPLOAD_LIMIT) {
            Some(value) => parse_size(VAR_HTTP_UPLOAD_LIMIT, &value)?,
            None => defaults.upload_limit_mb,
        };

        let upload_in_memory_mb = match get(VAR_HTTP_UPLOAD_IN_MEM_SIZE) {
            Some(value) => parse_size(VAR_HTTP_UPLOAD_IN_MEM_SIZE, &value)?,
            None => defaults.upload_in_memory_mb,
        };

        let acl = match get(VAR_HTTP_ACL) {
            Some(value) => Controls::parse(&value)?,
            None => defaults.acl,
        };

        let on_unconfigured = match get(VAR_HTTP_UNCONFIGURED_AUTH) {
            Some(value) => value
                .parse::<UnconfiguredPolicy>()
                .map_err(|e| config_error!("{}: {}", VAR_HTTP_UNCONFIGURED_AUTH, e))?,
            None => defaults.on_unconfigured,
        };

        Ok(Self {
            user: get(VAR_HTTP_USER).unwrap_or(defaults.user),
            password,
            realm: get(VAR_HTTP_REALM).unwrap_or(defaults.realm),
            upload_limit_mb,
            upload_in_memory_mb,
            acl,
            on_unconfigured,
        })
    }

    /// `Authorization` header value for the configured credentials
    pub fn basic_token(&self) -> String {
        basic_token(&self.user, &self.password)
    }

    pub fn upload_limit_bytes(&self) -> usize {
        mb_to_bytes(self.upload_limit_mb)
    }

    pub fn upload_in_memory_bytes(&self) -> usize {
        mb_to_bytes(self.upload_in_memory_mb)
    }
}

fn mb_to_bytes(mb: u64) -> usize {
    usize::try_from(mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
}

/// Parse a size accepting decimal, `0x` hexadecimal and `0o` octal notation
fn parse_size(variable: &str, value: &str) -> WardenResult<u64> {
    let value = value.trim();
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(oct) = value.strip_prefix("0o").or_else(|| value.strip_prefix("0O")) {
        u64::from_str_radix(oct, 8)
    } else {
        value.parse()
    };
    parsed.map_err(|_| config_error!("invalid value '{}' for {}", value, variable))
}
