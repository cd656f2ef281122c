//! Authenticated identities

use crate::control::Controls;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged on user and the access controls granted to them.
///
/// Built fresh by an authenticator for every request; the granted rights cannot be
/// changed once the principal exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPrincipal {
    /// Unique identifier, typically the user's email address
    username: String,
    #[serde(rename = "acl", default, skip_serializing_if = "Controls::is_empty")]
    rights: Controls,
    created: DateTime<Utc>,
    /// Opaque data an authenticator wants to hand to downstream handlers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<serde_json::Value>,
}

impl UserPrincipal {
    pub fn new(username: impl Into<String>, rights: Controls) -> Self {
        Self {
            username: username.into(),
            rights,
            created: Utc::now(),
            context: None,
        }
    }

    /// Attach opaque context data
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn rights(&self) -> &Controls {
        &self.rights
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn context(&self) -> Option<&serde_json::Value> {
        self.context.as_ref()
    }

    /// Whether the principal's rights grant `method` on `uri` in `realm`
    pub fn is_allowed(&self, realm: &str, uri: &str, method: &str) -> bool {
        self.rights.allowed(realm, uri, method)
    }
}
