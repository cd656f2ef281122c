//! Permission rules
//!
//! A [`Control`] grants identities in a realm the right to invoke one or more methods
//! on resources whose URI matches a regular expression. A [`Controls`] collection is
//! the full permission set of an identity; a request is allowed when any rule in the
//! collection matches it.
//!
//! The textual ACL format is a comma separated list of `realm:uri-pattern:methods`
//! entries, where methods are separated by `|`:
//!
//! ```
//! use warden_core::Controls;
//!
//! let controls: Controls = "app:/items/.*:GET|POST,*:/health:*".parse().unwrap();
//! assert!(controls.allowed("app", "/items/5", "get"));
//! assert!(controls.allowed("other", "/health", "DELETE"));
//! assert!(!controls.allowed("app", "/other", "GET"));
//! ```

use crate::error::{WardenError, WardenResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Wildcard accepted for the realm, the URI and the methods of a rule
pub const WILDCARD: &str = "*";

/// How a rule's URI is matched against a request path
#[derive(Debug, Clone)]
enum UriMatcher {
    Any,
    Pattern(Regex),
    /// The pattern did not compile; the rule never matches on URI
    Malformed(String),
}

impl UriMatcher {
    fn compile(uri: &str) -> Self {
        if uri == WILDCARD {
            return UriMatcher::Any;
        }
        match Regex::new(uri) {
            Ok(regex) => UriMatcher::Pattern(regex),
            Err(err) => UriMatcher::Malformed(err.to_string()),
        }
    }
}

/// A single permission rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawControl", into = "RawControl")]
pub struct Control {
    realm: String,
    uri: String,
    methods: Vec<String>,
    matcher: UriMatcher,
}

/// Serialized form of a [`Control`]
#[derive(Serialize, Deserialize)]
struct RawControl {
    realm: String,
    uri: String,
    method: Vec<String>,
}

impl From<RawControl> for Control {
    fn from(raw: RawControl) -> Self {
        Control::new(raw.realm, raw.uri, raw.method)
    }
}

impl From<Control> for RawControl {
    fn from(control: Control) -> Self {
        RawControl {
            realm: control.realm,
            uri: control.uri,
            method: control.methods,
        }
    }
}

impl Control {
    /// Create a rule. The URI pattern is compiled once here; a pattern that fails
    /// to compile is kept and reported each time the rule is evaluated.
    pub fn new<R, U, M, S>(realm: R, uri: U, methods: M) -> Self
    where
        R: Into<String>,
        U: Into<String>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let uri = uri.into();
        let matcher = UriMatcher::compile(&uri);
        Self {
            realm: realm.into(),
            uri,
            methods: methods.into_iter().map(Into::into).collect(),
            matcher,
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Whether the rule lists `method`, ignoring case and surrounding whitespace
    pub fn has_method(&self, method: &str) -> bool {
        let wanted = method.trim().to_uppercase();
        self.methods
            .iter()
            .any(|m| m.trim().to_uppercase() == wanted)
    }

    /// Whether the rule's pattern compiled
    pub fn is_well_formed(&self) -> bool {
        !matches!(self.matcher, UriMatcher::Malformed(_))
    }

    /// Check the URI pattern without touching realm or method
    pub fn validate(&self) -> WardenResult<()> {
        if self.uri == WILDCARD {
            return Ok(());
        }
        Regex::new(&self.uri)
            .map(|_| ())
            .map_err(|source| WardenError::MalformedPattern {
                pattern: self.uri.clone(),
                source,
            })
    }

    fn realm_matches(&self, realm: &str) -> bool {
        self.realm == realm || self.realm == WILDCARD
    }

    fn uri_matches(&self, uri: &str) -> bool {
        match &self.matcher {
            UriMatcher::Any => true,
            UriMatcher::Pattern(regex) => regex.is_match(uri),
            UriMatcher::Malformed(reason) => {
                warn!(
                    pattern = %self.uri,
                    reason = %reason,
                    "cannot match URI path, skipping rule"
                );
                false
            }
        }
    }

    fn method_matches(&self, method: &str) -> bool {
        self.has_method(method) || self.has_method(WILDCARD)
    }

    /// Whether this rule alone grants `method` on `uri` in `realm`
    pub fn permits(&self, realm: &str, uri: &str, method: &str) -> bool {
        self.realm_matches(realm) && self.uri_matches(uri) && self.method_matches(method)
    }
}

/// Rules are equal when realms match ignoring case and URI and method lists are identical
impl PartialEq for Control {
    fn eq(&self, other: &Self) -> bool {
        self.realm.to_lowercase() == other.realm.to_lowercase()
            && self.uri == other.uri
            && self.methods == other.methods
    }
}

impl Eq for Control {}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.realm, self.uri, self.methods.join("|"))
    }
}

impl FromStr for Control {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [realm, uri, methods] => Ok(Control::new(*realm, *uri, methods.split('|'))),
            _ => Err(WardenError::InvalidControlFormat {
                rule: s.to_string(),
            }),
        }
    }
}

/// A deduplicated, ordered collection of rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Control>", into = "Vec<Control>")]
pub struct Controls(Vec<Control>);

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules that grant every method on every resource in every realm
    pub fn unrestricted() -> Self {
        Self(vec![Control::new(WILDCARD, WILDCARD, [WILDCARD])])
    }

    /// Parse a comma separated ACL specification.
    ///
    /// A blank specification yields an empty collection. Any malformed entry fails
    /// the whole parse.
    pub fn parse(acl: &str) -> WardenResult<Self> {
        if acl.trim().is_empty() {
            return Ok(Self::new());
        }
        let mut controls = Self::new();
        for rule in acl.split(',') {
            controls.insert(rule.parse()?);
        }
        Ok(controls)
    }

    /// Set-union insert; returns false when an equal rule was already present
    pub fn insert(&mut self, control: Control) -> bool {
        if self.0.contains(&control) {
            return false;
        }
        self.0.push(control);
        true
    }

    /// Union with `controls`, keeping first-seen order
    pub fn add<I>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = Control>,
    {
        for control in controls {
            self.insert(control);
        }
        self
    }

    /// Whether any rule grants `method` on `uri` in `realm`
    pub fn allowed(&self, realm: &str, uri: &str, method: &str) -> bool {
        self.0.iter().any(|c| c.permits(realm, uri, method))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Control> {
        self.0.iter()
    }
}

impl FromStr for Controls {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Controls::parse(s)
    }
}

impl FromIterator<Control> for Controls {
    fn from_iter<I: IntoIterator<Item = Control>>(iter: I) -> Self {
        Controls::new().add(iter)
    }
}

impl From<Vec<Control>> for Controls {
    fn from(controls: Vec<Control>) -> Self {
        controls.into_iter().collect()
    }
}

impl From<Controls> for Vec<Control> {
    fn from(controls: Controls) -> Self {
        controls.0
    }
}

impl<'a> IntoIterator for &'a Controls {
    type Item = &'a Control;
    type IntoIter = std::slice::Iter<'a, Control>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Controls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&rules.join(","))
    }
}
