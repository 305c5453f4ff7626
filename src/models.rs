//! Data models shared by the registry, the runtime and the controllers.
//!
//! This module contains the values that are handed unchanged to every
//! attachment: the namespace scope and the resource kind identifiers
//! carried on the discovery channel.

use std::fmt;
use std::str::FromStr;

/// Namespace restriction passed to every control loop.
///
/// Only [`NamespaceScope::new`] builds a restricted scope, so an empty
/// namespace always means all namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NamespaceScope {
    namespace: Option<String>,
}

impl NamespaceScope {
    /// Watch every namespace.
    pub const ALL: NamespaceScope = NamespaceScope { namespace: None };

    /// Build a scope from a raw value. The empty string means all namespaces.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::ALL
        } else {
            Self {
                namespace: Some(trimmed.to_string()),
            }
        }
    }

    /// Returns true when the scope is not restricted to one namespace.
    pub fn is_all(&self) -> bool {
        self.namespace.is_none()
    }

    /// The single namespace watched, if restricted.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the raw value, `""` for all namespaces.
    pub fn as_str(&self) -> &str {
        self.namespace().unwrap_or("")
    }

    /// Returns true if objects in `namespace` fall inside this scope.
    pub fn includes(&self, namespace: &str) -> bool {
        match self.namespace() {
            None => true,
            Some(ns) => ns == namespace,
        }
    }
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace() {
            None => write!(f, "<all>"),
            Some(ns) => write!(f, "{}", ns),
        }
    }
}

impl From<String> for NamespaceScope {
    fn from(s: String) -> Self {
        NamespaceScope::new(s)
    }
}

impl From<&str> for NamespaceScope {
    fn from(s: &str) -> Self {
        NamespaceScope::new(s)
    }
}

/// Checks a namespace name against the DNS-1123 label rules.
pub fn validate_namespace(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("namespace name must not be empty".to_string());
    }
    if name.len() > 63 {
        return Err(format!("namespace '{}' is longer than 63 characters", name));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "namespace '{}' must contain only lowercase letters, digits and '-'",
            name
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(format!(
            "namespace '{}' must start and end with an alphanumeric character",
            name
        ));
    }
    Ok(())
}

/// Identifier of a resource kind observed at runtime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKind {
    /// API group, empty for the core group.
    pub group: String,
    /// API version within the group.
    pub version: String,
    /// Kind name, e.g. `Deployment`.
    pub kind: String,
}

impl ResourceKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Returns `group/version`, or just `version` for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        let (group, version, kind) = match parts.as_slice() {
            [version, kind] => ("", *version, *kind),
            [group, version, kind] => (*group, *version, *kind),
            _ => {
                return Err(format!(
                    "invalid resource kind '{}': expected [group/]version/Kind",
                    s
                ))
            }
        };

        if version.is_empty() || kind.is_empty() {
            return Err(format!("invalid resource kind '{}': empty version or kind", s));
        }

        Ok(ResourceKind::new(group, version, kind))
    }
}
