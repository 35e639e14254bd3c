//! Namespaced type keys.
//!
//! A key has the form `namespace:name`. When the namespace is omitted the
//! caller-supplied default is used, so `"svc"` and `"confweave:svc"` name the
//! same key under the default options.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Namespace assumed by [`Key::parse`] when none is given.
pub const DEFAULT_NAMESPACE: &str = "confweave";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum KeyError {
    #[error("key is empty")]
    Empty,

    #[error("invalid namespace '{namespace}' in key '{key}'")]
    InvalidNamespace { key: String, namespace: String },

    #[error("invalid name '{name}' in key '{key}'")]
    InvalidName { key: String, name: String },
}

/// An identifier selecting registry entries and dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    namespace: String,
    name: String,
}

impl Key {
    /// Parses `text`, falling back to [`DEFAULT_NAMESPACE`].
    pub fn parse(text: &str) -> Result<Self, KeyError> {
        Self::parse_in(text, DEFAULT_NAMESPACE)
    }

    /// Parses `text`, falling back to `default_namespace` when it has no `:`.
    pub fn parse_in(text: &str, default_namespace: &str) -> Result<Self, KeyError> {
        if text.is_empty() {
            return Err(KeyError::Empty);
        }

        let (namespace, name) = match text.split_once(':') {
            Some((namespace, name)) => (namespace, name),
            None => (default_namespace, text),
        };

        if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
            return Err(KeyError::InvalidNamespace {
                key: text.to_string(),
                namespace: namespace.to_string(),
            });
        }
        if name.is_empty() || !name.chars().all(is_name_char) {
            return Err(KeyError::InvalidName {
                key: text.to_string(),
                name: name.to_string(),
            });
        }

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn is_namespace_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-')
}

fn is_name_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

impl std::str::FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Key::parse(&text).map_err(serde::de::Error::custom)
    }
}
