use serde::{Deserialize, Serialize};

use crate::key::DEFAULT_NAMESPACE;

/// Settings shared by every context made from one registry.
///
/// Deserializable, so it can live in the same configuration files it
/// governs:
///
/// ```toml
/// [context]
/// type_field = "kind"
/// default_namespace = "app"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Field holding the type key of an element.
    pub type_field: String,
    /// Namespace for type keys written without one.
    pub default_namespace: String,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            type_field: "type".to_string(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}
