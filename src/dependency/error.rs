use thiserror::Error;

use crate::factory::BoxError;
use crate::Key;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DependencyError {
    #[error("no supplier for '{type_key}'{}", named(.name))]
    NotFound { type_key: Key, name: Option<Key> },

    #[error("'{type_key}' has {candidates} named suppliers, a name is required")]
    NameRequired { type_key: Key, candidates: usize },

    #[error("dependency '{type_key}' is not a {expected}")]
    TypeMismatch {
        type_key: Key,
        expected: &'static str,
    },

    #[error("supplier for '{type_key}' failed: {source}")]
    Supplier {
        type_key: Key,
        #[source]
        source: BoxError,
    },
}

fn named(name: &Option<Key>) -> String {
    match name {
        Some(name) => format!(" named '{name}'"),
        None => String::new(),
    }
}
