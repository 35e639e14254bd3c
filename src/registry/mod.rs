//! Append-only registries keyed by [`Key`].

mod error;
mod types;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::RwLock;

use crate::Key;

pub use error::{LookupError, RegistrationError};
pub use types::TypeRegistry;

/// A concurrent key-value store that never overwrites.
///
/// Reads take a shared lock; writes take the exclusive lock only for the
/// check-and-insert itself.
#[derive(Debug)]
pub struct Registry<V> {
    name: &'static str,
    entries: RwLock<HashMap<Key, V>>,
}

impl<V: Clone> Registry<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Inserts `value` under `key`, failing if the key is already taken.
    pub fn register(&self, key: Key, value: V) -> Result<(), RegistrationError> {
        match self.entries.write().entry(key) {
            Entry::Occupied(entry) => Err(RegistrationError::Duplicate {
                registry: self.name,
                key: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                tracing::debug!(registry = self.name, key = %entry.key(), "registered");
                entry.insert(value);
                Ok(())
            }
        }
    }

    /// Returns the registered value, registering `make()` first if absent.
    pub fn get_or_register(&self, key: Key, make: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        self.entries.write().entry(key).or_insert_with(make).clone()
    }

    pub fn lookup(&self, key: &Key) -> Result<V, LookupError> {
        self.get(key).ok_or_else(|| LookupError {
            registry: self.name,
            key: key.clone(),
        })
    }

    pub fn get(&self, key: &Key) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<Key> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn key(s: &str) -> Key {
        Key::parse(s).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new("numbers");
        registry.register(key("one"), 1).unwrap();

        assert_eq!(registry.lookup(&key("one")), Ok(1));
        assert_eq!(
            registry.lookup(&key("two")),
            Err(LookupError {
                registry: "numbers",
                key: key("two")
            })
        );
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let registry = Registry::new("numbers");
        registry.register(key("one"), 1).unwrap();

        let result = registry.register(key("one"), 100);
        assert!(matches!(
            result,
            Err(RegistrationError::Duplicate { registry: "numbers", .. })
        ));
        assert_eq!(registry.get(&key("one")), Some(1));
    }

    #[test]
    fn test_get_or_register() {
        let registry = Registry::new("numbers");
        let calls = AtomicUsize::new(0);
        let make = || {
            calls.fetch_add(1, Ordering::SeqCst);
            7
        };

        assert_eq!(registry.get_or_register(key("seven"), make), 7);
        assert_eq!(registry.get_or_register(key("seven"), || 8), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_registration_has_one_winner() {
        let registry = Registry::new("numbers");
        let wins = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for i in 0..8 {
                let registry = &registry;
                let wins = &wins;
                scope.spawn(move || {
                    if registry.register(key("contested"), i).is_ok() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }
}
