use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::RwLock;

use crate::path::ElementPath;

/// A grow-only map from paths to values where the first insert wins.
///
/// The lock is held only for the lookup or the insert, never while a value is
/// being computed, so two callers may compute a value for the same path. Only
/// the first one stored is ever returned.
#[derive(Debug)]
pub(crate) struct PathCache<V> {
    entries: RwLock<HashMap<ElementPath, V>>,
}

impl<V: Clone> PathCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, path: &ElementPath) -> Option<V> {
        self.entries.read().get(path).cloned()
    }

    /// Stores `value` unless the path already has one. Returns the stored
    /// value and whether it was this call's.
    pub(crate) fn insert_if_absent(&self, path: ElementPath, value: V) -> (V, bool) {
        match self.entries.write().entry(path) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => (entry.insert(value).clone(), true),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_insert_wins() {
        let cache = PathCache::new();
        let path = ElementPath::parse("/a");

        assert_eq!(cache.insert_if_absent(path.clone(), 1), (1, true));
        assert_eq!(cache.insert_if_absent(path.clone(), 2), (1, false));
        assert_eq!(cache.get(&path), Some(1));
        assert_eq!(cache.get(&ElementPath::parse("/b")), None);
        assert_eq!(cache.len(), 1);
    }
}
