//! Default overlays: fallback configuration registered at a path.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use toml::Value;

use crate::path::{ElementPath, Node};

/// Copy-on-write map of overlay fragments.
///
/// Readers load the current snapshot without locking. Writers serialize on
/// `writer`, copy the map, and publish the copy.
#[derive(Debug)]
pub(crate) struct Defaults {
    snapshot: ArcSwap<HashMap<ElementPath, Value>>,
    writer: Mutex<()>,
}

impl Defaults {
    pub(crate) fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Stores `fragment` at `path`. Returns `false` if an equal fragment was
    /// already there.
    pub(crate) fn register(&self, path: ElementPath, fragment: Value) -> bool {
        let _guard = self.writer.lock();
        let current = self.snapshot.load();
        if current.get(&path) == Some(&fragment) {
            return false;
        }

        let mut next = HashMap::clone(&current);
        next.insert(path, fragment);
        self.snapshot.store(Arc::new(next));
        true
    }

    /// The default subtree for `path`, taken from the nearest ancestor
    /// (including `path` itself) that has an overlay.
    ///
    /// The fragment is walked along the rest of `path`; the deepest value
    /// reached is the default, so a fragment without the remaining names is
    /// inherited whole. A walk that runs into a scalar with names left over
    /// yields no default. Farther overlays are never consulted once one is
    /// found.
    pub(crate) fn nearest(&self, path: &ElementPath) -> Option<Value> {
        let snapshot = self.snapshot.load();
        if snapshot.is_empty() {
            return None;
        }

        let (ancestor, fragment) = path
            .ancestors()
            .find_map(|ancestor| snapshot.get(&ancestor).map(|fragment| (ancestor, fragment)))?;
        let relative = ancestor.relativize(path).ok()?;

        let mut current = fragment;
        for name in relative.nodes().iter().filter_map(Node::as_name) {
            let next = match current {
                Value::Table(table) => table.get(name),
                Value::Array(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => return None,
            };
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        Some(current.clone())
    }
}

/// Fills fields missing from `real` with those of `default`.
///
/// Only the top level of two tables is merged; a present non-table value
/// always wins.
pub(crate) fn overlay(real: &Value, default: Option<Value>) -> Value {
    match (real, default) {
        (Value::Table(real), Some(Value::Table(mut merged))) => {
            for (key, value) in real {
                merged.insert(key.clone(), value.clone());
            }
            Value::Table(merged)
        }
        (real, _) => real.clone(),
    }
}
