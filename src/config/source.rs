//! Layered configuration sources and the merge they feed.

use toml::{Table, Value};

use super::ConfigError;
use crate::path::ElementPath;

/// A value contributed by a source, mounted at `path` in the merged tree.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: ElementPath,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(table: Table) -> Self {
        Self::at(ElementPath::root(), Value::Table(table))
    }

    pub fn at(path: impl Into<ElementPath>, value: Value) -> Self {
        Self {
            path: path.into().to_absolute(),
            value,
        }
    }
}

/// Anything that can contribute entries to a [`Config`](super::Config).
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Merges `value` into `table` at `path`.
///
/// Tables merge recursively. Anything else replaces what was there, and
/// non-table values on the way down are replaced by tables. A non-table value
/// at the root is ignored.
pub(crate) fn merge_at(table: &mut Table, path: &ElementPath, value: Value) {
    let names: Vec<&str> = path.nodes().iter().filter_map(|node| node.as_name()).collect();
    merge_names(table, &names, value);
}

fn merge_names(table: &mut Table, names: &[&str], value: Value) {
    let Some((first, rest)) = names.split_first() else {
        if let Value::Table(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };

    if rest.is_empty() {
        match (table.get_mut(*first), value) {
            (Some(Value::Table(base)), Value::Table(overlay)) => deep_merge(base, overlay),
            (_, value) => {
                table.insert(first.to_string(), value);
            }
        }
        return;
    }

    let nested = table
        .entry(first.to_string())
        .or_insert(Value::Table(Table::new()));
    if !nested.is_table() {
        *nested = Value::Table(Table::new());
    }
    if let Value::Table(nested) = nested {
        merge_names(nested, rest, value);
    }
}

pub(crate) fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> Table {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_merge_at_root_is_deep() {
        let mut base = table("[server]\nhost = \"a\"\nport = 1");
        merge_at(&mut base, &ElementPath::root(), Value::Table(table("[server]\nport = 2")));

        assert_eq!(base, table("[server]\nhost = \"a\"\nport = 2"));
    }

    #[test]
    fn test_merge_at_nested_path_creates_tables() {
        let mut base = table("server = \"flat\"");
        merge_at(&mut base, &ElementPath::parse("/server/tls/enabled"), Value::Boolean(true));

        assert_eq!(base, table("[server.tls]\nenabled = true"));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut base = table("items = [1, 2, 3]");
        merge_at(&mut base, &ElementPath::parse("/items"), Value::Array(vec![Value::Integer(9)]));

        assert_eq!(base, table("items = [9]"));
    }
}
