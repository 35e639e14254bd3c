//! Environment variable sources.

use toml::Value;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;
use crate::path::ElementPath;

/// Maps `PREFIX<sep>A<sep>B=value` to the entry `/a/b = value`.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn collect(&self, vars: impl IntoIterator<Item = (String, String)>) -> Vec<ConfigEntry> {
        let prefix = format!("{}{}", self.prefix, self.separator);

        vars.into_iter()
            .filter_map(|(name, value)| {
                let rest = name.strip_prefix(&prefix)?;
                if rest.is_empty() {
                    return None;
                }
                let path = ElementPath::from_names(
                    rest.split(self.separator.as_str()).map(str::to_lowercase),
                );
                Some(ConfigEntry::at(path, literal(&value)))
            })
            .collect()
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let entries = self.collect(std::env::vars());
        tracing::debug!(prefix = %self.prefix, count = entries.len(), "environment overrides collected");
        Ok(entries)
    }
}

/// Reads `text` as a TOML value, falling back to a plain string.
fn literal(text: &str) -> Value {
    toml::from_str::<toml::Table>(&format!("v = {text}"))
        .ok()
        .filter(|table| table.len() == 1)
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| Value::String(text.to_string()))
}
