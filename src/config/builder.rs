use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use toml::Value;

use super::env::EnvSource;
use super::file::FileSource;
use super::resolve::resolve_references;
use super::source::{merge_at, ConfigEntry, ConfigSource};
use super::ConfigError;
use crate::context::Context;
use crate::path::ElementPath;
use crate::registry::TypeRegistry;

/// Builder for the configuration tree a [`Context`] resolves against.
///
/// Sources are merged in registration order, later ones overriding earlier
/// ones. Nested tables are merged recursively; other values (including
/// arrays) are replaced entirely.
///
/// ## References
///
/// String values can interpolate other values with `${path}`, where the path
/// is absolute or relative to the table holding the string:
///
/// ```toml
/// [server]
/// host = "localhost"
/// port = 8080
/// url = "http://${./host}:${/server/port}/api"
/// ```
///
/// Use `$${` to write a literal `${`.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use confweave::{Config, TypeRegistry};
///
/// let registry = Arc::new(TypeRegistry::new());
/// let context = Config::builder()
///     .with_file("config/default.toml", true)
///     .with_file_at("services/cache", "config/cache.toml", false)
///     .with_env("MYAPP", "__")
///     .into_context(&registry)?;
/// # Ok::<(), confweave::Error>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until loaded"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Config {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a TOML file merged at the root.
    ///
    /// If `required` is `true`, loading fails when the file doesn't exist.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Adds a TOML file merged beneath `mount`.
    pub fn with_file_at(
        self,
        mount: impl Into<ElementPath>,
        path: impl AsRef<Path>,
        required: bool,
    ) -> Self {
        self.with_source(FileSource::mounted(mount, path, required))
    }

    /// Adds environment variables named `PREFIX<sep>A<sep>B`, mapped to the
    /// path `/a/b`.
    ///
    /// Values are read as TOML literals, so `8080`, `true`, `[1, 2]` and
    /// `{ a = 1 }` keep their types; anything else becomes a string.
    ///
    /// ```no_run
    /// # use confweave::Config;
    /// # use serde::Deserialize;
    /// # #[derive(Deserialize)] struct MyConfig { }
    /// // defaults -> env overrides -> local file overrides env
    /// let config: MyConfig = Config::builder()
    ///     .with_file("config/default.toml", true)
    ///     .with_env("MYAPP", "__")
    ///     .with_file("config/local.toml", false)
    ///     .build()?;
    /// # Ok::<(), confweave::ConfigError>(())
    /// ```
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Sets a single value, as if a source had provided it.
    pub fn with_value(self, path: impl Into<ElementPath>, value: impl Into<Value>) -> Self {
        self.with_source(Fixed(ConfigEntry::at(path, value.into())))
    }

    /// Loads, merges and interpolates every source.
    pub fn load(self) -> Result<Value, ConfigError> {
        let mut merged = toml::Table::new();

        for source in &self.sources {
            for entry in source.entries()? {
                merge_at(&mut merged, &entry.path, entry.value);
            }
        }
        resolve_references(&mut merged)?;

        tracing::debug!(sources = self.sources.len(), keys = merged.len(), "configuration loaded");
        Ok(Value::Table(merged))
    }

    /// Loads the tree and deserializes it into `T`.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        self.load()?
            .try_into()
            .map_err(ConfigError::DeserializeError)
    }

    /// Loads the tree and wraps it in a [`Context`] backed by `registry`.
    pub fn into_context(self, registry: &Arc<TypeRegistry>) -> Result<Context, crate::Error> {
        Ok(registry.make_context(self.load()?))
    }
}

#[derive(Debug)]
struct Fixed(ConfigEntry);

impl ConfigSource for Fixed {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        Ok(vec![self.0.clone()])
    }
}
