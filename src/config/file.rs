//! TOML file sources.

use std::path::{Path, PathBuf};

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;
use crate::path::ElementPath;

/// Loads one TOML file and mounts its table at `mount`.
///
/// Required files that don't exist cause an error; optional ones are skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    mount: ElementPath,
    required: bool,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self::mounted(ElementPath::root(), path, required)
    }

    /// A file whose contents land beneath `mount` instead of at the root.
    pub fn mounted(mount: impl Into<ElementPath>, path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mount: mount.into().to_absolute(),
            required,
        }
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let Some(table) = read_table(&self.path, self.required)? else {
            tracing::debug!(file = %self.path.display(), "optional config file missing");
            return Ok(Vec::new());
        };
        tracing::debug!(file = %self.path.display(), mount = %self.mount, "config file loaded");
        Ok(vec![ConfigEntry::at(
            self.mount.clone(),
            toml::Value::Table(table),
        )])
    }
}

/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn read_table(path: &Path, required: bool) -> Result<Option<toml::Table>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            }
        }
        Err(source) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        }),
    }
}
