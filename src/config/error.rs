use std::path::PathBuf;
use thiserror::Error;

use crate::factory::BoxError;
use crate::key::KeyError;
use crate::path::{ElementPath, PathError};
use crate::Key;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),

    #[error("circular reference detected in configuration")]
    CircularReference,

    #[error("referenced path not found: {0}")]
    ReferenceNotFound(String),

    #[error("cannot reference non-scalar value: {0}")]
    NonScalarReference(String),

    #[error("unclosed reference (missing '}}')")]
    UnclosedReference,

    #[error("no configuration at '{path}': {source}")]
    Navigation {
        path: ElementPath,
        source: PathError,
    },

    #[error("'{path}' is neither a table nor a list")]
    NotACollection { path: ElementPath },

    #[error("element has no '{field}' field naming its type")]
    MissingDiscriminator { field: String },

    #[error("type field '{field}' is not a string")]
    DiscriminatorNotAString { field: String },

    #[error("type field '{field}' holds an invalid key: {source}")]
    InvalidDiscriminator { field: String, source: KeyError },

    #[error("no type is registered for '{key}'")]
    UnknownType { key: Key },

    #[error("failed to decode data for '{key}': {source}")]
    Decode { key: Key, source: BoxError },

    #[error("element of type '{key}' is not a {expected}")]
    UnexpectedType { key: Key, expected: &'static str },
}
