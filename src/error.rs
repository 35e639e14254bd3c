use thiserror::Error;

use crate::config::ConfigError;
use crate::dependency::DependencyError;
use crate::factory::BoxError;
use crate::path::ElementPath;
use crate::registry::{LookupError, RegistrationError};

/// Top-level error type for the confweave library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("dependency error: {0}")]
    Dependency(#[from] DependencyError),

    #[error("construction failed: {0}")]
    Construction(#[source] BoxError),

    #[error("while resolving '{path}': {source}")]
    Resolving {
        path: ElementPath,
        #[source]
        source: Box<Error>,
    },

    #[error("{} elements failed to load: {}", .0.len(), joined(.0))]
    Multiple(Vec<Error>),
}

impl Error {
    /// Wraps `self` with the path that was being resolved.
    pub fn at(self, path: ElementPath) -> Self {
        Error::Resolving {
            path,
            source: Box::new(self),
        }
    }

    /// Recovers an `Error` that crossed a user closure as a [`BoxError`].
    pub(crate) fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => *err,
            Err(other) => Error::Construction(other),
        }
    }

    /// The resolution breadcrumbs, outermost first.
    pub fn trail(&self) -> Vec<&ElementPath> {
        let mut trail = Vec::new();
        let mut current = self;
        while let Error::Resolving { path, source } = current {
            trail.push(path);
            current = source;
        }
        trail
    }

    /// The error beneath all resolution breadcrumbs.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Resolving { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn joined(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
