//! Externally supplied values, looked up by type key and optional name.

mod error;
mod module;

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::factory::Object;
use crate::Key;

pub use error::DependencyError;
pub use module::{Module, ModuleProvider, Supplier};

/// Resolves dependencies for factory plans.
///
/// `provide` must either return a value or fail; an implementation that
/// reports `has_dependency` for a request must be able to provide it.
pub trait DependencyProvider: Send + Sync {
    fn has_dependency(&self, type_key: &Key, name: Option<&Key>) -> bool;

    fn provide(&self, type_key: &Key, name: Option<&Key>) -> Result<Object, DependencyError>;
}

pub trait DependencyProviderExt: DependencyProvider {
    /// Provides a dependency and downcasts it to `T`.
    fn provide_as<T: Any + Send + Sync>(
        &self,
        type_key: &Key,
        name: Option<&Key>,
    ) -> Result<Arc<T>, DependencyError> {
        self.provide(type_key, name)?
            .downcast::<T>()
            .map_err(|_| DependencyError::TypeMismatch {
                type_key: type_key.clone(),
                expected: type_name::<T>(),
            })
    }
}

impl<P: DependencyProvider + ?Sized> DependencyProviderExt for P {}

impl<P: DependencyProvider + ?Sized> DependencyProvider for Arc<P> {
    fn has_dependency(&self, type_key: &Key, name: Option<&Key>) -> bool {
        (**self).has_dependency(type_key, name)
    }

    fn provide(&self, type_key: &Key, name: Option<&Key>) -> Result<Object, DependencyError> {
        (**self).provide(type_key, name)
    }
}

/// Provides nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

impl DependencyProvider for NoDependencies {
    fn has_dependency(&self, _type_key: &Key, _name: Option<&Key>) -> bool {
        false
    }

    fn provide(&self, type_key: &Key, name: Option<&Key>) -> Result<Object, DependencyError> {
        Err(DependencyError::NotFound {
            type_key: type_key.clone(),
            name: name.cloned(),
        })
    }
}

/// Tries each provider in order and commits to the first that has the
/// dependency.
#[derive(Default)]
pub struct CompositeProvider {
    providers: Vec<Arc<dyn DependencyProvider>>,
}

impl CompositeProvider {
    pub fn new(providers: Vec<Arc<dyn DependencyProvider>>) -> Self {
        Self { providers }
    }

    /// Adds a provider consulted after all existing ones.
    pub fn then(mut self, provider: impl DependencyProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    fn find(&self, type_key: &Key, name: Option<&Key>) -> Option<&dyn DependencyProvider> {
        self.providers
            .iter()
            .find(|provider| provider.has_dependency(type_key, name))
            .map(|provider| provider.as_ref())
    }
}

impl DependencyProvider for CompositeProvider {
    fn has_dependency(&self, type_key: &Key, name: Option<&Key>) -> bool {
        self.find(type_key, name).is_some()
    }

    fn provide(&self, type_key: &Key, name: Option<&Key>) -> Result<Object, DependencyError> {
        match self.find(type_key, name) {
            Some(provider) => provider.provide(type_key, name),
            None => Err(DependencyError::NotFound {
                type_key: type_key.clone(),
                name: name.cloned(),
            }),
        }
    }
}

impl std::fmt::Debug for CompositeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeProvider")
            .field("providers", &self.providers.len())
            .finish()
    }
}
