use std::any::{type_name, Any};
use std::sync::Arc;

use super::{Object, Slot};
use crate::context::Context;
use crate::dependency::DependencyProvider;
use crate::path::ElementPath;
use crate::registry::RegistrationError;
use crate::{Error, Key};

/// The filled argument slots handed to a factory closure.
pub struct Arguments<'a> {
    pub(super) key: &'a Key,
    pub(super) path: &'a ElementPath,
    pub(super) context: &'a Context,
    pub(super) dependencies: &'a dyn DependencyProvider,
    pub(super) cache_hint: bool,
    pub(super) slots: &'a [Slot],
    pub(super) values: Vec<Object>,
}

impl<'a> Arguments<'a> {
    /// The decoded data value.
    pub fn data<D: Any + Send + Sync>(&self) -> Result<Arc<D>, Error> {
        let index = self
            .slots
            .iter()
            .position(|slot| *slot == Slot::Data)
            .ok_or_else(|| RegistrationError::NoDataSlot {
                key: self.key.clone(),
            })?;
        self.get(index)
    }

    /// The value in slot `index`, downcast to `T`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, Error> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| RegistrationError::SlotOutOfRange {
                key: self.key.clone(),
                index,
                len: self.values.len(),
            })?;

        Arc::clone(value).downcast::<T>().map_err(|_| {
            RegistrationError::SlotTypeMismatch {
                key: self.key.clone(),
                index,
                expected: type_name::<T>(),
            }
            .into()
        })
    }

    /// Resolves the object at `relative`, taken relative to this element's path.
    ///
    /// The child sees the same dependencies and cache hint as this element.
    pub fn child<T: Any + Send + Sync>(&self, relative: &ElementPath) -> Result<Arc<T>, Error> {
        self.context
            .request(self.path.resolve(relative))
            .with_dependencies(self.dependencies)
            .cached(self.cache_hint)
            .provide()
    }

    pub fn child_object(&self, relative: &ElementPath) -> Result<Object, Error> {
        self.context
            .request(self.path.resolve(relative))
            .with_dependencies(self.dependencies)
            .cached(self.cache_hint)
            .provide_object()
    }

    pub fn key(&self) -> &Key {
        self.key
    }

    /// Absolute path of the element being built.
    pub fn path(&self) -> &ElementPath {
        self.path
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    pub fn dependencies(&self) -> &'a dyn DependencyProvider {
        self.dependencies
    }

    pub fn cache_hint(&self) -> bool {
        self.cache_hint
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
