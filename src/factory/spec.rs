use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use toml::Value;

use super::{erase_constructor, Arguments, BoxError, Constructor, Decoder, Object, Slot};
use crate::Key;

/// An explicit description of a registrable type.
///
/// This is the input to an [`ElementInspector`](super::ElementInspector);
/// it is not validated until registration.
pub struct TypeSpec {
    pub(super) key: Key,
    pub(super) decoder: Option<Decoder>,
    pub(super) slots: Vec<Slot>,
    pub(super) cached: Option<bool>,
    pub(super) construct: Arc<Constructor>,
}

impl TypeSpec {
    pub fn builder(key: Key) -> TypeSpecBuilder {
        TypeSpecBuilder {
            key,
            decoder: None,
            slots: Vec::new(),
            cached: None,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

/// Builder for [`TypeSpec`]. Slots are recorded in call order.
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct TypeSpecBuilder {
    key: Key,
    decoder: Option<Decoder>,
    slots: Vec<Slot>,
    cached: Option<bool>,
}

impl TypeSpecBuilder {
    /// Decodes data with serde into `D` and adds the data slot.
    pub fn data<D>(self) -> Self
    where
        D: DeserializeOwned + Send + Sync + 'static,
    {
        self.decoder(Decoder::serde::<D>()).data_slot()
    }

    /// Decodes data with `decode` and adds the data slot.
    pub fn data_with<D, F>(self, decode: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&Value) -> Result<D, BoxError> + Send + Sync + 'static,
    {
        self.decoder(Decoder::new(decode)).data_slot()
    }

    /// Sets the decoder without adding a slot.
    pub fn decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Adds a data slot without setting a decoder.
    pub fn data_slot(mut self) -> Self {
        self.slots.push(Slot::Data);
        self
    }

    pub fn dependency(mut self, type_key: Key) -> Self {
        self.slots.push(Slot::Dependency {
            type_key,
            name: None,
        });
        self
    }

    pub fn named_dependency(mut self, type_key: Key, name: Key) -> Self {
        self.slots.push(Slot::Dependency {
            type_key,
            name: Some(name),
        });
        self
    }

    /// Forces caching on or off for this type regardless of the caller's hint.
    pub fn cached(mut self, cached: bool) -> Self {
        self.cached = Some(cached);
        self
    }

    pub fn build<T, F>(self, construct: F) -> TypeSpec
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        TypeSpec {
            key: self.key,
            decoder: self.decoder,
            slots: self.slots,
            cached: self.cached,
            construct: erase_constructor(move |args| Ok(Arc::new(construct(args)?) as Object)),
        }
    }
}
