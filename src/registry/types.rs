use std::sync::Arc;

use parking_lot::Mutex;
use toml::Value;

use super::{RegistrationError, Registry};
use crate::context::{Context, ContextOptions};
use crate::factory::{Decoder, Element, ElementInspector, FactoryPlan, PlanInspector, TypeSpec};

/// The decoders, factories and cache preferences of every registered type.
pub struct TypeRegistry {
    options: ContextOptions,
    inspector: Box<dyn ElementInspector>,
    decoders: Registry<Decoder>,
    factories: Registry<FactoryPlan>,
    caching: Registry<bool>,
    // Serializes `register_type` so a type lands in all maps or none.
    registration: Mutex<()>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    pub fn with_options(options: ContextOptions) -> Self {
        Self {
            options,
            inspector: Box::new(PlanInspector),
            decoders: Registry::new("decoder"),
            factories: Registry::new("factory"),
            caching: Registry::new("cache preference"),
            registration: Mutex::new(()),
        }
    }

    /// Replaces the inspector used by [`register_type`](Self::register_type).
    pub fn with_inspector(mut self, inspector: impl ElementInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// Inspects `spec` and records its decoder, factory and cache preference.
    ///
    /// Fails without registering anything if the key already has a decoder or
    /// factory, or if the inspector rejects its plan.
    pub fn register_type(&self, spec: TypeSpec) -> Result<(), RegistrationError> {
        let inspection = self.inspector.inspect(spec)?;
        let key = inspection.key;

        let _guard = self.registration.lock();
        let taken = [
            (self.decoders.name(), self.decoders.contains(&key)),
            (self.factories.name(), self.factories.contains(&key)),
            (
                self.caching.name(),
                inspection.cached.is_some() && self.caching.contains(&key),
            ),
        ];
        if let Some(&(registry, _)) = taken.iter().find(|(_, taken)| *taken) {
            return Err(RegistrationError::Duplicate { registry, key });
        }

        if let Some(decoder) = inspection.decoder {
            self.decoders.register(key.clone(), decoder)?;
        }
        if let Some(cached) = inspection.cached {
            self.caching.register(key.clone(), cached)?;
        }
        self.factories.register(key.clone(), inspection.plan)?;

        tracing::debug!(key = %key, "type registered");
        Ok(())
    }

    pub fn register<E: Element>(&self) -> Result<(), RegistrationError> {
        self.register_type(E::spec())
    }

    pub fn decoders(&self) -> &Registry<Decoder> {
        &self.decoders
    }

    pub fn factories(&self) -> &Registry<FactoryPlan> {
        &self.factories
    }

    pub fn caching(&self) -> &Registry<bool> {
        &self.caching
    }

    /// Creates a context over `root` backed by this registry.
    pub fn make_context(self: &Arc<Self>, root: Value) -> Context {
        Context::new(Arc::clone(self), root)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("options", &self.options)
            .field("decoders", &self.decoders)
            .field("factories", &self.factories)
            .field("caching", &self.caching)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::Key;

    #[derive(Deserialize)]
    struct Port {
        #[allow(dead_code)]
        port: u16,
    }

    fn key(s: &str) -> Key {
        Key::parse(s).unwrap()
    }

    #[test]
    fn test_register_type_fills_maps() {
        let registry = TypeRegistry::new();
        registry
            .register_type(
                TypeSpec::builder(key("net:listener"))
                    .data::<Port>()
                    .cached(true)
                    .build(|_| Ok(())),
            )
            .unwrap();
        registry
            .register_type(TypeSpec::builder(key("net:noop")).build(|_| Ok(())))
            .unwrap();

        assert!(registry.decoders().contains(&key("net:listener")));
        assert!(registry.factories().contains(&key("net:listener")));
        assert_eq!(registry.caching().get(&key("net:listener")), Some(true));

        assert!(!registry.decoders().contains(&key("net:noop")));
        assert!(registry.factories().contains(&key("net:noop")));
        assert_eq!(registry.caching().get(&key("net:noop")), None);
    }

    #[test]
    fn test_duplicate_type_is_rejected_whole() {
        let registry = TypeRegistry::new();
        registry
            .register_type(TypeSpec::builder(key("net:noop")).build(|_| Ok(())))
            .unwrap();

        let result = registry.register_type(
            TypeSpec::builder(key("net:noop"))
                .data::<Port>()
                .cached(false)
                .build(|_| Ok(())),
        );
        assert!(matches!(result, Err(RegistrationError::Duplicate { .. })));
        assert!(!registry.decoders().contains(&key("net:noop")));
        assert_eq!(registry.caching().get(&key("net:noop")), None);
    }

    #[test]
    fn test_malformed_plan_registers_nothing() {
        let registry = TypeRegistry::new();
        let result =
            registry.register_type(TypeSpec::builder(key("net:broken")).data_slot().build(|_| Ok(())));

        assert!(matches!(
            result,
            Err(RegistrationError::DataSlotWithoutDecoder { .. })
        ));
        assert!(registry.factories().is_empty());
    }
}
