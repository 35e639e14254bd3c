//! Factory plans: how decoded data and dependencies become objects.
//!
//! A plan is computed once per type at registration time. It is an ordered
//! list of argument [`Slot`]s plus a constructor closure. At construction time
//! the plan is replayed: the data slot receives the decoded value, each
//! dependency slot is filled from the caller's
//! [`DependencyProvider`](crate::DependencyProvider), and the closure receives
//! the filled [`Arguments`].

mod arguments;
mod inspector;
mod spec;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use toml::Value;

use crate::context::Context;
use crate::dependency::DependencyProvider;
use crate::path::ElementPath;
use crate::{Error, Key};

pub use arguments::Arguments;
pub use inspector::{ElementInspector, Inspection, PlanInspector};
pub use spec::{TypeSpec, TypeSpecBuilder};

/// A constructed object or decoded data value.
pub type Object = Arc<dyn Any + Send + Sync>;

/// Error type accepted from user decoders, factories and suppliers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type DecodeFn = dyn Fn(&Value) -> Result<Object, BoxError> + Send + Sync;
pub(crate) type Constructor = dyn Fn(&Arguments<'_>) -> Result<Object, BoxError> + Send + Sync;

/// Turns a configuration subtree into a typed data value.
#[derive(Clone)]
pub struct Decoder {
    decode: Arc<DecodeFn>,
}

impl Decoder {
    /// A decoder backed by serde deserialization of the subtree.
    pub fn serde<D>() -> Self
    where
        D: DeserializeOwned + Send + Sync + 'static,
    {
        Self::new(|tree: &Value| Ok(tree.clone().try_into::<D>()?))
    }

    pub fn new<D, F>(decode: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&Value) -> Result<D, BoxError> + Send + Sync + 'static,
    {
        Self {
            decode: erase_decode(move |tree| Ok(Arc::new(decode(tree)?) as Object)),
        }
    }

    pub fn decode(&self, tree: &Value) -> Result<Object, BoxError> {
        (self.decode)(tree)
    }
}

fn erase_decode<F>(decode: F) -> Arc<DecodeFn>
where
    F: Fn(&Value) -> Result<Object, BoxError> + Send + Sync + 'static,
{
    Arc::new(decode)
}

pub(crate) fn erase_constructor<F>(construct: F) -> Arc<Constructor>
where
    F: Fn(&Arguments<'_>) -> Result<Object, BoxError> + Send + Sync + 'static,
{
    Arc::new(construct)
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decoder(..)")
    }
}

/// One constructor argument position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Receives the decoded configuration data.
    Data,
    /// Receives an externally supplied value.
    Dependency { type_key: Key, name: Option<Key> },
}

/// The reusable construction recipe for one type key.
#[derive(Clone)]
pub struct FactoryPlan {
    key: Key,
    slots: Arc<[Slot]>,
    construct: Arc<Constructor>,
}

impl FactoryPlan {
    pub(crate) fn new(key: Key, slots: Vec<Slot>, construct: Arc<Constructor>) -> Self {
        Self {
            key,
            slots: slots.into(),
            construct,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn has_data_slot(&self) -> bool {
        self.slots.contains(&Slot::Data)
    }

    /// Fills every slot and runs the constructor.
    pub(crate) fn construct(
        &self,
        data: &Object,
        path: &ElementPath,
        context: &Context,
        dependencies: &dyn DependencyProvider,
        cache_hint: bool,
    ) -> Result<Object, Error> {
        let mut values = Vec::with_capacity(self.slots.len());
        for slot in self.slots.iter() {
            let value = match slot {
                Slot::Data => Arc::clone(data),
                Slot::Dependency { type_key, name } => {
                    dependencies.provide(type_key, name.as_ref())?
                }
            };
            values.push(value);
        }

        let arguments = Arguments {
            key: &self.key,
            path,
            context,
            dependencies,
            cache_hint,
            slots: &self.slots,
            values,
        };
        (self.construct)(&arguments).map_err(Error::from_boxed)
    }
}

impl fmt::Debug for FactoryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryPlan")
            .field("key", &self.key)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

/// A type that describes its own registration.
///
/// ```
/// use confweave::{Element, Key, TypeRegistry, TypeSpec};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct GreeterData {
///     greeting: String,
/// }
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Element for Greeter {
///     fn spec() -> TypeSpec {
///         TypeSpec::builder(Key::parse("demo:greeter").unwrap())
///             .data::<GreeterData>()
///             .build(|args| {
///                 let data = args.data::<GreeterData>()?;
///                 Ok(Greeter { greeting: data.greeting.clone() })
///             })
///     }
/// }
///
/// let registry = TypeRegistry::new();
/// registry.register::<Greeter>().unwrap();
/// ```
pub trait Element: Any + Send + Sync {
    fn spec() -> TypeSpec;
}
