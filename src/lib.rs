//! Resolve a configuration tree into a graph of live objects.
//!
//! Elements of the tree name their type with a discriminator field. Types are
//! registered once in a [`TypeRegistry`] with a decoder for their data and a
//! factory plan listing the dependencies they need. A [`Context`] then walks
//! paths on demand, memoizing discovered types, decoded data and, where
//! caching applies, constructed objects.

pub mod config;
pub mod context;
pub mod dependency;
pub mod factory;
pub mod key;
pub mod path;
pub mod registry;

mod error;

pub use config::{Config, ConfigError};
pub use context::{Context, ContextOptions, Request};
pub use dependency::{
    CompositeProvider, DependencyError, DependencyProvider, DependencyProviderExt, Module,
    ModuleProvider, NoDependencies, Supplier,
};
pub use error::Error;
pub use factory::{
    Arguments, BoxError, Decoder, Element, ElementInspector, FactoryPlan, Inspection, Object,
    PlanInspector, Slot, TypeSpec, TypeSpecBuilder,
};
pub use key::{Key, KeyError};
pub use path::{ElementPath, Node, PathError};
pub use registry::{LookupError, RegistrationError, Registry, TypeRegistry};
