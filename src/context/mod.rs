//! The resolution context: turns paths in a configuration tree into objects.
//!
//! Each path moves through `unresolved -> type known -> data decoded ->
//! object built` and never goes back. Every step is memoized per path, so a
//! path's type is discovered once, its data decoded once and, when caching
//! applies, its object built once.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use confweave::{Key, TypeRegistry, TypeSpec};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct PortData {
//!     port: u16,
//! }
//!
//! struct Listener {
//!     port: u16,
//! }
//!
//! let registry = Arc::new(TypeRegistry::new());
//! registry.register_type(
//!     TypeSpec::builder(Key::parse("net:listener").unwrap())
//!         .data::<PortData>()
//!         .build(|args| Ok(Listener { port: args.data::<PortData>()?.port })),
//! )?;
//!
//! let root: toml::Value = toml::from_str(
//!     r#"
//!     [http]
//!     type = "net:listener"
//!     port = 8080
//!     "#,
//! )
//! .unwrap();
//!
//! let context = registry.make_context(root);
//! let listener = context.provide::<Listener>("/http")?;
//! assert_eq!(listener.port, 8080);
//! # Ok::<(), confweave::Error>(())
//! ```
//!
//! Cyclic references between elements are not detected; a factory that
//! resolves its own path, directly or through other elements, recurses until
//! the stack overflows.

mod cache;
mod defaults;
mod options;


use std::any::{type_name, Any};
use std::sync::Arc;

use toml::Value;

use self::cache::PathCache;
use self::defaults::{overlay, Defaults};
use crate::config::ConfigError;
use crate::dependency::{DependencyProvider, NoDependencies};
use crate::factory::Object;
use crate::path::{ElementPath, PathError};
use crate::registry::TypeRegistry;
use crate::{Error, Key};

pub use options::ContextOptions;

static NO_DEPENDENCIES: NoDependencies = NoDependencies;

/// Resolution state for one configuration tree.
///
/// Safe to share across threads. Caches only grow; a context is meant to
/// live as long as the configuration load it serves.
pub struct Context {
    registry: Arc<TypeRegistry>,
    root: Arc<Value>,
    types: PathCache<Key>,
    data: PathCache<(Object, Key)>,
    objects: PathCache<Object>,
    defaults: Defaults,
}

impl Context {
    pub fn new(registry: Arc<TypeRegistry>, root: Value) -> Self {
        Self {
            registry,
            root: Arc::new(root),
            types: PathCache::new(),
            data: PathCache::new(),
            objects: PathCache::new(),
            defaults: Defaults::new(),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Registers `fragment` as fallback configuration for `path` and
    /// everything beneath it.
    pub fn register_defaults(&self, path: impl Into<ElementPath>, fragment: Value) {
        let path = path.into().to_absolute();
        if self.defaults.register(path.clone(), fragment) {
            tracing::debug!(path = %path, "defaults registered");
        }
    }

    /// The configuration at `path`, with the nearest overlay filling any
    /// fields the real tree lacks.
    ///
    /// An overlay also stands in for a subtree missing from the real tree,
    /// but never for one that is unreachable because of a scalar or an
    /// invalid list index on the way.
    pub fn follow(&self, path: impl Into<ElementPath>) -> Result<Value, Error> {
        let path = path.into().to_absolute();
        let default = self.defaults.nearest(&path);

        match (path.follow(&self.root), default) {
            (Ok(real), default) => Ok(overlay(real, default)),
            // Only absent keys are filled in; a scalar or bad index on the way stays an error.
            (Err(PathError::MissingKey { .. }), Some(default)) => Ok(default),
            (Err(source), _) => Err(ConfigError::Navigation { path, source }.into()),
        }
    }

    /// The type key of the element at `path`.
    pub fn type_of(&self, path: impl Into<ElementPath>) -> Result<Key, Error> {
        let path = path.into().to_absolute();
        self.discover(&path, None).map_err(|err| err.at(path))
    }

    /// Starts a request for the element at `path`.
    pub fn request(&self, path: impl Into<ElementPath>) -> Request<'_> {
        Request {
            context: self,
            path: path.into(),
            substitute: None,
            dependencies: &NO_DEPENDENCIES,
            cached: false,
        }
    }

    /// Resolves `path` with no dependencies and no caching hint.
    pub fn provide<T: Any + Send + Sync>(&self, path: impl Into<ElementPath>) -> Result<Arc<T>, Error> {
        self.request(path).provide()
    }

    /// Resolves every child of the table or list at `path`.
    ///
    /// All children are attempted; failures are reported together.
    pub fn provide_each<T: Any + Send + Sync>(
        &self,
        path: impl Into<ElementPath>,
        dependencies: &dyn DependencyProvider,
        cached: bool,
    ) -> Result<Vec<(ElementPath, Arc<T>)>, Error> {
        let path = path.into().to_absolute();
        let children: Vec<ElementPath> = match self.follow(path.clone())? {
            Value::Table(table) => table.keys().map(|key| path.join(key.as_str())).collect(),
            Value::Array(items) => (0..items.len()).map(|i| path.join(i.to_string())).collect(),
            _ => return Err(ConfigError::NotACollection { path }.into()),
        };

        let mut provided = Vec::with_capacity(children.len());
        let mut failures = Vec::new();
        for child in children {
            let result = self
                .request(child.clone())
                .with_dependencies(dependencies)
                .cached(cached)
                .provide::<T>();
            match result {
                Ok(object) => provided.push((child, object)),
                Err(err) => failures.push(err),
            }
        }

        if failures.is_empty() {
            Ok(provided)
        } else {
            tracing::debug!(path = %path, failed = failures.len(), "bulk load failed");
            Err(Error::Multiple(failures))
        }
    }

    fn resolve(
        &self,
        path: &ElementPath,
        substitute: Option<&Value>,
        dependencies: &dyn DependencyProvider,
        cache_hint: bool,
    ) -> Result<(Key, Object), Error> {
        let key = self.discover(path, substitute)?;
        let cached = self.registry.caching().get(&key).unwrap_or(cache_hint);

        if cached {
            if let Some(object) = self.objects.get(path) {
                tracing::trace!(path = %path, key = %key, "object cache hit");
                return Ok((key, object));
            }
        }

        let data = self.decode(path, &key, substitute)?;
        let plan = self.registry.factories().lookup(&key)?;
        let object = plan.construct(&data, path, self, dependencies, cache_hint)?;
        tracing::debug!(path = %path, key = %key, cached, "element constructed");

        if !cached {
            return Ok((key, object));
        }
        let (object, won) = self.objects.insert_if_absent(path.clone(), object);
        if !won {
            tracing::warn!(path = %path, key = %key, "concurrent construction lost, using stored object");
        }
        Ok((key, object))
    }

    fn discover(&self, path: &ElementPath, substitute: Option<&Value>) -> Result<Key, Error> {
        if let Some(key) = self.types.get(path) {
            return Ok(key);
        }

        let tree = self.locate(path, substitute)?;
        let key = self.discriminate(&tree)?;
        tracing::debug!(path = %path, key = %key, "type discovered");
        Ok(self.types.insert_if_absent(path.clone(), key).0)
    }

    fn decode(
        &self,
        path: &ElementPath,
        key: &Key,
        substitute: Option<&Value>,
    ) -> Result<Object, Error> {
        if let Some((data, _)) = self.data.get(path) {
            tracing::trace!(path = %path, key = %key, "data cache hit");
            return Ok(data);
        }

        let data = match self.registry.decoders().get(key) {
            Some(decoder) => {
                let tree = self.locate(path, substitute)?;
                decoder
                    .decode(&tree)
                    .map_err(|source| ConfigError::Decode {
                        key: key.clone(),
                        source,
                    })?
            }
            None if self.registry.factories().contains(key) => Arc::new(()) as Object,
            None => return Err(ConfigError::UnknownType { key: key.clone() }.into()),
        };
        tracing::debug!(path = %path, key = %key, "data decoded");

        let ((data, _), won) = self
            .data
            .insert_if_absent(path.clone(), (data, key.clone()));
        if !won {
            tracing::warn!(path = %path, key = %key, "concurrent decode lost, using stored data");
        }
        Ok(data)
    }

    fn locate(&self, path: &ElementPath, substitute: Option<&Value>) -> Result<Value, Error> {
        match substitute {
            Some(tree) => Ok(tree.clone()),
            None => self.follow(path.clone()),
        }
    }

    fn discriminate(&self, tree: &Value) -> Result<Key, ConfigError> {
        let options = self.registry.options();
        let field = || options.type_field.clone();

        let value = tree
            .as_table()
            .and_then(|table| table.get(&options.type_field))
            .ok_or_else(|| ConfigError::MissingDiscriminator { field: field() })?;
        let text = value
            .as_str()
            .ok_or_else(|| ConfigError::DiscriminatorNotAString { field: field() })?;

        Key::parse_in(text, &options.default_namespace)
            .map_err(|source| ConfigError::InvalidDiscriminator {
                field: field(),
                source,
            })
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("types", &self.types.len())
            .field("data", &self.data.len())
            .field("objects", &self.objects.len())
            .finish_non_exhaustive()
    }
}

/// A pending [`Context`] resolution.
#[must_use = "requests do nothing until .provide() is called"]
pub struct Request<'a> {
    context: &'a Context,
    path: ElementPath,
    substitute: Option<&'a Value>,
    dependencies: &'a dyn DependencyProvider,
    cached: bool,
}

impl<'a> Request<'a> {
    pub fn with_dependencies(mut self, dependencies: &'a dyn DependencyProvider) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Caching hint, used unless the element's type forces a preference.
    pub fn cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    /// Reads the element from `tree` instead of from the context's root.
    ///
    /// Only consulted while the path's type or data is not yet known.
    pub fn with_substitute(mut self, tree: &'a Value) -> Self {
        self.substitute = Some(tree);
        self
    }

    pub fn provide_object(self) -> Result<Object, Error> {
        self.resolve().map(|(_, object)| object)
    }

    pub fn provide<T: Any + Send + Sync>(self) -> Result<Arc<T>, Error> {
        let path = self.path.to_absolute();
        let (key, object) = self.resolve()?;

        object.downcast::<T>().map_err(|_| {
            Error::from(ConfigError::UnexpectedType {
                key,
                expected: type_name::<T>(),
            })
            .at(path)
        })
    }

    fn resolve(self) -> Result<(Key, Object), Error> {
        let path = self.path.to_absolute();
        self.context
            .resolve(&path, self.substitute, self.dependencies, self.cached)
            .map_err(|err| err.at(path))
    }
}
