use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DependencyError, DependencyProvider};
use crate::factory::{BoxError, Object};
use crate::registry::RegistrationError;
use crate::Key;

type SupplyFn = dyn Fn(Option<&Key>) -> Result<Object, BoxError> + Send + Sync;

/// One way of producing a dependency of a given type key.
///
/// The closure receives the name the caller asked for, which matters for an
/// unnamed supplier that serves every name.
#[derive(Clone)]
pub struct Supplier {
    type_key: Key,
    name: Option<Key>,
    memoized: bool,
    supply: Arc<SupplyFn>,
}

impl Supplier {
    pub fn new<T, F>(type_key: Key, supply: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Option<&Key>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            type_key,
            name: None,
            memoized: false,
            supply: erase_supply(move |name| Ok(Arc::new(supply(name)?) as Object)),
        }
    }

    /// A supplier that hands out the same shared value every time.
    pub fn value<T: Any + Send + Sync>(type_key: Key, value: T) -> Self {
        let value: Object = Arc::new(value);
        Self {
            type_key,
            name: None,
            memoized: false,
            supply: erase_supply(move |_| Ok(Arc::clone(&value))),
        }
    }

    pub fn named(mut self, name: Key) -> Self {
        self.name = Some(name);
        self
    }

    /// Invoke at most once: once overall when unnamed, once per requested
    /// name when named.
    pub fn memoized(mut self) -> Self {
        self.memoized = true;
        self
    }

    pub fn type_key(&self) -> &Key {
        &self.type_key
    }

    pub fn name(&self) -> Option<&Key> {
        self.name.as_ref()
    }
}

fn erase_supply<F>(supply: F) -> Arc<SupplyFn>
where
    F: Fn(Option<&Key>) -> Result<Object, BoxError> + Send + Sync + 'static,
{
    Arc::new(supply)
}

impl std::fmt::Debug for Supplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supplier")
            .field("type_key", &self.type_key)
            .field("name", &self.name)
            .field("memoized", &self.memoized)
            .finish_non_exhaustive()
    }
}

/// A plain object that exposes suppliers.
///
/// ```
/// use std::sync::Arc;
///
/// use confweave::{DependencyProviderExt, Key, Module, ModuleProvider, Supplier};
///
/// struct Services {
///     base_url: String,
/// }
///
/// impl Module for Services {
///     fn suppliers(self: Arc<Self>) -> Vec<Supplier> {
///         vec![Supplier::new(Key::parse("http:base-url").unwrap(), move |_| {
///             Ok(self.base_url.clone())
///         })]
///     }
/// }
///
/// let provider = ModuleProvider::from_module(Arc::new(Services {
///     base_url: "https://example.com".into(),
/// }))
/// .unwrap();
/// let url = provider
///     .provide_as::<String>(&Key::parse("http:base-url").unwrap(), None)
///     .unwrap();
/// assert_eq!(url.as_str(), "https://example.com");
/// ```
pub trait Module: Send + Sync + 'static {
    fn suppliers(self: Arc<Self>) -> Vec<Supplier>;
}

struct SupplierEntry {
    supplier: Supplier,
    memo: Mutex<HashMap<Option<Key>, Object>>,
}

/// Provides dependencies from a fixed set of suppliers.
///
/// When several suppliers share a type key every one of them must be named;
/// a sole supplier is also returned for requests that carry no name.
pub struct ModuleProvider {
    by_type: HashMap<Key, Vec<SupplierEntry>>,
}

impl ModuleProvider {
    pub fn new(suppliers: impl IntoIterator<Item = Supplier>) -> Result<Self, RegistrationError> {
        let mut by_type: HashMap<Key, Vec<SupplierEntry>> = HashMap::new();
        for supplier in suppliers {
            by_type
                .entry(supplier.type_key.clone())
                .or_default()
                .push(SupplierEntry {
                    supplier,
                    memo: Mutex::new(HashMap::new()),
                });
        }

        for (type_key, entries) in &by_type {
            if entries.len() < 2 {
                continue;
            }
            if entries.iter().any(|entry| entry.supplier.name.is_none()) {
                return Err(RegistrationError::AmbiguousSupplier {
                    type_key: type_key.clone(),
                });
            }
            for (i, entry) in entries.iter().enumerate() {
                let name = &entry.supplier.name;
                if entries[..i].iter().any(|other| other.supplier.name == *name) {
                    return Err(RegistrationError::DuplicateSupplier {
                        type_key: type_key.clone(),
                        name: name.as_ref().map(Key::to_string).unwrap_or_default(),
                    });
                }
            }
        }

        tracing::debug!(types = by_type.len(), "module provider assembled");
        Ok(Self { by_type })
    }

    pub fn from_module<M: Module>(module: Arc<M>) -> Result<Self, RegistrationError> {
        Self::new(module.suppliers())
    }

    fn select(&self, type_key: &Key, name: Option<&Key>) -> Result<&SupplierEntry, DependencyError> {
        let not_found = || DependencyError::NotFound {
            type_key: type_key.clone(),
            name: name.cloned(),
        };
        let entries = self.by_type.get(type_key).ok_or_else(not_found)?;

        match (name, entries.as_slice()) {
            (None, [only]) => Ok(only),
            (None, _) => Err(DependencyError::NameRequired {
                type_key: type_key.clone(),
                candidates: entries.len(),
            }),
            (Some(name), entries) => entries
                .iter()
                .find(|entry| entry.supplier.name.as_ref() == Some(name))
                .or(match entries {
                    [only] if only.supplier.name.is_none() => Some(only),
                    _ => None,
                })
                .ok_or_else(not_found),
        }
    }

    fn invoke(&self, entry: &SupplierEntry, name: Option<&Key>) -> Result<Object, DependencyError> {
        let supplier = &entry.supplier;
        let call = || {
            (supplier.supply)(name).map_err(|source| DependencyError::Supplier {
                type_key: supplier.type_key.clone(),
                source,
            })
        };

        if !supplier.memoized {
            return call();
        }

        // Unnamed suppliers share one slot; named ones are keyed by the requested name.
        let memo_key = supplier.name.as_ref().and(name).cloned();
        if let Some(value) = entry.memo.lock().get(&memo_key) {
            return Ok(Arc::clone(value));
        }

        // The supplier runs unlocked and may call back into this provider.
        let value = call()?;
        let mut memo = entry.memo.lock();
        Ok(Arc::clone(memo.entry(memo_key).or_insert(value)))
    }
}

impl DependencyProvider for ModuleProvider {
    fn has_dependency(&self, type_key: &Key, name: Option<&Key>) -> bool {
        self.select(type_key, name).is_ok()
    }

    fn provide(&self, type_key: &Key, name: Option<&Key>) -> Result<Object, DependencyError> {
        let entry = self.select(type_key, name)?;
        self.invoke(entry, name)
    }
}

impl std::fmt::Debug for ModuleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suppliers: Vec<&Supplier> = self
            .by_type
            .values()
            .flat_map(|entries| entries.iter().map(|entry| &entry.supplier))
            .collect();
        f.debug_struct("ModuleProvider")
            .field("suppliers", &suppliers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{OnceLock, Weak};

    use super::*;
    use crate::dependency::DependencyProviderExt;

    fn key(s: &str) -> Key {
        Key::parse(s).unwrap()
    }

    fn counting(type_key: &str, calls: &Arc<AtomicUsize>) -> Supplier {
        let calls = Arc::clone(calls);
        Supplier::new(key(type_key), move |name: Option<&Key>| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(name.map(Key::to_string).unwrap_or_else(|| "anonymous".into()))
        })
    }

    #[test]
    fn test_two_unnamed_suppliers_are_ambiguous() {
        let result = ModuleProvider::new([
            Supplier::value(key("svc"), 1i64),
            Supplier::value(key("svc"), 2i64),
        ]);
        assert!(matches!(
            result,
            Err(RegistrationError::AmbiguousSupplier { .. })
        ));
    }

    #[test]
    fn test_one_unnamed_among_named_is_ambiguous() {
        let result = ModuleProvider::new([
            Supplier::value(key("svc"), 1i64).named(key("primary")),
            Supplier::value(key("svc"), 2i64),
        ]);
        assert!(matches!(
            result,
            Err(RegistrationError::AmbiguousSupplier { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let result = ModuleProvider::new([
            Supplier::value(key("svc"), 1i64).named(key("primary")),
            Supplier::value(key("svc"), 2i64).named(key("primary")),
        ]);
        assert!(matches!(
            result,
            Err(RegistrationError::DuplicateSupplier { .. })
        ));
    }

    #[test]
    fn test_named_lookup() {
        let provider = ModuleProvider::new([
            Supplier::value(key("svc"), 1i64).named(key("primary")),
            Supplier::value(key("svc"), 2i64).named(key("backup")),
        ])
        .unwrap();

        let primary = provider
            .provide_as::<i64>(&key("svc"), Some(&key("primary")))
            .unwrap();
        let backup = provider
            .provide_as::<i64>(&key("svc"), Some(&key("backup")))
            .unwrap();
        assert_eq!((*primary, *backup), (1, 2));

        assert!(matches!(
            provider.provide(&key("svc"), None),
            Err(DependencyError::NameRequired { candidates: 2, .. })
        ));
        assert!(matches!(
            provider.provide(&key("svc"), Some(&key("other"))),
            Err(DependencyError::NotFound { .. })
        ));
        assert!(!provider.has_dependency(&key("svc"), None));
    }

    #[test]
    fn test_sole_supplier_serves_unnamed_and_named_requests() {
        let provider =
            ModuleProvider::new([Supplier::value(key("svc"), 5i64).named(key("primary"))]).unwrap();
        assert_eq!(*provider.provide_as::<i64>(&key("svc"), None).unwrap(), 5);

        let provider = ModuleProvider::new([Supplier::value(key("svc"), 6i64)]).unwrap();
        assert_eq!(
            *provider
                .provide_as::<i64>(&key("svc"), Some(&key("anything")))
                .unwrap(),
            6
        );
    }

    #[test]
    fn test_unnamed_memoized_supplier_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ModuleProvider::new([counting("label", &calls).memoized()]).unwrap();

        let a1 = provider.provide(&key("label"), Some(&key("a"))).unwrap();
        let a2 = provider.provide(&key("label"), Some(&key("a"))).unwrap();
        let b = provider.provide_as::<String>(&key("label"), Some(&key("b"))).unwrap();
        let unnamed = provider.provide(&key("label"), None).unwrap();

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(Arc::ptr_eq(&a1, &unnamed));
        assert_eq!(b.as_str(), "confweave:a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unmemoized_runs_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ModuleProvider::new([counting("label", &calls)]).unwrap();

        provider.provide(&key("label"), None).unwrap();
        provider.provide(&key("label"), None).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_named_memoized_supplier_is_keyed_by_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider =
            ModuleProvider::new([counting("label", &calls).named(key("only")).memoized()]).unwrap();

        let named = provider.provide(&key("label"), Some(&key("only"))).unwrap();
        provider.provide(&key("label"), None).unwrap();
        let again = provider.provide(&key("label"), Some(&key("only"))).unwrap();
        provider.provide(&key("label"), None).unwrap();

        assert!(Arc::ptr_eq(&named, &again));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_memoized_supplier_may_reenter_provider() {
        let slot: Arc<OnceLock<Weak<ModuleProvider>>> = Arc::new(OnceLock::new());
        let handle = Arc::clone(&slot);
        let supplier = Supplier::new(key("svc"), move |name: Option<&Key>| match name {
            Some(_) => Ok(7i64),
            None => {
                let provider = handle
                    .get()
                    .and_then(Weak::upgrade)
                    .ok_or("provider dropped")?;
                let inner = provider.provide_as::<i64>(&key("svc"), Some(&key("primary")))?;
                Ok(*inner + 1)
            }
        })
        .named(key("primary"))
        .memoized();

        let provider = Arc::new(ModuleProvider::new([supplier]).unwrap());
        slot.set(Arc::downgrade(&provider)).unwrap();

        assert_eq!(*provider.provide_as::<i64>(&key("svc"), None).unwrap(), 8);
        assert_eq!(
            *provider
                .provide_as::<i64>(&key("svc"), Some(&key("primary")))
                .unwrap(),
            7
        );
    }

    #[test]
    fn test_supplier_failure_is_reported() {
        let provider = ModuleProvider::new([Supplier::new(key("svc"), |_| {
            Err::<i64, BoxError>("backend unavailable".into())
        })])
        .unwrap();

        let err = provider.provide(&key("svc"), None).unwrap_err();
        assert!(matches!(err, DependencyError::Supplier { .. }));
        assert!(err.to_string().contains("backend unavailable"));
    }
}
