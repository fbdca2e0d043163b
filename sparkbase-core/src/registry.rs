//! Type-keyed registry of [`DataAdapter`]s.
//!
//! Adapters are registered explicitly at startup and looked up by exact type
//! identity; there is no fallback to related types. The registry is usually
//! built once with [`AdapterRegistry::builder`] and then shared behind an
//! `Arc` by every collection of a store.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use tracing::debug;

use crate::{
    adapter::{DataAdapter, DocumentedAdapter},
    document::{Documented, short_type_name},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Shared handle to the adapter registered for `T`.
pub type AdapterRef<T> = Arc<dyn DataAdapter<T>>;

struct RegisteredAdapter {
    type_name: String,
    // Always an `AdapterRef<T>` for the `T` whose `TypeId` keys this entry.
    adapter: Box<dyn Any + Send + Sync>,
}

/// Maps application types to the adapter responsible for them.
///
/// Invariant: at most one adapter per type.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<TypeId, RegisteredAdapter>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for assembling a registry at startup.
    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder::new()
    }

    /// Registers `adapter` as the adapter for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DuplicateAdapter`] if `T` already has an adapter.
    pub fn register<T, A>(&mut self, adapter: A) -> DocumentStoreResult<()>
    where
        T: 'static,
        A: DataAdapter<T> + 'static,
    {
        self.insert::<T>(short_type_name::<T>(), Arc::new(adapter))
    }

    /// Registers the [`DocumentedAdapter`] for a self-mapping type.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DuplicateAdapter`] if `T` already has an adapter.
    pub fn register_documented<T: Documented>(&mut self) -> DocumentStoreResult<()> {
        self.insert::<T>(T::type_name().to_string(), Arc::new(DocumentedAdapter::<T>::new()))
    }

    fn insert<T: 'static>(&mut self, type_name: String, adapter: AdapterRef<T>) -> DocumentStoreResult<()> {
        let key = TypeId::of::<T>();

        if self.adapters.contains_key(&key) {
            return Err(DocumentStoreError::DuplicateAdapter(type_name));
        }

        debug!(type_name = %type_name, "Adapter registered");
        self.adapters.insert(key, RegisteredAdapter { type_name, adapter: Box::new(adapter) });

        Ok(())
    }

    /// Returns the adapter for `T`, or `None` when the type was never registered.
    pub fn lookup<T: 'static>(&self) -> Option<AdapterRef<T>> {
        self.adapters
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.adapter.downcast_ref::<AdapterRef<T>>())
            .cloned()
    }

    /// Returns the adapter for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnregisteredType`] naming `T` when no adapter exists.
    pub fn require<T: 'static>(&self) -> DocumentStoreResult<AdapterRef<T>> {
        self.lookup::<T>()
            .ok_or_else(|| DocumentStoreError::UnregisteredType(short_type_name::<T>()))
    }

    /// Returns `true` if an adapter is registered for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.adapters.contains_key(&TypeId::of::<T>())
    }

    /// Display names of every registered type, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names = self
            .adapters
            .values()
            .map(|entry| entry.type_name.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// Builder for an [`AdapterRegistry`].
///
/// Registration errors are deferred until [`build`](AdapterRegistryBuilder::build)
/// so the chain stays fluent; the first error wins.
#[derive(Default)]
pub struct AdapterRegistryBuilder {
    registry: AdapterRegistry,
    error: Option<DocumentStoreError>,
}

impl AdapterRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an adapter for `T`.
    pub fn with_adapter<T, A>(mut self, adapter: A) -> Self
    where
        T: 'static,
        A: DataAdapter<T> + 'static,
    {
        if self.error.is_none() {
            self.error = self.registry.register::<T, A>(adapter).err();
        }
        self
    }

    /// Adds the [`DocumentedAdapter`] for `T`.
    pub fn with_documented<T: Documented>(mut self) -> Self {
        if self.error.is_none() {
            self.error = self.registry.register_documented::<T>().err();
        }
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns the first registration error, typically [`DocumentStoreError::DuplicateAdapter`].
    pub fn build(self) -> DocumentStoreResult<AdapterRegistry> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapter::FnAdapter, document::Document};
    use bson::doc;
    use serde::{Deserialize, Serialize};
    use sparkbase_macros::Documented;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Documented)]
    struct Guild {
        name: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Ticket(u32);

    fn ticket_adapter() -> FnAdapter<Ticket> {
        FnAdapter::new(
            |ticket: &Ticket| Ok(doc! { "number": ticket.0 as i64 }),
            |document: &Document| {
                document
                    .get_i64("number")
                    .map(|n| Ticket(n as u32))
                    .map_err(|e| DocumentStoreError::Serialization(e.to_string()))
            },
        )
    }

    #[test]
    fn test_lookup_missing_is_none() {
        let registry = AdapterRegistry::new();

        assert!(registry.lookup::<Guild>().is_none());
        assert!(!registry.contains::<Guild>());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = AdapterRegistry::new();
        registry.register_documented::<Guild>().unwrap();
        registry.register::<Ticket, _>(ticket_adapter()).unwrap();

        let guild = Guild { name: "builders".to_string() };
        let adapter = registry.lookup::<Guild>().unwrap();
        let document = adapter.serialize(&guild).unwrap();
        assert_eq!(adapter.deserialize(&document).unwrap(), guild);

        let tickets = registry.require::<Ticket>().unwrap();
        assert_eq!(tickets.serialize(&Ticket(7)).unwrap(), doc! { "number": 7_i64 });

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.type_names(), vec!["Guild", "Ticket"]);
    }

    #[test]
    fn test_lookup_is_exact_type() {
        let mut registry = AdapterRegistry::new();
        registry.register_documented::<Guild>().unwrap();

        assert!(registry.lookup::<Ticket>().is_none());
        assert!(registry.lookup::<Vec<Guild>>().is_none());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = AdapterRegistry::new();
        registry.register_documented::<Guild>().unwrap();

        let err = registry.register_documented::<Guild>().unwrap_err();
        assert!(matches!(err, DocumentStoreError::DuplicateAdapter(ref name) if name == "Guild"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_require_names_unregistered_type() {
        let registry = AdapterRegistry::new();

        let err = registry.require::<Ticket>().err().unwrap();
        assert!(matches!(err, DocumentStoreError::UnregisteredType(ref name) if name == "Ticket"));
        assert!(err.to_string().contains("\"Ticket\""));
    }

    #[test]
    fn test_builder_reports_first_error() {
        let err = AdapterRegistry::builder()
            .with_documented::<Guild>()
            .with_adapter::<Ticket, _>(ticket_adapter())
            .with_documented::<Guild>()
            .build()
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::DuplicateAdapter(_)));

        let registry = AdapterRegistry::builder()
            .with_documented::<Guild>()
            .with_adapter::<Ticket, _>(ticket_adapter())
            .build()
            .unwrap();
        assert!(registry.contains::<Guild>() && registry.contains::<Ticket>());
    }
}
