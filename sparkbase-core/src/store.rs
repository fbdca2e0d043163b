//! The entry point tying a backend to an adapter registry.
//!
//! - [`DocumentStore`]: statically dispatched over its backend type
//! - [`DynDocumentStore`]: boxed backend chosen at runtime
//!
//! # Example
//!
//! ```ignore
//! use sparkbase::prelude::*;
//! use sparkbase::memory::InMemoryStore;
//!
//! let adapters = AdapterRegistry::builder()
//!     .with_documented::<Player>()
//!     .build()?;
//!
//! let store = DocumentStore::new(InMemoryStore::new(), adapters);
//! let players = store.collection("players");
//! ```

use std::sync::Arc;

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::Collection,
    error::DocumentStoreResult,
    registry::AdapterRegistry,
};

/// A backend plus the adapters used to map objects into it.
///
/// The registry is shared behind an `Arc`, so several stores (for example
/// one per database) can reuse a single registry built at startup.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
    adapters: Arc<AdapterRegistry>,
}

/// A [`DocumentStore`] whose backend is selected at runtime.
pub type DynDocumentStore = DocumentStore<Box<dyn DynStoreBackend>>;

impl<B: StoreBackend> DocumentStore<B> {
    pub fn new(backend: B, adapters: impl Into<Arc<AdapterRegistry>>) -> Self {
        Self {
            backend,
            adapters: adapters.into(),
        }
    }

    /// Returns the facade for the collection called `name`.
    ///
    /// Nothing is checked or created here; a missing collection simply scans as empty.
    pub fn collection(&self, name: impl Into<String>) -> Collection<'_, B> {
        Collection::new(name.into(), &self.backend, &self.adapters)
    }

    pub fn adapters(&self) -> &Arc<AdapterRegistry> {
        &self.adapters
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails to create the collection.
    pub async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::create_collection(&self.backend, name).await
    }

    /// Drops a collection and all of its records.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist or deletion fails.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::drop_collection(&self.backend, name).await
    }

    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collections(&self.backend).await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(self.backend).await
    }
}

impl DynDocumentStore {
    /// Returns the backend as `B` if that is its concrete type.
    pub fn downcast_backend<B: StoreBackend + 'static>(&self) -> Option<&B> {
        DynStoreBackend::as_any(&*self.backend).downcast_ref::<B>()
    }

    /// Converts back into a statically dispatched store if the backend is a `B`.
    pub fn into_static<B: StoreBackend + 'static>(self) -> Option<DocumentStore<B>> {
        let adapters = self.adapters;

        DynStoreBackend::into_any(self.backend)
            .downcast::<B>()
            .ok()
            .map(|backend| DocumentStore::new(*backend, adapters))
    }
}

/// Conversion into a [`DynDocumentStore`].
pub trait IntoDynDocumentStore {
    fn into_dyn(self) -> DynDocumentStore;
}

impl<B: StoreBackend + 'static> IntoDynDocumentStore for DocumentStore<B> {
    fn into_dyn(self) -> DynDocumentStore {
        DocumentStore::new(Box::new(self.backend) as Box<dyn DynStoreBackend>, self.adapters)
    }
}
