//! Driver seam between the collection facade and a concrete document database.
//!
//! The facade needs very little from a driver: insert one document, stream
//! every document of a collection, and find-and-delete one document matching
//! a criterion. [`StoreBackend`] captures exactly that, plus expression
//! queries for backends able to filter natively and basic collection
//! management.
//!
//! # Traits
//!
//! - [`StoreBackend`]: implemented by each driver adapter
//! - [`DynStoreBackend`]: object-safe mirror, implemented for every `StoreBackend`
//! - [`StoreBackendBuilder`]: async factory for backends
//!
//! # Consistency
//!
//! The facade issues deletes while iterating a [`DocumentStream`]. Whether a
//! running stream observes those deletes is backend-specific; implementers
//! should document it. The in-memory backend streams a snapshot.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::{any::Any, fmt::Debug};

use crate::{document::Document, error::DocumentStoreResult, query::Query};

/// Lazy, finite sequence of the documents in a collection, in the backend's scan order.
pub type DocumentStream = BoxStream<'static, DocumentStoreResult<Document>>;

/// Abstract interface for document storage drivers.
///
/// Implementations must be safe for concurrent use from multiple tasks.
/// Driver failures should surface as [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts one document as a new record.
    ///
    /// No uniqueness check is performed. Backends assign an `_id` field when
    /// the document does not carry one.
    async fn insert_document(&self, document: Document, collection: &str) -> DocumentStoreResult<()>;

    /// Streams every document of a collection, `_id` included.
    ///
    /// Each call starts a fresh scan. A missing collection yields an empty stream.
    async fn find_documents(&self, collection: &str) -> DocumentStoreResult<DocumentStream>;

    /// Deletes the first document whose fields equal every field of `criterion`
    /// and returns it, or `None` when nothing matched.
    async fn find_one_and_delete(
        &self,
        criterion: Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Returns the documents selected by `query`, evaluated by the backend.
    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>>;

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Drops a collection and every document in it.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Releases driver resources. The default does nothing.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Object-safe form of [`StoreBackend`], used by [`DynDocumentStore`](crate::store::DynDocumentStore).
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn insert_document(&self, document: Document, collection: &str) -> DocumentStoreResult<()>;
    async fn find_documents(&self, collection: &str) -> DocumentStoreResult<DocumentStream>;
    async fn find_one_and_delete(
        &self,
        criterion: Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>>;
    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>>;
    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;

    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn insert_document(&self, document: Document, collection: &str) -> DocumentStoreResult<()> {
        StoreBackend::insert_document(self, document, collection).await
    }

    async fn find_documents(&self, collection: &str) -> DocumentStoreResult<DocumentStream> {
        StoreBackend::find_documents(self, collection).await
    }

    async fn find_one_and_delete(
        &self,
        criterion: Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        StoreBackend::find_one_and_delete(self, criterion, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::query_documents(self, query, collection).await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::create_collection(self, name).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::drop_collection(self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collections(self).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// Lets `DocumentStore<Box<dyn DynStoreBackend>>` reuse the generic facade.
#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn insert_document(&self, document: Document, collection: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::insert_document(&**self, document, collection).await
    }

    async fn find_documents(&self, collection: &str) -> DocumentStoreResult<DocumentStream> {
        DynStoreBackend::find_documents(&**self, collection).await
    }

    async fn find_one_and_delete(
        &self,
        criterion: Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        DynStoreBackend::find_one_and_delete(&**self, criterion, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        DynStoreBackend::query_documents(&**self, query, collection).await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::create_collection(&**self, name).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::drop_collection(&**self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        DynStoreBackend::list_collections(&**self).await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        DynStoreBackend::shutdown_boxed(self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
