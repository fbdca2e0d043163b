//! In-memory storage implementation for document stores.
//!
//! Collections are insertion-ordered vectors of documents behind an async
//! read-write lock, so scan order is insertion order.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use tracing::trace;

use sparkbase_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Query, SortDirection},
};

use crate::evaluator::{Comparable, DocumentEvaluator, lookup};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable; clones share the same underlying data, so it
/// can be handed to several tasks or stores at once.
///
/// # Scans
///
/// [`find_documents`](StoreBackend::find_documents) streams a snapshot taken
/// when the call is made. Records deleted or inserted while the stream is
/// being consumed are not reflected in it.
///
/// # Example
///
/// ```ignore
/// use sparkbase_memory::InMemoryStore;
/// use sparkbase::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.insert_document(doc! { "name": "Alice" }, "users").await?;
///
/// let removed = store.find_one_and_delete(doc! { "name": "Alice" }, "users").await?;
/// assert!(removed.is_some());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Number of documents currently stored in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

/// True when every field of `criterion` is present in `document` with an equal value.
fn satisfies(document: &Document, criterion: &Document) -> bool {
    criterion
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

fn sort_key<'a>(document: &'a Document, field: &str) -> Comparable<'a> {
    lookup(document, field)
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, mut document: Document, collection: &str) -> DocumentStoreResult<()> {
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }

        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);

        Ok(())
    }

    async fn find_documents(&self, collection: &str) -> DocumentStoreResult<DocumentStream> {
        let snapshot = self
            .store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default();

        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }

    async fn find_one_and_delete(
        &self,
        criterion: Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        let mut store = self.store.write().await;

        let Some(documents) = store.get_mut(collection) else {
            return Ok(None);
        };

        let removed = documents
            .iter()
            .position(|document| satisfies(document, &criterion))
            .map(|index| documents.remove(index));

        trace!(collection, matched = removed.is_some(), "find_one_and_delete");

        Ok(removed)
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut selected = Vec::with_capacity(documents.len());
        for document in documents {
            let keep = match &query.filter {
                Some(filter) => DocumentEvaluator::matches(document, filter)?,
                None => true,
            };

            if keep {
                selected.push(document);
            }
        }

        if let Some(sort) = &query.sort {
            // Stable sort keeps insertion order among equal keys.
            selected.sort_by(|a, b| {
                let (left, right) = (sort_key(a, &sort.field), sort_key(b, &sort.field));

                match sort.direction {
                    SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                    SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
                }
            });
        }

        Ok(selected
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self
            .store
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }
}

/// Builder for [`InMemoryStore`], optionally seeding collections.
///
/// ```ignore
/// let store = InMemoryStore::builder()
///     .with_collection("players")
///     .with_documents("guilds", vec![doc! { "tag": "SPK" }])
///     .build()
///     .await?;
/// ```
#[derive(Default, Debug)]
pub struct InMemoryStoreBuilder {
    seed: Vec<(String, Vec<Document>)>,
}

impl InMemoryStoreBuilder {
    /// Creates an empty collection.
    pub fn with_collection(self, name: impl Into<String>) -> Self {
        self.with_documents(name, Vec::new())
    }

    /// Creates a collection holding `documents`, assigning `_id`s where missing.
    pub fn with_documents(mut self, name: impl Into<String>, documents: Vec<Document>) -> Self {
        self.seed.push((name.into(), documents));
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let store = InMemoryStore::new();

        for (name, documents) in self.seed {
            store.create_collection(&name).await?;

            for document in documents {
                store.insert_document(document, &name).await?;
            }
        }

        Ok(store)
    }
}

impl From<Bson> for InMemoryStoreBuilder {
    /// Seeds from a `{ collection: [documents] }` layout; non-document entries are skipped.
    fn from(layout: Bson) -> Self {
        let mut builder = InMemoryStoreBuilder::default();

        if let Bson::Document(collections) = layout {
            for (name, value) in collections {
                let documents = match value {
                    Bson::Array(items) => items
                        .into_iter()
                        .filter_map(|item| match item {
                            Bson::Document(document) => Some(document),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                builder = builder.with_documents(name, documents);
            }
        }

        builder
    }
}
