//! Object-level operations on one named collection.
//!
//! A [`Collection`] pairs a collection name with the store's backend and
//! adapter registry. Each operation returns an [`Action`]; the adapter is
//! resolved, the collection scanned and the store mutated only when that
//! action is executed.
//!
//! # Filters
//!
//! Every operation accepts any [`Predicate`]. Closure predicates scan the
//! whole collection in the backend's order. Expression predicates are sent to
//! [`StoreBackend::query_documents`] instead, so only matching records travel
//! back.
//!
//! # Consistency
//!
//! Scan-then-delete operations are not atomic. Two concurrent
//! [`push_or_replace`](Collection::push_or_replace) calls that observe the
//! same match both try to delete it; the loser's delete finds nothing and
//! both inserts happen, leaving two records. Callers needing stronger
//! guarantees must serialize writers themselves.
//!
//! # Example
//!
//! ```ignore
//! use sparkbase::prelude::*;
//!
//! let players = store.collection("players");
//!
//! players.push(Player::new("alice")).execute().await?;
//!
//! let alice = players
//!     .pull(Predicate::instance(|p: &Player| p.name == "alice"))
//!     .execute()
//!     .await?;
//! ```

use std::sync::Arc;

use bson::doc;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, trace};

use crate::{
    action::{Action, VoidAction},
    adapter::DataAdapter,
    backend::{DocumentStream, StoreBackend},
    document::{Document, short_type_name},
    error::DocumentStoreResult,
    predicate::{Predicate, Verdict},
    query::Query,
    registry::{AdapterRef, AdapterRegistry},
};

/// How many existing records a [`Collection::replace`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    /// Remove only the first match in scan order.
    One,
    /// Remove every match.
    #[default]
    All,
}

/// Facade over one collection of a [`DocumentStore`](crate::store::DocumentStore).
///
/// Obtained from [`DocumentStore::collection`](crate::store::DocumentStore::collection).
/// Holds no state besides the name and borrowed handles, so it is cheap to
/// create per call site.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
    adapters: &'a AdapterRegistry,
}

impl<B: StoreBackend> Clone for Collection<'_, B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            backend: self.backend,
            adapters: self.adapters,
        }
    }
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B, adapters: &'a AdapterRegistry) -> Self {
        Self { name, backend, adapters }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores `instance` as a new record.
    ///
    /// No uniqueness check is made; pushing the same instance twice stores
    /// two records.
    ///
    /// # Errors
    ///
    /// Executing fails with [`UnregisteredType`](crate::error::DocumentStoreError::UnregisteredType)
    /// before touching the store when `T` has no adapter, and otherwise with
    /// whatever serialization or backend error occurs.
    pub fn push<T>(&self, instance: T) -> VoidAction<'a>
    where
        T: Send + Sync + 'static,
    {
        let collection = self.clone();
        let instance = Arc::new(instance);

        Action::new(move || {
            let collection = collection.clone();
            let instance = Arc::clone(&instance);
            async move { collection.push_now(&*instance).await }
        })
    }

    /// Removes every record matching `filter`, then stores `instance`.
    ///
    /// Exactly one record is inserted even when nothing matched. Same as
    /// [`replace`](Self::replace) with [`ReplaceMode::All`], discarding the count.
    pub fn push_or_replace<T>(&self, instance: T, filter: Predicate<T>) -> VoidAction<'a>
    where
        T: Send + Sync + 'static,
    {
        self.replace(instance, filter, ReplaceMode::All).map(|_| ())
    }

    /// Removes the records matching `filter` as selected by `mode`, then
    /// stores `instance`. Produces the number of records removed.
    ///
    /// The whole scan is tested before the first delete. If any candidate
    /// fails to deserialize, the action fails and the store is left as it was.
    pub fn replace<T>(&self, instance: T, filter: Predicate<T>, mode: ReplaceMode) -> Action<'a, usize>
    where
        T: Send + Sync + 'static,
    {
        let collection = self.clone();
        let instance = Arc::new(instance);

        Action::new(move || {
            let collection = collection.clone();
            let instance = Arc::clone(&instance);
            let filter = filter.clone();
            async move { collection.replace_now(&*instance, &filter, mode).await }
        })
    }

    /// Produces the first record matching `filter` in scan order, or `None`.
    pub fn pull<T>(&self, filter: Predicate<T>) -> Action<'a, Option<T>>
    where
        T: Send + Sync + 'static,
    {
        let collection = self.clone();

        Action::new(move || {
            let collection = collection.clone();
            let filter = filter.clone();
            async move { collection.pull_now(&filter).await }
        })
    }

    /// Produces every record matching `filter` in scan order.
    pub fn pull_all<T>(&self, filter: Predicate<T>) -> Action<'a, Vec<T>>
    where
        T: Send + Sync + 'static,
    {
        let collection = self.clone();

        Action::new(move || {
            let collection = collection.clone();
            let filter = filter.clone();
            async move { collection.pull_all_now(&filter).await }
        })
    }

    /// Deletes the first record matching `filter`.
    ///
    /// Produces `true` when a record was deleted and `false` when nothing
    /// matched. An empty result is never an error.
    pub fn drop<T>(&self, filter: Predicate<T>) -> Action<'a, bool>
    where
        T: Send + Sync + 'static,
    {
        let collection = self.clone();

        Action::new(move || {
            let collection = collection.clone();
            let filter = filter.clone();
            async move { collection.drop_now(&filter).await }
        })
    }

    /// Pulls the first match of `filter`; when found, lets `on_found` modify
    /// it and writes it back with [`push_or_replace`](Self::push_or_replace)
    /// under the same filter. Otherwise calls `on_not_found`.
    ///
    /// Produces whether a record was found. The read and the write are two
    /// separate scans, and the write-back removes every stored record
    /// matching `filter`, not only the one that was pulled.
    pub fn if_present_or_else<T, F, G>(
        &self,
        filter: Predicate<T>,
        on_found: F,
        on_not_found: G,
    ) -> Action<'a, bool>
    where
        T: Send + Sync + 'static,
        F: Fn(&mut T) + Send + Sync + 'static,
        G: Fn() + Send + Sync + 'static,
    {
        let collection = self.clone();
        let on_found = Arc::new(on_found);
        let on_not_found = Arc::new(on_not_found);

        Action::new(move || {
            let collection = collection.clone();
            let filter = filter.clone();
            let on_found = Arc::clone(&on_found);
            let on_not_found = Arc::clone(&on_not_found);

            async move {
                match collection.pull_now(&filter).await? {
                    Some(mut instance) => {
                        (*on_found)(&mut instance);
                        collection.replace_now(&instance, &filter, ReplaceMode::All).await?;
                        Ok(true)
                    }
                    None => {
                        (*on_not_found)();
                        Ok(false)
                    }
                }
            }
        })
    }

    fn adapter<T: 'static>(&self) -> DocumentStoreResult<AdapterRef<T>> {
        self.adapters.require::<T>()
    }

    async fn candidates<T>(&self, filter: &Predicate<T>) -> DocumentStoreResult<DocumentStream> {
        match filter.pushdown() {
            Some(expr) => {
                let matches = self
                    .backend
                    .query_documents(Query::filtered(expr.clone()), &self.name)
                    .await?;
                Ok(stream::iter(matches.into_iter().map(Ok)).boxed())
            }
            None => self.backend.find_documents(&self.name).await,
        }
    }

    async fn delete_record(&self, record: Document) -> DocumentStoreResult<bool> {
        let deleted = self
            .backend
            .find_one_and_delete(identity_criterion(record), &self.name)
            .await?;

        if let Some(document) = &deleted {
            trace!(collection = %self.name, id = ?document.get("_id"), "Record deleted");
        }

        Ok(deleted.is_some())
    }

    async fn push_now<T: 'static>(&self, instance: &T) -> DocumentStoreResult<()> {
        let adapter = self.adapter::<T>()?;
        let document = adapter.serialize(instance)?;

        debug!(collection = %self.name, type_name = %short_type_name::<T>(), "Pushing record");

        self.backend.insert_document(document, &self.name).await
    }

    async fn replace_now<T: Send + 'static>(
        &self,
        instance: &T,
        filter: &Predicate<T>,
        mode: ReplaceMode,
    ) -> DocumentStoreResult<usize> {
        let adapter = self.adapter::<T>()?;
        let document = adapter.serialize(instance)?;

        // Test the whole scan before the first delete.
        let mut targets = Vec::new();
        let mut candidates = self.candidates(filter).await?;

        while let Some(candidate) = candidates.try_next().await? {
            if let Verdict::Hit(_) = filter.test(&candidate, &*adapter)? {
                targets.push(candidate);
            }
        }

        let mut removed = 0;

        for target in targets {
            if self.delete_record(target).await? {
                removed += 1;

                if mode == ReplaceMode::One {
                    break;
                }
            }
        }

        debug!(
            collection = %self.name,
            type_name = %short_type_name::<T>(),
            removed,
            "Replacing record"
        );

        self.backend.insert_document(document, &self.name).await?;

        Ok(removed)
    }

    async fn pull_now<T: Send + 'static>(&self, filter: &Predicate<T>) -> DocumentStoreResult<Option<T>> {
        let adapter = self.adapter::<T>()?;

        debug!(collection = %self.name, type_name = %short_type_name::<T>(), "Pulling record");

        let mut candidates = self.candidates(filter).await?;

        while let Some(candidate) = candidates.try_next().await? {
            if let Some(instance) = matched(filter, &candidate, &*adapter)? {
                return Ok(Some(instance));
            }
        }

        Ok(None)
    }

    async fn pull_all_now<T: Send + 'static>(&self, filter: &Predicate<T>) -> DocumentStoreResult<Vec<T>> {
        let adapter = self.adapter::<T>()?;

        debug!(collection = %self.name, type_name = %short_type_name::<T>(), "Pulling all records");

        let mut found = Vec::new();
        let mut candidates = self.candidates(filter).await?;

        while let Some(candidate) = candidates.try_next().await? {
            if let Some(instance) = matched(filter, &candidate, &*adapter)? {
                found.push(instance);
            }
        }

        Ok(found)
    }

    async fn drop_now<T: Send + 'static>(&self, filter: &Predicate<T>) -> DocumentStoreResult<bool> {
        let adapter = self.adapter::<T>()?;

        debug!(collection = %self.name, type_name = %short_type_name::<T>(), "Dropping record");

        let mut candidates = self.candidates(filter).await?;

        while let Some(candidate) = candidates.try_next().await? {
            if let Verdict::Hit(_) = filter.test(&candidate, &*adapter)? {
                return self.delete_record(candidate).await;
            }
        }

        Ok(false)
    }
}

/// Tests `candidate` and deserializes it on a hit, reusing the instance an
/// instance predicate already built.
fn matched<T>(
    filter: &Predicate<T>,
    candidate: &Document,
    adapter: &dyn DataAdapter<T>,
) -> DocumentStoreResult<Option<T>> {
    match filter.test(candidate, adapter)? {
        Verdict::Miss => Ok(None),
        Verdict::Hit(Some(instance)) => Ok(Some(instance)),
        Verdict::Hit(None) => adapter.deserialize(candidate).map(Some),
    }
}

/// Criterion identifying a scanned record for deletion: its `_id` when it has
/// one, the whole document otherwise.
fn identity_criterion(record: Document) -> Document {
    match record.get("_id") {
        Some(id) => doc! { "_id": id.clone() },
        None => record,
    }
}
