use async_trait::async_trait;
use bson::{Document, doc};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use tracing::info;

use sparkbase_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Query, QueryVisitor, SortDirection},
};

use crate::{query::MongoQueryTranslator, sanitizer::ValueSanitizer};

fn backend_error(err: mongodb::error::Error) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

/// Limit, skip and sort of `query` as driver options. Oversized limits saturate.
fn find_options(query: &Query) -> FindOptions {
    let mut options = FindOptions::default();

    if let Some(limit) = query.limit {
        options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if let Some(skip) = query.offset {
        options.skip = Some(skip as u64);
    }
    if let Some(sort) = &query.sort {
        let field = ValueSanitizer::sanitize_path(&sort.field);
        options.sort = Some(doc! {
            field: match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            }
        });
    }

    options
}

/// MongoDB-backed [`StoreBackend`].
///
/// Scans are driver cursors: a running [`find_documents`](StoreBackend::find_documents)
/// stream may or may not observe documents deleted after it started, as
/// decided by the server.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&ValueSanitizer::sanitize_string(collection_name))
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, document: Document, collection: &str) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .insert_one(ValueSanitizer::sanitize_document(&document))
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn find_documents(&self, collection: &str) -> DocumentStoreResult<DocumentStream> {
        let cursor = self
            .get_collection(collection)
            .find(doc! {})
            .await
            .map_err(backend_error)?;

        Ok(cursor
            .map_ok(|document| ValueSanitizer::restore_document(&document))
            .map_err(backend_error)
            .boxed())
    }

    async fn find_one_and_delete(
        &self,
        criterion: Document,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        Ok(self
            .get_collection(collection)
            .find_one_and_delete(ValueSanitizer::sanitize_document(&criterion))
            .await
            .map_err(backend_error)?
            .map(|document| ValueSanitizer::restore_document(&document)))
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let options = find_options(&query);

        let filter = match &query.filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
            None => doc! {},
        };

        self.get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(backend_error)?
            .map_ok(|document| ValueSanitizer::restore_document(&document))
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .create_collection(&ValueSanitizer::sanitize_string(name))
            .await
            .map_err(backend_error)
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(backend_error)
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(self
            .client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(backend_error)?
            .iter()
            .map(|name| ValueSanitizer::restore_string(name))
            .collect())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

/// Connection settings for a [`MongoDbStore`].
///
/// ```ignore
/// let backend = MongoDbStore::builder("mongodb://localhost:27017", "game")
///     .with_app_name("lobby")
///     .build()
///     .await?;
/// ```
#[derive(Debug)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    app_name: Option<String>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            app_name: None,
        }
    }

    /// Name reported to the server in the connection handshake.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        if self.app_name.is_some() {
            options.app_name = self.app_name;
        }

        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        info!(database = %self.database, "MongoDB client ready");

        Ok(MongoDbStore::new(client, self.database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_options_saturate_oversized_limit() {
        let options = find_options(&Query::builder().limit(usize::MAX).offset(3).build());

        assert_eq!(options.limit, Some(i64::MAX));
        assert_eq!(options.skip, Some(3));
        assert!(options.sort.is_none());
    }

    #[test]
    fn test_find_options_escape_sort_field() {
        let query = Query::builder().limit(10).sort("prices.$usd", SortDirection::Desc).build();
        let options = find_options(&query);

        assert_eq!(options.limit, Some(10));
        assert_eq!(options.sort, Some(doc! { "prices.__dollar__usd": -1 }));
    }
}
