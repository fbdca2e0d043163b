//! Error types and result types for document store operations.
//!
//! Every fallible operation in the workspace returns [`DocumentStoreResult<T>`].
//! A missing record is never an error: lookups report it as `None` and
//! deletions as `false`.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when mapping objects to a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// No adapter is registered for the requested type. Carries the type's display name.
    #[error("Type \"{0}\" has no registered adapter and cannot be mapped to a document")]
    UnregisteredType(String),
    /// An adapter was registered twice for the same type.
    #[error("Type \"{0}\" already has a registered adapter")]
    DuplicateAdapter(String),
    /// Serialization/deserialization error when converting between object and document.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// A value that had to be a document was something else.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error reported by the underlying storage driver.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
