//! Convenient re-exports of commonly used types from sparkbase.
//!
//! ```ignore
//! use sparkbase::prelude::*;
//! ```

pub use sparkbase_core::{
    action::{Action, VoidAction},
    adapter::{DataAdapter, DocumentedAdapter, FnAdapter},
    backend::{StoreBackend, StoreBackendBuilder},
    collection::{Collection, ReplaceMode},
    document::{Document, Documented},
    error::{DocumentStoreError, DocumentStoreResult},
    predicate::Predicate,
    query::{Expr, Field, FieldOp, Query, QueryBuilder, Sort, SortDirection},
    registry::{AdapterRef, AdapterRegistry, AdapterRegistryBuilder},
    store::{DocumentStore, DynDocumentStore, IntoDynDocumentStore},
};

pub use sparkbase_macros::Documented;
