//! Main sparkbase crate: map application objects onto a document database.
//!
//! Sparkbase sits on top of a document database driver. You register an
//! adapter per application type once at startup, then push, pull, replace and
//! drop instances of that type through a collection facade. Every operation
//! returns an [`Action`](action::Action) that does nothing until it is executed.
//!
//! # Features
//!
//! - **Adapter registry** - Explicit, type-keyed conversion between objects and documents
//! - **Deferred actions** - Build operations up front, run them when and where you choose
//! - **Flexible filters** - Raw document closures, typed instance closures, or backend-evaluated expressions
//! - **Multiple backends** - In-memory and MongoDB, behind one backend trait
//!
//! # Quick Start
//!
//! ```ignore
//! use sparkbase::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Documented)]
//! pub struct Player {
//!     pub name: String,
//!     pub coins: i64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let adapters = AdapterRegistry::builder()
//!         .with_documented::<Player>()
//!         .build()?;
//!
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?, adapters);
//!     let players = store.collection("players");
//!
//!     players.push(Player { name: "alice".into(), coins: 10 }).execute().await?;
//!
//!     // Give alice a bonus, or complain if she is gone.
//!     let found = players
//!         .if_present_or_else(
//!             Predicate::instance(|p: &Player| p.name == "alice"),
//!             |p| p.coins += 100,
//!             || eprintln!("alice not found"),
//!         )
//!         .execute()
//!         .await?;
//!     assert!(found);
//!
//!     // Expression filters are evaluated by the backend.
//!     let rich = players
//!         .pull_all::<Player>(Field::new("coins").gte(100).into())
//!         .execute()
//!         .await?;
//!     println!("rich players: {rich:?}");
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! When the backend is picked at runtime, convert the store with
//! [`into_dyn`](store::IntoDynDocumentStore::into_dyn). The resulting
//! [`DynDocumentStore`](store::DynDocumentStore) exposes the same API.
//!
//! ```ignore
//! let store: DynDocumentStore = if use_mongo {
//!     DocumentStore::new(MongoDbStore::builder(dsn, "game").build().await?, adapters).into_dyn()
//! } else {
//!     DocumentStore::new(InMemoryStore::new(), adapters).into_dyn()
//! };
//! ```
//!
//! # Logging
//!
//! Operations emit [`tracing`](https://docs.rs/tracing) events under the
//! `sparkbase_core`, `sparkbase_memory` and `sparkbase_mongodb` targets.
//! Install a subscriber in your application to see them.
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - MongoDB backend (requires `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as sparkbase;

pub mod prelude;

pub use sparkbase_core::{action, adapter, backend, collection, document, error, predicate, query, registry, store};

pub use sparkbase_macros::Documented;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use sparkbase_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use sparkbase_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
