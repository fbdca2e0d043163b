//! In-memory document storage backend for sparkbase.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It is meant for development and tests, and doubles as the reference for how a
//! backend is expected to behave.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Snapshot scans** - `find_documents` never observes concurrent writes
//! - **Query support** - Filtering (dotted paths included), sorting and pagination
//!
//! # Quick Start
//!
//! ```ignore
//! use sparkbase::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let adapters = AdapterRegistry::builder().with_documented::<User>().build()?;
//!     let store = DocumentStore::new(backend, adapters);
//!
//!     store.collection("users").push(User::new("Alice")).execute().await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as sparkbase_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
