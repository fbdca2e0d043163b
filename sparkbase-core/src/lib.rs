//! Core of sparkbase: adapter-driven mapping of application objects onto a document database.
//!
//! This crate provides:
//!
//! - **Adapters** ([`adapter`]) - Per-type conversion between objects and documents
//! - **Adapter registry** ([`registry`]) - Type-keyed lookup of adapters
//! - **Actions** ([`action`]) - Deferred, re-executable units of work
//! - **Predicates** ([`predicate`]) - Filters accepted by collection operations
//! - **Query expressions** ([`query`]) - Filters evaluated by the backend
//! - **Store backend abstraction** ([`backend`]) - The driver seam
//! - **Collections** ([`collection`]) - Object-level push, pull, replace and drop
//! - **Document store** ([`store`]) - Backend plus registry, hands out collections
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use sparkbase::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Documented)]
//! pub struct Player {
//!     pub name: String,
//!     pub coins: i64,
//! }
//!
//! let store = DocumentStore::new(backend, AdapterRegistry::builder().with_documented::<Player>().build()?);
//! let players = store.collection("players");
//!
//! players
//!     .push_or_replace(player, Predicate::instance(|p: &Player| p.name == "alice"))
//!     .execute()
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as sparkbase_core;

// `#[derive(Documented)]` expands to paths under `::sparkbase`.
#[cfg(test)]
extern crate self as sparkbase;

pub mod action;
pub mod adapter;
pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod predicate;
pub mod query;
pub mod registry;
pub mod store;
