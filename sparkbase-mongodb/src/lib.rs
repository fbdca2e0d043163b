//! MongoDB backend implementation for sparkbase.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Expression predicates are translated into native filters and evaluated by the
//! server; closure predicates scan the collection through a driver cursor.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sparkbase = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Stored form
//!
//! MongoDB reserves `.` and `$` in field names. Keys and string values are
//! escaped on write and restored on read, so adapters never see the escaped
//! form. Queries and delete criteria are escaped the same way.
//!
//! The escapes are `__dot__`, `__dollar__` and `__null__`. Restoring is not
//! told apart from text that already spelled those markers, so a stored
//! string such as `"a__dot__b"` reads back as `"a.b"`. Values that may
//! contain the markers verbatim do not round-trip through this backend; the
//! in-memory backend stores them unchanged.
//!
//! # Example
//!
//! ```ignore
//! use sparkbase::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as sparkbase_mongodb;

pub mod query;
pub mod sanitizer;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
