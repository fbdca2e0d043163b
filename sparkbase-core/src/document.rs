//! Document representation and self-mapping types.
//!
//! Stored records are plain [`bson::Document`] values: ordered maps from field
//! name to value. Types that can describe their own document form implement
//! [`Documented`], usually through `#[derive(Documented)]`, and can then be
//! registered without a hand-written adapter.

use bson::{Bson, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

pub use bson::Document;

/// A type that maps itself to and from a [`Document`] through serde.
///
/// The conversion methods have serde-backed default implementations, so an
/// implementation only has to name the type. Override them when the stored
/// shape must differ from the serde shape.
///
/// # Example
///
/// ```ignore
/// use sparkbase::prelude::*;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Documented)]
/// pub struct Player {
///     pub name: String,
///     pub coins: i64,
/// }
///
/// let registry = AdapterRegistry::builder()
///     .with_documented::<Player>()
///     .build()?;
/// ```
pub trait Documented: Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static {
    /// Display name used in log events and error messages.
    fn type_name() -> &'static str;

    /// Converts this value into its stored document form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the value does not serialize to a document.
    fn to_document(&self) -> DocumentStoreResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "{} serialized to {:?} instead of a document",
                Self::type_name(),
                other.element_type()
            ))),
        }
    }

    /// Rebuilds a value from its stored document form.
    ///
    /// Fields the type does not declare (such as the store-assigned `_id`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not match the type's structure.
    fn from_document(document: &Document) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document.clone()))?)
    }

    /// Converts this value to JSON.
    fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    /// Creates a value from JSON.
    fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(from_value(value)?)
    }
}

/// Returns the unqualified name of `T`, keeping generic arguments readable.
///
/// `my_app::model::Player` becomes `Player` and
/// `alloc::vec::Vec<my_app::model::Player>` becomes `Vec<Player>`.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut short = String::with_capacity(full.len());
    let mut segment = String::new();

    for ch in full.chars() {
        match ch {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' | '&' | '[' | ']' | ';' | '(' | ')' => {
                short.push_str(&segment);
                segment.clear();
                short.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    short.push_str(&segment);

    short
}
