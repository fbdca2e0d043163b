//! Adapters converting between application objects and stored documents.
//!
//! An adapter is the per-type strategy used by every collection operation:
//! [`DataAdapter::serialize`] produces the document that gets inserted and
//! [`DataAdapter::deserialize`] rebuilds an instance from a scanned record.
//!
//! Three ways to obtain one:
//!
//! - [`DocumentedAdapter`] for types implementing [`Documented`]
//! - [`FnAdapter`] built from a pair of closures
//! - a hand-written `impl DataAdapter<T>` for anything else

use std::{fmt, marker::PhantomData};

use crate::{
    document::{Document, Documented},
    error::DocumentStoreResult,
};

/// Bidirectional mapping between one application type and its document form.
///
/// Implementations must satisfy the round-trip law: for every well-formed
/// instance `i`, `deserialize(&serialize(&i)?)` yields a value equal to `i`.
/// How a malformed document is reported is up to the implementation.
///
/// Adapters are registered once and then shared read-only, hence `Send + Sync`.
pub trait DataAdapter<T>: Send + Sync {
    /// Converts an instance into the document that will be stored.
    fn serialize(&self, instance: &T) -> DocumentStoreResult<Document>;

    /// Rebuilds an instance from a stored document.
    fn deserialize(&self, document: &Document) -> DocumentStoreResult<T>;
}

/// Adapter delegating to a type's own [`Documented`] implementation.
pub struct DocumentedAdapter<T: Documented> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Documented> DocumentedAdapter<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T: Documented> Default for DocumentedAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Documented> fmt::Debug for DocumentedAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DocumentedAdapter")
            .field(&T::type_name())
            .finish()
    }
}

impl<T: Documented> DataAdapter<T> for DocumentedAdapter<T> {
    fn serialize(&self, instance: &T) -> DocumentStoreResult<Document> {
        instance.to_document()
    }

    fn deserialize(&self, document: &Document) -> DocumentStoreResult<T> {
        T::from_document(document)
    }
}

type SerializeFn<T> = Box<dyn Fn(&T) -> DocumentStoreResult<Document> + Send + Sync>;
type DeserializeFn<T> = Box<dyn Fn(&Document) -> DocumentStoreResult<T> + Send + Sync>;

/// Adapter assembled from two closures.
///
/// # Example
///
/// ```ignore
/// use sparkbase::{adapter::FnAdapter, bson::doc};
///
/// let adapter = FnAdapter::new(
///     |point: &(i32, i32)| Ok(doc! { "x": point.0, "y": point.1 }),
///     |document| Ok((document.get_i32("x")?, document.get_i32("y")?)),
/// );
/// ```
pub struct FnAdapter<T> {
    serialize: SerializeFn<T>,
    deserialize: DeserializeFn<T>,
}

impl<T> FnAdapter<T> {
    pub fn new<S, D>(serialize: S, deserialize: D) -> Self
    where
        S: Fn(&T) -> DocumentStoreResult<Document> + Send + Sync + 'static,
        D: Fn(&Document) -> DocumentStoreResult<T> + Send + Sync + 'static,
    {
        Self {
            serialize: Box::new(serialize),
            deserialize: Box::new(deserialize),
        }
    }
}

impl<T> fmt::Debug for FnAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAdapter").finish_non_exhaustive()
    }
}

impl<T> DataAdapter<T> for FnAdapter<T> {
    fn serialize(&self, instance: &T) -> DocumentStoreResult<Document> {
        (self.serialize)(instance)
    }

    fn deserialize(&self, document: &Document) -> DocumentStoreResult<T> {
        (self.deserialize)(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentStoreError;
    use bson::doc;
    use serde::{Deserialize, Serialize};
    use sparkbase_macros::Documented;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Documented)]
    struct Account {
        owner: String,
        balance: f64,
        frozen: bool,
    }

    fn point_adapter() -> FnAdapter<(i32, i32)> {
        FnAdapter::new(
            |point: &(i32, i32)| Ok(doc! { "x": point.0, "y": point.1 }),
            |document: &Document| {
                Ok((
                    document
                        .get_i32("x")
                        .map_err(|e| DocumentStoreError::Serialization(e.to_string()))?,
                    document
                        .get_i32("y")
                        .map_err(|e| DocumentStoreError::Serialization(e.to_string()))?,
                ))
            },
        )
    }

    #[test]
    fn test_documented_adapter_round_trip() {
        let adapter = DocumentedAdapter::<Account>::new();
        let account = Account { owner: "dana".to_string(), balance: 10.5, frozen: false };

        let document = adapter.serialize(&account).unwrap();
        assert_eq!(document.get_str("owner").unwrap(), "dana");
        assert_eq!(adapter.deserialize(&document).unwrap(), account);
    }

    #[test]
    fn test_fn_adapter_round_trip() {
        let adapter = point_adapter();

        let document = adapter.serialize(&(3, -4)).unwrap();
        assert_eq!(document, doc! { "x": 3, "y": -4 });
        assert_eq!(adapter.deserialize(&document).unwrap(), (3, -4));
    }

    #[test]
    fn test_fn_adapter_reports_malformed_document() {
        let err = point_adapter()
            .deserialize(&doc! { "x": 1 })
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::Serialization(_)));
    }
}
