//! Filters accepted by collection operations.
//!
//! A [`Predicate`] can look at a record in one of three ways:
//!
//! - [`Predicate::document`] tests the raw stored document
//! - [`Predicate::instance`] deserializes the record through the type's adapter first
//! - [`Predicate::expr`] hands an [`Expr`] to the backend, skipping the client-side scan
//!
//! Every operation accepts every form. The closure forms visit the whole
//! collection and are the slow path; prefer expressions where the backend
//! can evaluate them.

use std::{fmt, sync::Arc};

use crate::{
    adapter::DataAdapter,
    document::Document,
    error::DocumentStoreResult,
    query::Expr,
};

type DocumentTest = Arc<dyn Fn(&Document) -> bool + Send + Sync>;
type InstanceTest<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

pub enum Predicate<T> {
    Document(DocumentTest),
    Instance(InstanceTest<T>),
    Expr(Expr),
}

/// Outcome of testing one scanned record.
pub(crate) enum Verdict<T> {
    Miss,
    /// Carries the instance when testing already had to deserialize it.
    Hit(Option<T>),
}

impl<T> Predicate<T> {
    pub fn document<F>(test: F) -> Self
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        Predicate::Document(Arc::new(test))
    }

    pub fn instance<F>(test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Predicate::Instance(Arc::new(test))
    }

    pub fn expr(expr: Expr) -> Self {
        Predicate::Expr(expr)
    }

    /// Matches every record.
    pub fn any() -> Self {
        Predicate::document(|_| true)
    }

    /// The expression to push down to the backend, if this predicate has one.
    pub(crate) fn pushdown(&self) -> Option<&Expr> {
        match self {
            Predicate::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    /// Tests a record produced by the scan for this predicate.
    ///
    /// Records returned by a pushed-down query already satisfy the expression.
    pub(crate) fn test(&self, document: &Document, adapter: &dyn DataAdapter<T>) -> DocumentStoreResult<Verdict<T>> {
        Ok(match self {
            Predicate::Document(test) => {
                if test(document) {
                    Verdict::Hit(None)
                } else {
                    Verdict::Miss
                }
            }
            Predicate::Instance(test) => {
                let instance = adapter.deserialize(document)?;
                if test(&instance) {
                    Verdict::Hit(Some(instance))
                } else {
                    Verdict::Miss
                }
            }
            Predicate::Expr(_) => Verdict::Hit(None),
        })
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Document(test) => Predicate::Document(Arc::clone(test)),
            Predicate::Instance(test) => Predicate::Instance(Arc::clone(test)),
            Predicate::Expr(expr) => Predicate::Expr(expr.clone()),
        }
    }
}

impl<T> From<Expr> for Predicate<T> {
    fn from(expr: Expr) -> Self {
        Predicate::Expr(expr)
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Document(_) => f.write_str("Predicate::Document(..)"),
            Predicate::Instance(_) => f.write_str("Predicate::Instance(..)"),
            Predicate::Expr(expr) => f.debug_tuple("Predicate::Expr").field(expr).finish(),
        }
    }
}
