//! Backend-evaluated query expressions.
//!
//! Closure predicates force a client-side scan of the whole collection. An
//! [`Expr`] instead travels to the backend, which evaluates it natively (the
//! MongoDB backend translates it into a server-side filter). Use expressions
//! whenever the filter can be phrased in terms of stored fields.
//!
//! ```ignore
//! use sparkbase::query::{Field, Query, SortDirection};
//!
//! let rich = Field::new("coins").gte(1_000).and(Field::new("banned").ne(true));
//!
//! let query = Query::builder()
//!     .filter(rich)
//!     .sort("coins", SortDirection::Desc)
//!     .limit(10)
//!     .build();
//! ```
//!
//! Field names may use dotted paths (`"stats.level"`) to reach into nested documents.

use bson::Bson;

use crate::error::DocumentStoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Comparison applied by [`Expr::Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring of a string field, or element of an array field.
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    /// Field value (or one of its elements) is among the given values.
    AnyOf,
    /// Field value (and each of its elements) is outside the given values.
    NoneOf,
}

/// A boolean filter over stored documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// `Exists(field, true)` matches documents carrying `field`, `false` the opposite.
    Exists(String, bool),
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    pub fn field(field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Self {
        Expr::Field {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Matches when every expression matches. An empty list matches everything.
    pub fn all(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(exprs.into_iter().collect())
    }

    /// Matches when any expression matches. An empty list matches nothing.
    pub fn any(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Conjunction, flattening into an existing `And`.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut exprs) => {
                exprs.push(other);
                Expr::And(exprs)
            }
            expr => Expr::And(vec![expr, other]),
        }
    }

    /// Disjunction, flattening into an existing `Or`.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut exprs) => {
                exprs.push(other);
                Expr::Or(exprs)
            }
            expr => Expr::Or(vec![expr, other]),
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// Fluent constructor for single-field expressions.
///
/// `Field::new("name").eq("alice")` is shorthand for
/// `Expr::field("name", FieldOp::Eq, "alice")`.
#[derive(Debug, Clone)]
pub struct Field(String);

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field(name.into())
    }

    fn op(self, op: FieldOp, value: impl Into<Bson>) -> Expr {
        Expr::field(self.0, op, value)
    }

    pub fn eq(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Ne, value)
    }

    pub fn gt(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Gt, value)
    }

    pub fn gte(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Gte, value)
    }

    pub fn lt(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Lt, value)
    }

    pub fn lte(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Lte, value)
    }

    pub fn contains(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::Contains, value)
    }

    pub fn not_contains(self, value: impl Into<Bson>) -> Expr {
        self.op(FieldOp::NotContains, value)
    }

    pub fn starts_with(self, value: impl Into<String>) -> Expr {
        self.op(FieldOp::StartsWith, value.into())
    }

    pub fn ends_with(self, value: impl Into<String>) -> Expr {
        self.op(FieldOp::EndsWith, value.into())
    }

    pub fn any_of(self, values: impl IntoIterator<Item = impl Into<Bson>>) -> Expr {
        self.op(FieldOp::AnyOf, Bson::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn none_of(self, values: impl IntoIterator<Item = impl Into<Bson>>) -> Expr {
        self.op(FieldOp::NoneOf, Bson::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn exists(self) -> Expr {
        Expr::Exists(self.0, true)
    }

    pub fn not_exists(self) -> Expr {
        Expr::Exists(self.0, false)
    }
}

/// Filter plus result shaping, executed by [`StoreBackend::query_documents`](crate::backend::StoreBackend::query_documents).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Expr>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<Sort>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// A query selecting exactly the documents matched by `expr`.
    pub fn filtered(expr: Expr) -> Self {
        Query { filter: Some(expr), ..Self::default() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree. Backends implement this to evaluate or translate filters.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error>;
    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}
