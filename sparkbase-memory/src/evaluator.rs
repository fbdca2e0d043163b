//! Client-side evaluation of query expressions against stored documents.
//!
//! Numbers of every width compare as `f64`, so `Int32(3)` equals `Int64(3)`
//! and `Double(3.0)`. Values of unrelated kinds never order against each
//! other; a comparison between them is simply false. Equality against an
//! array field also matches when any single element is equal.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, DateTime, Document, oid::ObjectId};

use sparkbase_core::{
    error::DocumentStoreError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Borrowed view of a BSON value with cross-width numeric comparison.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Binary, regex, timestamps and friends: equal to nothing.
    Opaque,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(items) => Comparable::Array(items.iter().map(Comparable::from).collect()),
            Bson::Document(document) => Comparable::Map(
                document
                    .iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
            _ => Comparable::Opaque,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Comparable<'_> {
    /// The value itself, or its elements when it is an array.
    fn members(&self) -> &[Comparable<'_>] {
        match self {
            Comparable::Array(items) => items,
            single => std::slice::from_ref(single),
        }
    }
}

/// Looks up a possibly dotted field path (`"stats.level"`) in a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Evaluates an [`Expr`] against a single document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn matches(document: &'a Document, expr: &Expr) -> Result<bool, DocumentStoreError> {
        DocumentEvaluator::new(document).visit_expr(expr)
    }
}

fn compare(field_value: &Comparable<'_>, op: FieldOp, operand: &Comparable<'_>) -> bool {
    let ordering = field_value.partial_cmp(operand);

    match op {
        FieldOp::Gt => ordering == Some(Ordering::Greater),
        FieldOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        FieldOp::Lt => ordering == Some(Ordering::Less),
        FieldOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        _ => false,
    }
}

/// Whole-value equality, or membership when the field is an array.
fn equals(field_value: &Comparable<'_>, operand: &Comparable<'_>) -> bool {
    field_value == operand
        || matches!(field_value, Comparable::Array(items) if items.iter().any(|item| item == operand))
}

fn contains(field_value: &Comparable<'_>, operand: &Comparable<'_>) -> bool {
    match (field_value, operand) {
        (Comparable::Array(items), _) => items.iter().any(|item| item == operand),
        (Comparable::String(haystack), Comparable::String(needle)) => haystack.contains(needle),
        _ => false,
    }
}

fn any_of(field_value: &Comparable<'_>, operand: &Comparable<'_>) -> bool {
    let candidates = operand.members();

    field_value
        .members()
        .iter()
        .any(|member| candidates.contains(member))
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<bool, DocumentStoreError> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<bool, DocumentStoreError> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<bool, DocumentStoreError> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<bool, DocumentStoreError> {
        Ok(lookup(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<bool, DocumentStoreError> {
        let operand = Comparable::from(value);

        // A missing field only satisfies the negative operators.
        let Some(field_value) = lookup(self.document, field).map(Comparable::from) else {
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };

        Ok(match op {
            FieldOp::Eq => equals(&field_value, &operand),
            FieldOp::Ne => !equals(&field_value, &operand),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => compare(&field_value, op, &operand),
            FieldOp::Contains => contains(&field_value, &operand),
            FieldOp::NotContains => !contains(&field_value, &operand),
            FieldOp::StartsWith => match (&field_value, &operand) {
                (Comparable::String(s), Comparable::String(prefix)) => s.starts_with(prefix),
                _ => false,
            },
            FieldOp::EndsWith => match (&field_value, &operand) {
                (Comparable::String(s), Comparable::String(suffix)) => s.ends_with(suffix),
                _ => false,
            },
            FieldOp::AnyOf => any_of(&field_value, &operand),
            FieldOp::NoneOf => !any_of(&field_value, &operand),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use sparkbase_core::query::Field;

    fn player() -> Document {
        doc! {
            "name": "alice",
            "coins": 250_i64,
            "ratio": 0.5,
            "roles": ["admin", "builder"],
            "stats": { "level": 7, "guild": { "tag": "SPK" } },
        }
    }

    fn eval(expr: Expr) -> bool {
        DocumentEvaluator::matches(&player(), &expr).unwrap()
    }

    #[test]
    fn test_numbers_compare_across_widths() {
        assert!(eval(Field::new("coins").eq(250)));
        assert!(eval(Field::new("coins").gt(249.5)));
        assert!(eval(Field::new("stats.level").lte(7_i64)));
        assert!(!eval(Field::new("ratio").gte(1)));
    }

    #[test]
    fn test_dotted_paths() {
        assert_eq!(lookup(&player(), "stats.guild.tag"), Some(&Bson::from("SPK")));
        assert_eq!(lookup(&player(), "roles.1"), Some(&Bson::from("builder")));
        assert!(lookup(&player(), "stats.missing.tag").is_none());
        assert!(lookup(&player(), "name.first").is_none());

        assert!(eval(Field::new("stats.guild.tag").starts_with("SP")));
        assert!(eval(Field::new("stats.guild").exists()));
        assert!(eval(Field::new("stats.rank").not_exists()));
    }

    #[test]
    fn test_string_and_array_operators() {
        assert!(eval(Field::new("name").contains("lic")));
        assert!(eval(Field::new("name").ends_with("ice")));
        assert!(eval(Field::new("roles").contains("admin")));
        assert!(eval(Field::new("roles").not_contains("owner")));
        assert!(eval(Field::new("roles").any_of(["owner", "builder"])));
        assert!(eval(Field::new("name").any_of(["bob", "alice"])));
        assert!(eval(Field::new("roles").none_of(["owner"])));
        assert!(!eval(Field::new("roles").none_of(["admin"])));
    }

    #[test]
    fn test_equality_on_arrays_matches_elements() {
        assert!(eval(Field::new("roles").eq("admin")));
        assert!(eval(Field::new("roles").eq(Bson::Array(vec!["admin".into(), "builder".into()]))));
        assert!(!eval(Field::new("roles").ne("builder")));
        assert!(eval(Field::new("roles").ne("owner")));
    }

    #[test]
    fn test_mismatched_kinds_never_order() {
        assert!(!eval(Field::new("name").gt(1)));
        assert!(!eval(Field::new("name").lt(1)));
        assert!(!eval(Field::new("coins").eq("250")));
    }

    #[test]
    fn test_missing_field_only_satisfies_negations() {
        assert!(!eval(Field::new("banned").eq(true)));
        assert!(eval(Field::new("banned").ne(true)));
        assert!(eval(Field::new("tags").none_of(["x"])));
    }

    #[test]
    fn test_logical_combinators() {
        let rich_admin = Field::new("coins").gte(100).and(Field::new("roles").contains("admin"));
        assert!(eval(rich_admin.clone()));
        assert!(!eval(rich_admin.not()));

        assert!(eval(Field::new("name").eq("bob").or(Field::new("stats.level").eq(7))));
        assert!(eval(Expr::all([])));
        assert!(!eval(Expr::any([])));
    }

    #[test]
    fn test_object_ids_compare() {
        let id = ObjectId::new();
        let document = doc! { "_id": id };

        assert!(DocumentEvaluator::matches(&document, &Field::new("_id").eq(id)).unwrap());
        assert!(!DocumentEvaluator::matches(&document, &Field::new("_id").eq(ObjectId::new())).unwrap());
    }
}
