//! Translation of query expressions into MongoDB filter documents.
//!
//! Field names and operand values are escaped with [`ValueSanitizer`] so they
//! line up with what the store wrote. String operators are case-sensitive and
//! their operands are matched literally.

use bson::{Bson, Document, doc};

use sparkbase_core::{
    error::DocumentStoreError,
    query::{Expr, FieldOp, QueryVisitor},
};

use crate::sanitizer::ValueSanitizer;

pub(crate) struct MongoQueryTranslator;

fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for ch in input.chars() {
        if "\\^$.|?*+()[]{}".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    escaped
}

fn string_operand(op: FieldOp, value: &Bson) -> Result<String, DocumentStoreError> {
    match value {
        Bson::String(s) => Ok(escape_regex(s)),
        _ => Err(DocumentStoreError::Backend(format!("{op:?} operator requires a string value"))),
    }
}

/// Matches a substring for string operands and an element for anything else.
fn contains(value: &Bson) -> Document {
    match value {
        Bson::String(s) => doc! { "$regex": escape_regex(s) },
        other => doc! { "$elemMatch": { "$eq": other.clone() } },
    }
}

fn as_array(value: Bson) -> Bson {
    match value {
        Bson::Array(_) => value,
        single => Bson::Array(vec![single]),
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Document, DocumentStoreError> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Document, DocumentStoreError> {
        // `$or` rejects an empty list; an empty disjunction matches nothing.
        if exprs.is_empty() {
            return Ok(doc! { "_id": { "$in": [] } });
        }

        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Document, DocumentStoreError> {
        let inner = self.visit_expr(expr)?;

        Ok(doc! { "$nor": [inner] })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Document, DocumentStoreError> {
        let path = ValueSanitizer::sanitize_path(field);

        Ok(doc! { path: { "$exists": should_exist } })
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Document, DocumentStoreError> {
        let value = ValueSanitizer::sanitize_value(value);

        let condition = match op {
            FieldOp::Eq => doc! { "$eq": value },
            FieldOp::Ne => doc! { "$ne": value },
            FieldOp::Gt => doc! { "$gt": value },
            FieldOp::Gte => doc! { "$gte": value },
            FieldOp::Lt => doc! { "$lt": value },
            FieldOp::Lte => doc! { "$lte": value },
            FieldOp::Contains => contains(&value),
            FieldOp::NotContains => doc! { "$not": contains(&value) },
            FieldOp::StartsWith => doc! { "$regex": format!("^{}", string_operand(op, &value)?) },
            FieldOp::EndsWith => doc! { "$regex": format!("{}$", string_operand(op, &value)?) },
            FieldOp::AnyOf => doc! { "$in": as_array(value) },
            FieldOp::NoneOf => doc! { "$nin": as_array(value) },
        };

        let path = ValueSanitizer::sanitize_path(field);

        Ok(doc! { path: condition })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkbase_core::query::Field;

    fn translate(expr: Expr) -> Document {
        MongoQueryTranslator.visit_expr(&expr).unwrap()
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(translate(Field::new("coins").gte(10)), doc! { "coins": { "$gte": 10 } });
        assert_eq!(translate(Field::new("name").ne("bob")), doc! { "name": { "$ne": "bob" } });
    }

    #[test]
    fn test_values_and_paths_are_escaped() {
        assert_eq!(
            translate(Field::new("meta.$key").eq("a.b")),
            doc! { "meta.__dollar__key": { "$eq": "a__dot__b" } }
        );
    }

    #[test]
    fn test_string_operators_match_literally() {
        assert_eq!(
            translate(Field::new("name").starts_with("a+b")),
            doc! { "name": { "$regex": "^a\\+b" } }
        );
        assert_eq!(
            translate(Field::new("roles").contains(3)),
            doc! { "roles": { "$elemMatch": { "$eq": 3 } } }
        );
        assert!(MongoQueryTranslator.visit_expr(&Field::new("n").ends_with("x")).is_ok());
        assert!(
            MongoQueryTranslator
                .visit_field("n", FieldOp::EndsWith, &Bson::Int32(1))
                .is_err()
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            translate(Field::new("a").eq(1).not()),
            doc! { "$nor": [{ "a": { "$eq": 1 } }] }
        );
        assert_eq!(translate(Expr::all([])), doc! {});
        assert_eq!(translate(Expr::any([])), doc! { "_id": { "$in": [] } });
        assert_eq!(
            translate(Field::new("a").eq(1).or(Field::new("b").exists())),
            doc! { "$or": [{ "a": { "$eq": 1 } }, { "b": { "$exists": true } }] }
        );
    }

    #[test]
    fn test_membership_wraps_scalars() {
        assert_eq!(
            translate(Expr::field("role", FieldOp::AnyOf, "admin")),
            doc! { "role": { "$in": ["admin"] } }
        );
        assert_eq!(
            translate(Field::new("role").none_of(["a", "b"])),
            doc! { "role": { "$nin": ["a", "b"] } }
        );
    }
}
