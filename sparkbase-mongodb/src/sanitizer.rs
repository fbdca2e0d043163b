//! Escaping of characters MongoDB reserves in field names.
//!
//! MongoDB does not allow `.` or `$` in stored keys and treats `\0` as a
//! terminator. Documents are escaped on the way in and restored on the way
//! out; string values go through the same mapping so that a restored
//! document is identical to the one that was stored, and criteria built from
//! restored documents escape back to what is on disk.
//!
//! The mapping is only reversible for input that does not already contain a
//! replacement marker; `"a__dot__b"` restores to `"a.b"`.

use bson::{Bson, Document};

pub(crate) struct ValueSanitizer;

impl ValueSanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    pub(crate) fn sanitize_string(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .fold(input.to_string(), |acc, (target, replacement)| acc.replace(target, replacement))
    }

    pub(crate) fn restore_string(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .rev()
            .fold(input.to_string(), |acc, (target, replacement)| acc.replace(replacement, target))
    }

    /// Escapes each segment of a dotted field path, keeping the separators.
    pub(crate) fn sanitize_path(path: &str) -> String {
        path.split('.')
            .map(Self::sanitize_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub(crate) fn sanitize_value(value: &Bson) -> Bson {
        match value {
            Bson::String(s) => Bson::String(Self::sanitize_string(s)),
            Bson::Array(items) => Bson::Array(items.iter().map(Self::sanitize_value).collect()),
            Bson::Document(document) => Bson::Document(Self::sanitize_document(document)),
            _ => value.clone(),
        }
    }

    pub(crate) fn restore_value(value: &Bson) -> Bson {
        match value {
            Bson::String(s) => Bson::String(Self::restore_string(s)),
            Bson::Array(items) => Bson::Array(items.iter().map(Self::restore_value).collect()),
            Bson::Document(document) => Bson::Document(Self::restore_document(document)),
            _ => value.clone(),
        }
    }

    pub(crate) fn sanitize_document(document: &Document) -> Document {
        document
            .iter()
            .map(|(key, value)| (Self::sanitize_string(key), Self::sanitize_value(value)))
            .collect()
    }

    pub(crate) fn restore_document(document: &Document) -> Document {
        document
            .iter()
            .map(|(key, value)| (Self::restore_string(key), Self::restore_value(value)))
            .collect()
    }
}
