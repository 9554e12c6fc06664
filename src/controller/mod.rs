//! Generic resource controller.
//!
//! A [`ResourceController`] binds one collection and identity field to the
//! five record operations (create, read, update, delete, query) and maps
//! their outcomes to HTTP statuses. The operations themselves live behind the
//! [`RecordOperations`] trait so a resource can replace any one of them.

pub mod operations;
pub mod resource;

use std::fmt;

use serde_json::{Number, Value};

use crate::database::Document;

pub use operations::{RecordOperations, StandardOperations};
pub use resource::{ControllerReply, ResourceController};

/// Identity field used when a resource does not name its own
pub const DEFAULT_IDENTITY_FIELD: &str = "_id";

/// The collection and identity field a controller operates on.
/// Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionBinding {
    collection: String,
    identity_field: String,
}

impl CollectionBinding {
    pub fn new(collection: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            identity_field: identity_field.into(),
        }
    }

    pub fn with_default_identity(collection: impl Into<String>) -> Self {
        Self::new(collection, DEFAULT_IDENTITY_FIELD)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    /// `{identityField: id}`
    pub fn filter_for(&self, id: &Value) -> Document {
        let mut filter = Document::new();
        filter.insert(self.identity_field.clone(), id.clone());
        filter
    }
}

/// A record identifier taken from the request path.
///
/// Keeps the raw path text next to the typed value used in store filters.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordId {
    raw: String,
    value: Value,
}

impl RecordId {
    /// Integer identifiers; anything else (including `1.5` or `0x10`) is rejected
    pub fn numeric(raw: &str) -> Option<Self> {
        let parsed: i64 = raw.parse().ok()?;
        Some(Self {
            raw: raw.to_string(),
            value: Value::Number(Number::from(parsed)),
        })
    }

    pub fn text(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            value: Value::String(raw.to_string()),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The same identifier in string form
    pub fn to_text(&self) -> Self {
        Self::text(&self.raw)
    }

    /// Whether a body's declared identifier refers to this id. Numbers and
    /// numeric strings compare by value, so `-1` matches path `-1`.
    pub fn matches(&self, declared: &Value) -> bool {
        match declared {
            Value::Number(n) => match (n.as_f64(), self.raw.trim().parse::<f64>()) {
                (Some(declared), Ok(path)) => declared == path,
                _ => false,
            },
            Value::String(s) if s == &self.raw => true,
            Value::String(s) => match (s.trim().parse::<f64>(), self.raw.trim().parse::<f64>()) {
                (Ok(declared), Ok(path)) => declared == path,
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_ids_parse_integers_only() {
        assert_eq!(RecordId::numeric("-1").unwrap().value(), &json!(-1));
        assert_eq!(RecordId::numeric("42").unwrap().value(), &json!(42));
        assert!(RecordId::numeric("abc").is_none());
        assert!(RecordId::numeric("1.5").is_none());
        assert!(RecordId::numeric("").is_none());
    }

    #[test]
    fn text_form_keeps_raw_path() {
        let id = RecordId::numeric("1001").unwrap().to_text();
        assert_eq!(id.value(), &json!("1001"));
        assert_eq!(id.to_string(), "1001");
    }

    #[test]
    fn declared_ids_compare_loosely() {
        let id = RecordId::numeric("-1").unwrap();
        assert!(id.matches(&json!(-1)));
        assert!(id.matches(&json!("-1")));
        assert!(id.matches(&json!(-1.0)));
        assert!(!id.matches(&json!(-2)));
        assert!(!id.matches(&Value::Null));

        let id = RecordId::text("sword");
        assert!(id.matches(&json!("sword")));
        assert!(!id.matches(&json!("shield")));
    }

    #[test]
    fn binding_builds_identity_filters() {
        let binding = CollectionBinding::new("players", "userId");
        assert_eq!(binding.filter_for(&json!(-1)), json!({"userId": -1}).as_object().cloned().unwrap());

        let binding = CollectionBinding::with_default_identity("logs");
        assert_eq!(binding.identity_field(), "_id");
    }
}
