use serde_json::Value;

use super::resource::IdentityKind;
use crate::controller::RecordId;
use crate::database::Document;
use crate::error::ApiError;

/// Per-resource request checks, run after authentication and before any
/// store access.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    label: &'static str,
    identity: IdentityKind,
}

/// A validated query request: the filter and an optional projection
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub filter: Document,
    pub projection: Option<Document>,
}

impl RequestValidator {
    pub fn new(label: &'static str, identity: IdentityKind) -> Self {
        Self { label, identity }
    }

    /// Path identifier: present, and numeric when the resource says so
    pub fn record_id(&self, raw: &str) -> Result<RecordId, ApiError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ApiError::bad_request(
                "Error: Malformed request. Please include ID parameter in the request path",
            ));
        }

        match self.identity {
            IdentityKind::Numeric => RecordId::numeric(raw).ok_or_else(|| {
                ApiError::bad_request(format!("Error: Malformed request. {} IDs must be numeric", self.label))
            }),
            IdentityKind::Text => Ok(RecordId::text(raw)),
        }
    }

    pub fn require_body(&self, verb: &str, body: &Document) -> Result<(), ApiError> {
        if body.is_empty() {
            return Err(ApiError::bad_request(format!(
                "Error: Malformed Request. {} must have request body",
                verb
            )));
        }
        Ok(())
    }

    /// `{query: <filter>, project?: <projection>}`. Form bodies carry both as
    /// JSON text.
    pub fn query_request(&self, mut body: Document) -> Result<QueryRequest, ApiError> {
        let filter = body.remove("query").and_then(as_object).ok_or_else(|| {
            ApiError::bad_request(format!(
                "Error: Malformed request. {} data query must include a query in the request body",
                self.label
            ))
        })?;

        let projection = match body.remove("project") {
            None | Some(Value::Null) => None,
            Some(value) => Some(as_object(value).ok_or_else(|| {
                ApiError::bad_request("Error: Malformed request. Query projection must be an object")
            })?),
        };

        Ok(QueryRequest { filter, projection })
    }
}

fn as_object(value: Value) -> Option<Document> {
    match value {
        Value::Object(map) => Some(map),
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}
