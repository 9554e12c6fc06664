use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
};
use serde_json::Value;

use crate::database::Document;
use crate::error::ApiError;

pub const REQUEST_TOO_LARGE: &str = "Error: Request body too large";

/// Request body decoded into a JSON object.
///
/// JSON and form-encoded bodies are understood; an empty body, or one of any
/// other content type, is an empty object.
#[derive(Debug, Clone, Default)]
pub struct RequestBody(pub Document);

#[async_trait]
impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let kind = BodyKind::from_headers(req.headers());
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::payload_too_large(REQUEST_TOO_LARGE)
            } else {
                ApiError::bad_request(e.body_text())
            }
        })?;
        parse_body(kind, &bytes).map(RequestBody)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
            // No declared type: treat as JSON if there is anything to read
            return BodyKind::Json;
        };

        let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if mime == "application/x-www-form-urlencoded" {
            BodyKind::Form
        } else if mime == "application/json" || mime.ends_with("+json") {
            BodyKind::Json
        } else {
            BodyKind::Other
        }
    }
}

pub fn parse_body(kind: BodyKind, bytes: &[u8]) -> Result<Document, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }

    match kind {
        BodyKind::Json => match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ApiError::bad_request("Error: Malformed request. Request body must be a JSON object")),
            Err(e) => Err(ApiError::bad_request(format!("Error: Malformed request. Invalid JSON body: {}", e))),
        },
        BodyKind::Form => Ok(url::form_urlencoded::parse(bytes)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect()),
        BodyKind::Other => Ok(Document::new()),
    }
}

/// Serialize a body back into bytes of the same kind
pub fn encode_body(kind: BodyKind, body: &Document) -> Vec<u8> {
    match kind {
        BodyKind::Form => {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in body {
                match value {
                    Value::String(s) => serializer.append_pair(key, s),
                    other => serializer.append_pair(key, &other.to_string()),
                };
            }
            serializer.finish().into_bytes()
        }
        _ => Value::Object(body.clone()).to_string().into_bytes(),
    }
}
