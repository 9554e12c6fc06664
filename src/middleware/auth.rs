use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, header::CONTENT_LENGTH, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::DecodingKey;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{encode_body, parse_body, BodyKind, REQUEST_TOO_LARGE};
use crate::auth::{decoding_key, verify_jwt, Claims, JwtError};
use crate::config::AppConfig;
use crate::error::ApiError;

/// Name of the body field and query parameter that may carry the token
const TOKEN_FIELD: &str = "token";

/// Authenticated identity attached to every request that passes the gate
#[derive(Clone, Debug, PartialEq)]
pub enum AuthUser {
    Token(Claims),
    /// Authentication is disabled; no identity is known
    Anonymous,
}

/// Where a request's token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Body,
    Query,
}

/// Authentication mode chosen at startup and fixed for the process lifetime
#[derive(Clone)]
pub enum AuthGate {
    Enabled {
        key: Arc<DecodingKey>,
        max_body_bytes: usize,
    },
    Disabled,
}

impl AuthGate {
    pub fn from_config(config: &AppConfig) -> Result<Self, JwtError> {
        if config.security.auth_disabled {
            warn!("Warning: Auth is disabled. Only use no-auth mode for testing!");
            return Ok(AuthGate::Disabled);
        }

        let secret = config.security.client_secret.as_deref().unwrap_or_default();
        Self::enabled(secret, config.server.max_body_bytes)
    }

    pub fn enabled(secret: &str, max_body_bytes: usize) -> Result<Self, JwtError> {
        Ok(AuthGate::Enabled {
            key: Arc::new(decoding_key(secret)?),
            max_body_bytes,
        })
    }

    pub fn disabled() -> Self {
        AuthGate::Disabled
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, AuthGate::Enabled { .. })
    }

    /// Verify the request's token and attach the resulting [`AuthUser`]
    pub async fn authenticate(&self, request: Request) -> Result<Request, ApiError> {
        let (key, max_body_bytes) = match self {
            AuthGate::Disabled => {
                let mut request = request;
                request.extensions_mut().insert(AuthUser::Anonymous);
                return Ok(request);
            }
            AuthGate::Enabled { key, max_body_bytes } => (key, *max_body_bytes),
        };

        let (mut request, found) = extract_token(request, max_body_bytes).await?;
        let Some((token, source)) = found else {
            debug!("Rejected request without token: {}", request.uri().path());
            return Err(ApiError::unauthorized("Unauthorized"));
        };

        let claims = verify_jwt(&token, key).map_err(|e| {
            debug!("Rejected token from {:?}: {}", source, e);
            ApiError::unauthorized("Unauthorized")
        })?;

        request.extensions_mut().insert(AuthUser::Token(claims));
        Ok(request)
    }
}

/// Middleware guarding every resource operation
pub async fn require_auth(State(gate): State<AuthGate>, request: Request, next: Next) -> Response {
    match gate.authenticate(request).await {
        Ok(request) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

/// Find the token in the bearer header, then the body's `token` field, then
/// the `token` query parameter; the first source that has one wins.
///
/// A token taken from the body is removed from it before the request moves on.
async fn extract_token(
    request: Request,
    max_body_bytes: usize,
) -> Result<(Request, Option<(String, TokenSource)>), ApiError> {
    if let Some(token) = bearer_token(request.headers()) {
        return Ok((request, Some((token, TokenSource::Header))));
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|_| ApiError::payload_too_large(REQUEST_TOO_LARGE))?;

    let kind = BodyKind::from_headers(&parts.headers);
    if let Ok(mut fields) = parse_body(kind, &bytes) {
        if let Some(Value::String(token)) = fields.remove(TOKEN_FIELD) {
            parts.headers.remove(CONTENT_LENGTH);
            let body = Body::from(encode_body(kind, &fields));
            return Ok((Request::from_parts(parts, body), Some((token, TokenSource::Body))));
        }
    }

    let token = parts.uri.query().and_then(query_token);
    let request = Request::from_parts(parts, Body::from(bytes));
    Ok((request, token.map(|t| (t, TokenSource::Query))))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn query_token(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TOKEN_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}
