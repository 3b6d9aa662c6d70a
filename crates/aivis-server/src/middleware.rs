use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request id that is echoed back.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id for one request, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuses the caller's `x-request-id` when it is short and made of
    /// token characters; anything else gets a fresh `UUIDv4`.
    fn from_header(value: Option<&HeaderValue>) -> Self {
        let supplied = value
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| is_valid_request_id(id));
        match supplied {
            Some(id) => Self(id.to_owned()),
            None => Self(Uuid::new_v4().to_string()),
        }
    }
}

fn is_valid_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

/// Bearer tokens accepted by the protected routes.
#[derive(Debug, Default)]
pub struct ApiKeys(HashSet<String>);

impl ApiKeys {
    /// Parses a comma-separated key list. Blank entries are ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }
}

/// Auth settings for the protected router. `None` means auth is off.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Option<Arc<ApiKeys>>,
}

impl AuthState {
    /// Reads `AIVIS_API_KEYS` (comma-separated bearer tokens).
    ///
    /// # Errors
    ///
    /// Fails outside development when no keys are configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("AIVIS_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// An empty key list turns auth off in development only.
    ///
    /// # Errors
    ///
    /// Fails outside development when `raw` holds no keys.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys = ApiKeys::parse(raw);
        if keys.is_empty() {
            if is_development {
                tracing::warn!("AIVIS_API_KEYS not set; project routes are open in development");
                return Ok(Self::disabled());
            }
            anyhow::bail!(
                "AIVIS_API_KEYS is required outside development; set comma-separated bearer tokens"
            );
        }

        tracing::info!(keys = keys.len(), "bearer auth enabled for project routes");
        Ok(Self {
            keys: Some(Arc::new(keys)),
        })
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { keys: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.keys.is_some()
    }

    /// Whether a request carrying `token` may proceed.
    fn admits(&self, token: Option<&str>) -> bool {
        match (&self.keys, token) {
            (None, _) => true,
            (Some(keys), Some(token)) => keys.contains(token),
            (Some(_), None) => false,
        }
    }
}

/// Attaches a [`RequestId`] to the request and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_header(req.headers().get(REQUEST_ID_HEADER));
    let echoed = HeaderValue::from_str(&id.0).ok();
    req.extensions_mut().insert(id);

    let mut res = next.run(req).await;
    if let Some(value) = echoed {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Rejects protected requests without an accepted bearer token.
///
/// The 401 uses the regular API error envelope so clients can correlate it
/// through `meta.request_id`.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if auth.admits(extract_bearer_token(req.headers().get(AUTHORIZATION))) {
        return next.run(req).await;
    }

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| Uuid::new_v4().to_string(), |id| id.0.clone());
    tracing::debug!(
        request_id = %request_id,
        path = %req.uri().path(),
        "rejected request without a valid bearer token"
    );

    let mut res = ApiError::new(
        request_id,
        "unauthorized",
        "missing or invalid bearer token",
    )
    .into_response();
    res.headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    res
}

/// Token from an `Authorization: Bearer <token>` header. The scheme is
/// matched case-insensitively.
fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    let (scheme, token) = value?.to_str().ok()?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
