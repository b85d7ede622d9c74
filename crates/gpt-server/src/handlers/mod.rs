//! HTTP request handlers for API endpoints.

pub mod completions;
pub mod engines;
pub mod health;

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::Serialize;

use crate::error::ServerError;

pub use completions::handle_completion;
pub use engines::handle_engines;
pub use health::handle_health;

/// Log an incoming request without its credentials.
pub(crate) fn log_request(method: &Method, uri: &Uri, headers: &HeaderMap) {
    let headers: BTreeMap<&str, &str> = headers
        .iter()
        .filter(|(name, _)| *name != header::AUTHORIZATION)
        .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or("<binary>")))
        .collect();
    tracing::debug!(%method, %uri, ?headers, "request");
}

/// `<prefix>-` followed by 18 random bytes in URL-safe base64.
pub fn random_id(prefix: &str) -> String {
    let bytes: [u8; 18] = rand::random();
    format!("{prefix}-{}", URL_SAFE.encode(bytes))
}

/// JSON with sorted keys and two-space indentation.
pub(crate) fn pretty_json<T: Serialize>(value: &T) -> Result<Response, ServerError> {
    // Round-trip through `Value` so object keys come out sorted.
    let body = serde_json::to_string_pretty(&serde_json::to_value(value)?)?;
    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response())
}
