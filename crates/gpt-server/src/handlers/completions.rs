//! Completion handler.
//!
//! Parameters come from the JSON body when there is one, otherwise from the
//! query string. Query values are coerced to numbers or booleans where they
//! parse as such; `prompt` and `stop` always stay strings.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use chrono::Utc;
use serde_json::{Map, Number, Value};

use crate::{
    completion::CompletionParams,
    error::ServerError,
    handlers::{log_request, pretty_json, random_id},
    models::{CompletionRequest, CompletionResponse},
    state::AppState,
};

/// Fields never coerced from query strings.
const TEXT_FIELDS: [&str; 2] = ["prompt", "stop"];

pub async fn handle_completion(
    State(state): State<AppState>,
    Path(engine_name): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServerError> {
    log_request(&method, &uri, &headers);
    let req = parse_request(&uri, &body)?;

    let engine = state.registry.resolve(&engine_name)?;
    let params = CompletionParams::from_request(req, &state.limits)?;
    let choices = Arc::clone(engine).run(params).await?;

    pretty_json(&CompletionResponse {
        id: random_id("cmpl"),
        object: "text_completion".to_string(),
        created: Utc::now().timestamp(),
        model: engine.id().to_string(),
        choices,
    })
}

fn parse_request(uri: &Uri, body: &[u8]) -> Result<CompletionRequest, ServerError> {
    if !body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice(body)
            .map_err(|e| ServerError::InvalidRequest(format!("invalid JSON body: {e}")));
    }

    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let fields: Map<String, Value> = pairs
        .into_iter()
        .map(|(key, value)| {
            let value = if TEXT_FIELDS.contains(&key.as_str()) {
                Value::String(value)
            } else {
                coerce(value)
            };
            (key, value)
        })
        .collect();
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ServerError::InvalidRequest(format!("invalid query parameters: {e}")))
}

/// int, then float, then boolean, else the string itself.
fn coerce(value: String) -> Value {
    if let Ok(i) = value.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(f) = value.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(f);
    }
    match value.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(value),
    }
}
