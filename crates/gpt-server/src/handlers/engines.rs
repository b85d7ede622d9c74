//! Engine listing handler.

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    Json,
};

use crate::handlers::log_request;
use crate::models::{EngineInfo, EngineList};
use crate::state::AppState;

pub async fn handle_engines(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<EngineList> {
    log_request(&method, &uri, &headers);
    Json(state.registry.ids().map(EngineInfo::ready).collect())
}
