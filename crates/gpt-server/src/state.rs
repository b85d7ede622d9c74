//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::Limits;
use crate::registry::EngineRegistry;

#[derive(Clone)]
pub struct AppState {
    /// Engines loaded at startup; never modified afterwards.
    pub registry: Arc<EngineRegistry>,
    pub limits: Limits,
}

impl AppState {
    pub fn new(registry: EngineRegistry, limits: Limits) -> Self {
        Self {
            registry: Arc::new(registry),
            limits,
        }
    }
}
