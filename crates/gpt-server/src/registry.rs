//! Engine registry: built once at startup, read-only afterwards.

use std::sync::Arc;

use gpt_engine::EngineError;
use gpt_runtime::{discover_models, load_model};

use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::ServerError;

/// Loaded engines, in load order.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: Vec<Arc<Engine>>,
}

impl EngineRegistry {
    pub fn new(engines: Vec<Engine>) -> Self {
        Self {
            engines: engines.into_iter().map(Arc::new).collect(),
        }
    }

    /// Load each id with `loader`. Failures are logged and skipped, as are
    /// repeated ids.
    pub fn load<F>(ids: &[String], mut loader: F) -> Self
    where
        F: FnMut(&str) -> Result<Engine, EngineError>,
    {
        let mut registry = Self::default();
        for id in ids {
            if registry.get(id).is_some() {
                tracing::warn!(model = %id, "model listed twice; keeping the first");
                continue;
            }
            match loader(id) {
                Ok(engine) => registry.engines.push(Arc::new(engine)),
                Err(e) => tracing::error!(model = %id, error = %e, "failed to load model"),
            }
        }
        registry
    }

    /// Load the configured models, or every model under the model path.
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut ids = config.requested_models();
        if ids.is_empty() {
            ids = discover_models(&config.model_path).unwrap_or_else(|e| {
                tracing::error!(error = %e, "could not list model directory");
                Vec::new()
            });
        }
        Self::load(&ids, |id| load_model(&config.model_path, id).map(Engine::from))
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Engine>> {
        self.engines.iter().find(|e| e.id() == id)
    }

    /// Exact match, else the first engine. Errors only when nothing is loaded.
    pub fn resolve(&self, requested: &str) -> Result<&Arc<Engine>, ServerError> {
        if let Some(engine) = self.get(requested) {
            return Ok(engine);
        }
        let fallback = self.engines.first().ok_or(ServerError::NoEngines)?;
        tracing::warn!(requested, using = %fallback.id(), "unknown engine, using fallback");
        Ok(fallback)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.engines.iter().map(|e| e.id())
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
