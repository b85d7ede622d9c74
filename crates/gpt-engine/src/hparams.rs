//! Model hyperparameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{EngineError, Result};

/// Architecture and vocabulary configuration for a loaded model.
///
/// Deserialization fills any missing field from the GPT-2 117M defaults, so a
/// `hparams.json` only needs to name what differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Vocabulary size (width of the logit vector).
    pub n_vocab: usize,
    /// Context window length in tokens.
    pub n_ctx: usize,
    /// Hidden size.
    pub n_embd: usize,
    /// Attention heads per layer.
    pub n_head: usize,
    /// Number of transformer blocks.
    pub n_layer: usize,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_vocab: 50257,
            n_ctx: 1024,
            n_embd: 768,
            n_head: 12,
            n_layer: 12,
        }
    }
}

impl Hyperparameters {
    /// Parse hyperparameters from JSON text and validate them.
    pub fn from_json(text: &str) -> Result<Self> {
        let hparams: Self = serde_json::from_str(text)
            .map_err(|e| EngineError::ModelLoad(format!("invalid hparams: {e}")))?;
        hparams.validate()?;
        Ok(hparams)
    }

    /// Read and validate a `hparams.json` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::ModelLoad(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Width of a single attention head.
    pub fn head_dim(&self) -> usize {
        self.n_embd / self.n_head
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_vocab == 0 || self.n_embd == 0 || self.n_head == 0 || self.n_layer == 0 {
            return Err(EngineError::ModelLoad(format!(
                "hyperparameters must be positive: {self:?}"
            )));
        }
        if self.n_embd % self.n_head != 0 {
            return Err(EngineError::ModelLoad(format!(
                "n_embd {} is not divisible by n_head {}",
                self.n_embd, self.n_head
            )));
        }
        // At least one prompt token plus one generated token must fit.
        if self.n_ctx <= 2 {
            return Err(EngineError::ModelLoad(format!(
                "n_ctx must be greater than 2, got {}",
                self.n_ctx
            )));
        }
        Ok(())
    }
}
