//! Attention cache ("past") carried between decoding steps.
//!
//! A forward pass returns a `present` covering only the tokens it was given.
//! The caller concatenates it onto its `Past` along the sequence axis, so the
//! next step attends to the full history. Nothing is ever overwritten.

use crate::{EngineError, Result};

/// Cached keys and values for one transformer layer.
///
/// Both buffers are flattened `[seq_len, n_embd]`, row per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPast {
    pub keys: Vec<f32>,
    pub values: Vec<f32>,
}

impl LayerPast {
    fn append(&mut self, other: LayerPast) {
        self.keys.extend(other.keys);
        self.values.extend(other.values);
    }
}

/// Cached attention state for every layer of a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Past {
    layers: Vec<LayerPast>,
    seq_len: usize,
}

impl Past {
    /// An empty cache: no positions processed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap per-layer state covering `seq_len` positions.
    ///
    /// Models without attention state may pass an empty `layers`.
    pub fn from_layers(layers: Vec<LayerPast>, seq_len: usize) -> Self {
        Self { layers, seq_len }
    }

    /// Number of positions cached.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn is_empty(&self) -> bool {
        self.seq_len == 0
    }

    pub fn layers(&self) -> &[LayerPast] {
        &self.layers
    }

    /// State for layer `idx`, if any has been cached.
    pub fn layer(&self, idx: usize) -> Option<&LayerPast> {
        self.layers.get(idx)
    }

    /// Concatenate `present` after the cached positions.
    pub fn extend(&mut self, present: Past) -> Result<()> {
        if self.is_empty() {
            *self = present;
            return Ok(());
        }
        if present.layers.len() != self.layers.len() {
            return Err(EngineError::Inference(format!(
                "cache layer mismatch: past has {}, present has {}",
                self.layers.len(),
                present.layers.len()
            )));
        }
        for (layer, new) in self.layers.iter_mut().zip(present.layers) {
            layer.append(new);
        }
        self.seq_len += present.seq_len;
        Ok(())
    }
}
