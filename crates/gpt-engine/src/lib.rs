//! # gpt-engine
//!
//! The "narrow waist" of the completion stack. Defines the [`LanguageModel`]
//! capability and the types every other crate agrees on: token ids, model
//! [`Hyperparameters`] and the [`Past`] attention cache threaded through
//! autoregressive decoding. Backends implement `LanguageModel`; the sampler
//! and the HTTP layer only ever see the trait.
//!
//! ## Design Notes
//!
//! ### Explicit cache
//! `LanguageModel::forward` takes `&self` and the caller's `Past`. The model
//! holds only immutable weights, so every in-flight sample owns all of its
//! mutable state and samples never interfere through the model.
//!
//! ### Token Type
//! `TokenId` is `u32`, matching the id type produced by BPE tokenizers.

pub mod hparams;
pub mod past;

pub use hparams::Hyperparameters;
pub use past::{LayerPast, Past};

pub type Result<T> = std::result::Result<T, EngineError>;

/// Vocabulary index of a single token.
pub type TokenId = u32;

/// Top-level error type for model operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Context window exceeded: {len} tokens do not fit in {n_ctx}")]
    ContextOverflow { len: usize, n_ctx: usize },
}

/// Result of one forward pass.
#[derive(Debug, Clone)]
pub struct Forward {
    /// Next-token logits for the last input position.
    pub logits: Vec<f32>,
    /// Attention state produced for the input tokens only. Callers append it
    /// to their own [`Past`] with [`Past::extend`].
    pub present: Past,
}

/// A loaded autoregressive model: token sequence + cached state in,
/// next-token logits + new state out.
///
/// Implementations must be safe to call from several threads at once; any
/// per-sequence state belongs in the `Past` passed by the caller.
pub trait LanguageModel: Send + Sync {
    /// The configuration this model was built with.
    fn hparams(&self) -> &Hyperparameters;

    /// Run `tokens` through the model, attending to everything in `past`.
    ///
    /// `tokens` must be non-empty and `past.seq_len() + tokens.len()` must not
    /// exceed the context window.
    fn forward(&self, tokens: &[TokenId], past: &Past) -> Result<Forward>;
}
