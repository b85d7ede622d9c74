//! # gpt-sampling
//!
//! Turns next-token logits into tokens.
//!
//! Supports:
//! - Temperature scaling
//! - Frequency penalty (lerp of used tokens toward the minimum logit)
//! - Top-k filtering
//! - Top-p (nucleus) filtering
//! - Categorical draws from a seedable RNG
//! - The fixed-length autoregressive loop over a [`gpt_engine::LanguageModel`]

pub mod logits;
pub mod sampler;
pub mod sequence;

pub use logits::{apply_transforms, penalize_used, softmax, top_k_logits, top_p_logits, MASKED_LOGIT};
pub use sampler::{Sampler, SamplingParams};
pub use sequence::{sample_sequence, truncate_context, GenerateError, Generation, SequenceStart};

/// Sampling error type.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingError {
    InvalidLogits,
    InvalidTemperature,
    InvalidTopP,
    InvalidPenalty,
    NoValidTokens,
}

impl std::fmt::Display for SamplingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingError::InvalidLogits => write!(f, "Invalid logits array"),
            SamplingError::InvalidTemperature => write!(f, "Temperature must be > 0"),
            SamplingError::InvalidTopP => write!(f, "top_p must be in (0, 1]"),
            SamplingError::InvalidPenalty => write!(f, "Frequency penalty must be finite and > 0"),
            SamplingError::NoValidTokens => write!(f, "No valid tokens after filtering"),
        }
    }
}

impl std::error::Error for SamplingError {}

pub type SamplingResult<T> = std::result::Result<T, SamplingError>;
