//! # gpt-tokenizer
//!
//! Text ↔ token-id conversion for the completion stack.
//!
//! This crate provides:
//! - A `Tokenizer` trait for pluggable tokenization backends
//! - [`ByteTokenizer`], a byte-level reference tokenizer with exact round-trip
//! - [`HfTokenizer`], an adapter over a HuggingFace `tokenizer.json`
//! - [`fix_text`], the repair pass applied to prompts before tokenization

pub mod bytes;
pub mod hf;
pub mod repair;

pub use bytes::ByteTokenizer;
pub use hf::HfTokenizer;
pub use repair::fix_text;

/// Text of the document separator that also serves as the start token.
pub const END_OF_TEXT: &str = "<|endoftext|>";

/// Error type for tokenization operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizerError {
    #[error("Invalid token ID: {0}")]
    InvalidToken(u32),
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error("Decoding error: {0}")]
    DecodingError(String),
    #[error("Failed to load tokenizer: {0}")]
    Load(String),
}

pub type TokenizerResult<T> = std::result::Result<T, TokenizerError>;

/// Core tokenizer trait. Implementations can be swapped without changing app code.
pub trait Tokenizer: Send + Sync {
    /// Encode text into a sequence of token IDs.
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>>;

    /// Decode a complete sequence of tokens into text.
    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String>;

    /// Get vocabulary size, including special tokens.
    fn vocab_size(&self) -> usize;

    /// ID of the `<|endoftext|>` token.
    fn end_of_text(&self) -> u32;
}
