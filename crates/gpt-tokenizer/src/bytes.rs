//! Byte-level reference tokenizer.

use crate::{Tokenizer, TokenizerError, TokenizerResult, END_OF_TEXT};

/// One token per UTF-8 byte, plus `<|endoftext|>` at id 256.
///
/// - Bidirectional and exact: `decode(encode(x)) == x` for every string
/// - Deterministic, no vocabulary file
/// - Used by models shipped without a `tokenizer.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteTokenizer;

impl ByteTokenizer {
    /// Vocabulary size: 256 byte values and the end-of-text token.
    pub const VOCAB_SIZE: usize = 257;
    pub const END_OF_TEXT_ID: u32 = 256;

    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>> {
        Ok(text.bytes().map(u32::from).collect())
    }

    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String> {
        let mut bytes = Vec::with_capacity(tokens.len());
        for &id in tokens {
            match id {
                0..=255 => bytes.push(id as u8),
                Self::END_OF_TEXT_ID => bytes.extend_from_slice(END_OF_TEXT.as_bytes()),
                _ => return Err(TokenizerError::InvalidToken(id)),
            }
        }
        // Sampled byte sequences are not guaranteed to be valid UTF-8.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn vocab_size(&self) -> usize {
        Self::VOCAB_SIZE
    }

    fn end_of_text(&self) -> u32 {
        Self::END_OF_TEXT_ID
    }
}
