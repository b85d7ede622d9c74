//! Adapter over a HuggingFace `tokenizer.json` (e.g. the GPT-2 BPE vocabulary).

use std::path::Path;

use crate::{Tokenizer, TokenizerError, TokenizerResult, END_OF_TEXT};

/// A `tokenizers::Tokenizer` behind the [`Tokenizer`] trait.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    end_of_text: u32,
}

impl HfTokenizer {
    /// Load a serialized tokenizer. The vocabulary must contain `<|endoftext|>`.
    pub fn from_file(path: &Path) -> TokenizerResult<Self> {
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| TokenizerError::Load(format!("{}: {e}", path.display())))?;
        let end_of_text = inner.token_to_id(END_OF_TEXT).ok_or_else(|| {
            TokenizerError::Load(format!("{}: no {END_OF_TEXT} token", path.display()))
        })?;
        Ok(Self { inner, end_of_text })
    }
}

impl std::fmt::Debug for HfTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfTokenizer")
            .field("vocab_size", &self.vocab_size())
            .field("end_of_text", &self.end_of_text)
            .finish()
    }
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> TokenizerResult<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| TokenizerError::EncodingError(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, tokens: &[u32]) -> TokenizerResult<String> {
        self.inner
            .decode(tokens, false)
            .map_err(|e| TokenizerError::DecodingError(e.to_string()))
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    fn end_of_text(&self) -> u32 {
        self.end_of_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_load_error() {
        let err = HfTokenizer::from_file(Path::new("/nonexistent/tokenizer.json")).unwrap_err();
        assert!(matches!(err, TokenizerError::Load(_)));
    }

    #[test]
    fn garbage_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, "not a tokenizer").unwrap();
        assert!(matches!(
            HfTokenizer::from_file(&path),
            Err(TokenizerError::Load(_))
        ));
    }
}
