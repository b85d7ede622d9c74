//! A model whose every prediction is known in advance.
//!
//! The next token is the one following the last input token in a fixed
//! script, wrapping at the end. Tokens the script does not contain restart it
//! from the beginning. The target gets a logit far above the rest, so
//! sampling at any sane temperature reproduces the script exactly.

use gpt_engine::{EngineError, Forward, Hyperparameters, LanguageModel, Past, Result, TokenId};
use gpt_tokenizer::ByteTokenizer;

const TARGET_LOGIT: f32 = 100.0;

#[derive(Debug, Clone)]
pub struct ScriptedModel {
    hparams: Hyperparameters,
    script: Vec<TokenId>,
}

impl ScriptedModel {
    pub fn new(hparams: Hyperparameters, script: Vec<TokenId>) -> Self {
        Self { hparams, script }
    }

    /// Script the UTF-8 bytes of `text` over the byte-level vocabulary.
    pub fn from_text(text: &str, n_ctx: usize) -> Self {
        let hparams = Hyperparameters {
            n_vocab: ByteTokenizer::VOCAB_SIZE,
            n_ctx,
            n_embd: 8,
            n_head: 1,
            n_layer: 1,
        };
        Self::new(hparams, text.bytes().map(TokenId::from).collect())
    }

    fn next_token(&self, last: TokenId) -> Option<TokenId> {
        match self.script.iter().position(|&t| t == last) {
            Some(pos) => self.script.get((pos + 1) % self.script.len()).copied(),
            None => self.script.first().copied(),
        }
    }
}

impl LanguageModel for ScriptedModel {
    fn hparams(&self) -> &Hyperparameters {
        &self.hparams
    }

    fn forward(&self, tokens: &[TokenId], past: &Past) -> Result<Forward> {
        let last = *tokens
            .last()
            .ok_or_else(|| EngineError::Inference("forward called with no tokens".into()))?;
        let len = past.seq_len() + tokens.len();
        if len > self.hparams.n_ctx {
            return Err(EngineError::ContextOverflow {
                len,
                n_ctx: self.hparams.n_ctx,
            });
        }
        let next = self
            .next_token(last)
            .ok_or_else(|| EngineError::Inference("empty script".into()))?;

        let mut logits = vec![0.0; self.hparams.n_vocab];
        let slot = logits
            .get_mut(next as usize)
            .ok_or_else(|| EngineError::Inference(format!("script token {next} outside vocabulary")))?;
        *slot = TARGET_LOGIT;
        Ok(Forward {
            logits,
            present: Past::from_layers(Vec::new(), tokens.len()),
        })
    }
}
