//! The autoregressive sampling loop.
//!
//! ```text
//! INIT  input = prompt (or start token), past = empty
//! STEP  forward(input, past) -> logits, present
//!       past ++= present
//!       token = sample(logits, output)
//!       output += token; input = [token]
//! DONE  after exactly `length` steps
//! ```
//!
//! There is no early exit: stop sequences are applied to decoded text by the
//! caller.

use gpt_engine::{EngineError, Forward, LanguageModel, Past, TokenId};

use crate::{Sampler, SamplingError};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Model(#[from] EngineError),
    #[error("Sampling failed: {0}")]
    Sampling(#[from] SamplingError),
    #[error("context must contain at least one token")]
    EmptyContext,
    #[error("length must be at least 1")]
    ZeroLength,
}

/// How a sequence is seeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceStart {
    /// Condition on prompt tokens.
    Context(Vec<TokenId>),
    /// Unconditional generation from a single start token.
    StartToken(TokenId),
}

/// Prompt plus continuation, as produced by [`sample_sequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Every token: the (possibly truncated) prompt, then the generated ones.
    pub tokens: Vec<TokenId>,
    /// How many leading entries of `tokens` came from the prompt.
    pub prompt_len: usize,
}

impl Generation {
    /// The generated tokens only.
    pub fn completion(&self) -> &[TokenId] {
        &self.tokens[self.prompt_len..]
    }

    /// The prompt as the model saw it.
    pub fn prompt(&self) -> &[TokenId] {
        &self.tokens[..self.prompt_len]
    }
}

/// Drop the oldest tokens until `tokens.len() + length < n_ctx`.
pub fn truncate_context(mut tokens: Vec<TokenId>, length: usize, n_ctx: usize) -> Vec<TokenId> {
    let keep = n_ctx.saturating_sub(length + 1);
    if tokens.len() > keep {
        tokens.drain(..tokens.len() - keep);
    }
    tokens
}

struct GenerationState {
    output: Vec<TokenId>,
    past: Past,
    input: Vec<TokenId>,
}

impl GenerationState {
    fn step(&mut self, model: &dyn LanguageModel, sampler: &mut Sampler) -> Result<(), GenerateError> {
        let Forward { mut logits, present } = model.forward(&self.input, &self.past)?;
        logits.truncate(model.hparams().n_vocab);
        self.past.extend(present)?;

        let token = sampler.sample(&logits, &self.output)?;
        self.output.push(token);
        self.input = vec![token];
        Ok(())
    }
}

/// Generate exactly `length` tokens after `start`.
///
/// A context longer than the window allows is cut from the front. Every
/// call owns its cache and output, so a failure here affects nothing else.
pub fn sample_sequence(
    model: &dyn LanguageModel,
    start: SequenceStart,
    length: usize,
    sampler: &mut Sampler,
) -> Result<Generation, GenerateError> {
    if length == 0 {
        return Err(GenerateError::ZeroLength);
    }
    let n_ctx = model.hparams().n_ctx;

    let prompt = match start {
        SequenceStart::Context(tokens) if tokens.is_empty() => {
            return Err(GenerateError::EmptyContext)
        }
        SequenceStart::Context(tokens) => truncate_context(tokens, length, n_ctx),
        SequenceStart::StartToken(token) => vec![token],
    };
    if prompt.is_empty() || prompt.len() + length > n_ctx {
        return Err(EngineError::ContextOverflow {
            len: prompt.len().max(1) + length,
            n_ctx,
        }
        .into());
    }

    let prompt_len = prompt.len();
    let mut state = GenerationState {
        output: prompt.clone(),
        past: Past::new(),
        input: prompt,
    };
    for _ in 0..length {
        state.step(model, sampler)?;
    }

    tracing::debug!(prompt_tokens = prompt_len, generated = length, "sampled sequence");
    Ok(Generation {
        tokens: state.output,
        prompt_len,
    })
}
