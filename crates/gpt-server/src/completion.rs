//! Completion orchestration: request normalization, per-sample generation,
//! stop-sequence truncation and choice assembly.

use gpt_sampling::{sample_sequence, Sampler, SamplingParams, SequenceStart};
use gpt_tokenizer::fix_text;

use crate::config::Limits;
use crate::engine::Engine;
use crate::error::ServerError;
use crate::models::{Choice, CompletionRequest, FinishReason};

const DEFAULT_TEMPERATURE: f32 = 0.9;
const DEFAULT_TOP_P: f32 = 1.0;
const DEFAULT_MAX_TOKENS: usize = 16;
const DEFAULT_N: usize = 1;
/// Penalty factor meaning "leave logits alone".
const NO_PENALTY: f32 = 1.0;

/// A request after defaults, ceilings and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub prompts: Vec<String>,
    pub n: usize,
    pub max_tokens: usize,
    pub echo: bool,
    pub stop: Vec<String>,
    pub sampling: SamplingParams,
}

impl CompletionParams {
    pub fn from_request(req: CompletionRequest, limits: &Limits) -> Result<Self, ServerError> {
        for key in req.extra.keys() {
            tracing::info!(param = %key, "ignoring unrecognized parameter");
        }

        let temperature = req.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(ServerError::InvalidRequest(format!(
                "temperature must be greater than 0, got {temperature}"
            )));
        }
        let top_p = req.top_p.unwrap_or(DEFAULT_TOP_P);
        if !top_p.is_finite() || top_p <= 0.0 || top_p > 1.0 {
            return Err(ServerError::InvalidRequest(format!(
                "top_p must be in (0, 1], got {top_p}"
            )));
        }
        let top_k = usize::try_from(req.top_k.unwrap_or(0)).map_err(|_| {
            ServerError::InvalidRequest("top_k must be a non-negative integer".to_string())
        })?;
        let max_tokens = positive(req.max_tokens, DEFAULT_MAX_TOKENS, "max_tokens")?
            .min(limits.max_tokens);
        let n = positive(req.n, DEFAULT_N, "n")?.min(limits.max_n);

        let frequency_penalty = match req.frequency_penalty {
            Some(p) if !p.is_finite() => {
                return Err(ServerError::InvalidRequest(format!(
                    "frequency_penalty must be finite, got {p}"
                )))
            }
            Some(p) if p > 0.0 => p,
            _ => NO_PENALTY,
        };

        let stop: Vec<String> = req
            .stop
            .map(|s| s.into_vec())
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if !stop.is_empty() {
            tracing::debug!(?stop, "stop sequences");
        }

        let sampling = SamplingParams {
            temperature,
            top_k,
            top_p,
            frequency_penalty,
        };
        sampling.validate()?;

        Ok(Self {
            prompts: req.prompt.map(|p| p.into_vec()).unwrap_or_else(|| vec![String::new()]),
            n,
            max_tokens,
            echo: req.echo.unwrap_or(false),
            stop,
            sampling,
        })
    }
}

fn positive(value: Option<i64>, default: usize, name: &str) -> Result<usize, ServerError> {
    match value {
        None => Ok(default),
        Some(v) if v >= 1 => Ok(usize::try_from(v).unwrap_or(usize::MAX)),
        Some(v) => Err(ServerError::InvalidRequest(format!(
            "{name} must be at least 1, got {v}"
        ))),
    }
}

/// Truncate `text` at the first occurrence of `stop`, ignoring occurrences
/// that start the text (repeatedly).
pub fn stop_text_1(stop: &str, text: &str) -> String {
    if stop.is_empty() {
        return text.to_string();
    }
    let mut offset = 0;
    while text[offset..].starts_with(stop) {
        offset += stop.len();
    }
    match text[offset..].find(stop) {
        Some(pos) => text[..offset + pos].to_string(),
        None => text.to_string(),
    }
}

/// Apply every stop sequence in turn. Returns whether the text changed.
pub fn stop_text(stops: &[String], text: String) -> (bool, String) {
    let truncated = stops
        .iter()
        .fold(text.clone(), |acc, stop| stop_text_1(stop, &acc));
    (truncated != text, truncated)
}

impl Engine {
    /// Run every requested sample for every prompt. Blocking.
    pub fn complete(&self, params: &CompletionParams) -> Result<Vec<Choice>, ServerError> {
        let n_ctx = self.hparams().n_ctx;
        let length = params.max_tokens.min(n_ctx.saturating_sub(2)).max(1);
        if length < params.max_tokens {
            tracing::debug!(
                engine = %self.id(),
                requested = params.max_tokens,
                length,
                "max_tokens clamped to context window"
            );
        }

        let mut choices = Vec::with_capacity(params.prompts.len() * params.n);
        for prompt in &params.prompts {
            let prompt = fix_text(prompt);
            let tokens = self.tokenizer.encode(&prompt)?;

            for index in 0..params.n {
                let start = if tokens.is_empty() {
                    SequenceStart::StartToken(self.tokenizer.end_of_text())
                } else {
                    SequenceStart::Context(tokens.clone())
                };
                let mut sampler = Sampler::new(params.sampling)?;
                let generation = sample_sequence(self.model.as_ref(), start, length, &mut sampler)?;
                let completion = self.tokenizer.decode(generation.completion())?;
                tracing::debug!(engine = %self.id(), index, text = ?completion, "completion");

                let (stopped, completion) = stop_text(&params.stop, completion);
                let text = if params.echo {
                    format!("{prompt}{completion}")
                } else {
                    completion
                };
                choices.push(Choice {
                    index,
                    logprobs: None,
                    text,
                    finish_reason: if stopped {
                        FinishReason::Stop
                    } else {
                        FinishReason::Length
                    },
                });
            }
        }
        Ok(choices)
    }
}
