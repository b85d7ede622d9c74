//! Temperature scaling plus a categorical draw over transformed logits.

use gpt_engine::TokenId;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::logits::{apply_transforms, softmax, MASKED_LOGIT};
use crate::{SamplingError, SamplingResult};

/// Lower bound for temperature-scaled logits. Sits above [`MASKED_LOGIT`] so a
/// filtered entry always ranks below every surviving one.
const SCALED_FLOOR: f32 = MASKED_LOGIT / 2.0;

/// Per-request sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Softmax temperature. > 1.0 = more random, < 1.0 = more deterministic.
    pub temperature: f32,
    /// Keep only the `k` most likely tokens; 0 disables.
    pub top_k: usize,
    /// Nucleus threshold in (0, 1]; 1.0 disables.
    pub top_p: f32,
    /// Multiplier pulling used tokens toward the minimum logit; 1.0 disables.
    pub frequency_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_k: 0,
            top_p: 1.0,
            frequency_penalty: 1.0,
        }
    }
}

impl SamplingParams {
    pub fn validate(&self) -> SamplingResult<()> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(SamplingError::InvalidTemperature);
        }
        if !self.top_p.is_finite() || self.top_p <= 0.0 || self.top_p > 1.0 {
            return Err(SamplingError::InvalidTopP);
        }
        if !self.frequency_penalty.is_finite() || self.frequency_penalty <= 0.0 {
            return Err(SamplingError::InvalidPenalty);
        }
        Ok(())
    }
}

/// Draws one token per call. Owns its RNG, so every sample gets an
/// independent stream.
#[derive(Debug, Clone)]
pub struct Sampler {
    params: SamplingParams,
    rng: StdRng,
}

impl Sampler {
    /// Validate `params` and seed from OS entropy.
    pub fn new(params: SamplingParams) -> SamplingResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            rng: StdRng::from_entropy(),
        })
    }

    /// Reseed for reproducible draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sample a token id from `logits`, penalizing tokens in `history`.
    ///
    /// `-inf` entries are allowed and never drawn. NaN, `+inf` or a row with
    /// no finite entry is rejected.
    pub fn sample(&mut self, logits: &[f32], history: &[TokenId]) -> SamplingResult<TokenId> {
        if logits.iter().any(|l| l.is_nan()) {
            return Err(SamplingError::InvalidLogits);
        }
        let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if !max_logit.is_finite() {
            return Err(SamplingError::InvalidLogits);
        }

        // Scaling relative to the maximum keeps every value finite and <= 0,
        // however small the temperature.
        let mut work_logits: Vec<f32> = logits
            .iter()
            .map(|&l| ((l - max_logit) / self.params.temperature).max(SCALED_FLOOR))
            .collect();
        apply_transforms(&mut work_logits, history, &self.params);

        let probs = softmax(&work_logits);
        let dist = WeightedIndex::new(&probs).map_err(|_| SamplingError::NoValidTokens)?;
        Ok(dist.sample(&mut self.rng) as TokenId)
    }
}
