//! GPT-2-shaped reference transformer.
//!
//! token + position embedding → n_layer × (ln → causal MHA → residual → ln →
//! GELU MLP → residual) → ln_f → tied projection onto the embedding matrix.
//!
//! Weights are drawn from a seeded RNG, so a given `(hparams, seed)` always
//! yields the same model.

use gpt_engine::{
    EngineError, Forward, Hyperparameters, LanguageModel, LayerPast, Past, Result, TokenId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ops::{attention, gelu, layer_norm, linear};

const LN_EPS: f32 = 1e-5;
const INIT_SCALE: f32 = 0.1;

struct LayerNorm {
    weight: Vec<f32>,
    bias: Vec<f32>,
}

impl LayerNorm {
    fn new(d: usize) -> Self {
        Self {
            weight: vec![1.0; d],
            bias: vec![0.0; d],
        }
    }

    fn apply(&self, x: &[f32]) -> Vec<f32> {
        layer_norm(x, &self.weight, &self.bias, LN_EPS)
    }
}

struct Block {
    ln_1: LayerNorm,
    /// `[d, 3d]`: query, key and value projections side by side.
    c_attn: Vec<f32>,
    c_attn_b: Vec<f32>,
    c_proj: Vec<f32>,
    c_proj_b: Vec<f32>,
    ln_2: LayerNorm,
    c_fc: Vec<f32>,
    c_fc_b: Vec<f32>,
    mlp_proj: Vec<f32>,
    mlp_proj_b: Vec<f32>,
}

/// In-process transformer implementing [`LanguageModel`].
pub struct ReferenceModel {
    hparams: Hyperparameters,
    /// `[n_vocab, d]`, also the output projection.
    wte: Vec<f32>,
    /// `[n_ctx, d]`
    wpe: Vec<f32>,
    blocks: Vec<Block>,
    ln_f: LayerNorm,
}

impl std::fmt::Debug for ReferenceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceModel")
            .field("hparams", &self.hparams)
            .finish_non_exhaustive()
    }
}

impl ReferenceModel {
    /// Build a model with weights derived from `seed`.
    pub fn new(hparams: Hyperparameters, seed: u64) -> Result<Self> {
        hparams.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut fill = |n: usize| -> Vec<f32> {
            (0..n)
                .map(|_| rng.gen_range(-INIT_SCALE..INIT_SCALE))
                .collect()
        };
        let d = hparams.n_embd;

        let wte = fill(hparams.n_vocab * d);
        let wpe = fill(hparams.n_ctx * d);
        let blocks = (0..hparams.n_layer)
            .map(|_| Block {
                ln_1: LayerNorm::new(d),
                c_attn: fill(d * 3 * d),
                c_attn_b: vec![0.0; 3 * d],
                c_proj: fill(d * d),
                c_proj_b: vec![0.0; d],
                ln_2: LayerNorm::new(d),
                c_fc: fill(d * 4 * d),
                c_fc_b: vec![0.0; 4 * d],
                mlp_proj: fill(4 * d * d),
                mlp_proj_b: vec![0.0; d],
            })
            .collect();

        Ok(Self {
            ln_f: LayerNorm::new(d),
            hparams,
            wte,
            wpe,
            blocks,
        })
    }

    fn embed(&self, token: TokenId, position: usize) -> Vec<f32> {
        let d = self.hparams.n_embd;
        let t = token as usize * d;
        let p = position * d;
        self.wte[t..t + d]
            .iter()
            .zip(&self.wpe[p..p + d])
            .map(|(a, b)| a + b)
            .collect()
    }

    fn logits(&self, hidden: &[f32]) -> Vec<f32> {
        let d = self.hparams.n_embd;
        let h = self.ln_f.apply(hidden);
        self.wte
            .chunks_exact(d)
            .map(|row| row.iter().zip(&h).map(|(w, x)| w * x).sum())
            .collect()
    }
}

impl LanguageModel for ReferenceModel {
    fn hparams(&self) -> &Hyperparameters {
        &self.hparams
    }

    fn forward(&self, tokens: &[TokenId], past: &Past) -> Result<Forward> {
        let hp = &self.hparams;
        let d = hp.n_embd;
        let offset = past.seq_len();

        if tokens.is_empty() {
            return Err(EngineError::Inference("forward called with no tokens".into()));
        }
        let len = offset + tokens.len();
        if len > hp.n_ctx {
            return Err(EngineError::ContextOverflow { len, n_ctx: hp.n_ctx });
        }
        if let Some(&bad) = tokens.iter().find(|&&t| t as usize >= hp.n_vocab) {
            return Err(EngineError::Inference(format!(
                "token {bad} outside vocabulary of {}",
                hp.n_vocab
            )));
        }

        let mut hidden: Vec<Vec<f32>> = tokens
            .iter()
            .enumerate()
            .map(|(i, &t)| self.embed(t, offset + i))
            .collect();
        let mut present = Vec::with_capacity(self.blocks.len());

        for (layer_idx, block) in self.blocks.iter().enumerate() {
            let mut keys = Vec::with_capacity(len * d);
            let mut values = Vec::with_capacity(len * d);
            if offset > 0 {
                let cached = past
                    .layer(layer_idx)
                    .filter(|l| l.keys.len() == offset * d && l.values.len() == offset * d)
                    .ok_or_else(|| {
                        EngineError::Inference(format!(
                            "cache for layer {layer_idx} does not cover {offset} positions"
                        ))
                    })?;
                keys.extend_from_slice(&cached.keys);
                values.extend_from_slice(&cached.values);
            }

            for x in hidden.iter_mut() {
                let qkv = linear(&block.ln_1.apply(x), &block.c_attn, &block.c_attn_b, 3 * d);
                keys.extend_from_slice(&qkv[d..2 * d]);
                values.extend_from_slice(&qkv[2 * d..]);

                // Causal: this position sees everything cached so far, itself included.
                let attn = attention(&qkv[..d], &keys, &values, hp.n_head, hp.head_dim());
                let proj = linear(&attn, &block.c_proj, &block.c_proj_b, d);
                x.iter_mut().zip(&proj).for_each(|(h, p)| *h += p);

                let fc = linear(&block.ln_2.apply(x), &block.c_fc, &block.c_fc_b, 4 * d);
                let act: Vec<f32> = fc.into_iter().map(gelu).collect();
                let mlp = linear(&act, &block.mlp_proj, &block.mlp_proj_b, d);
                x.iter_mut().zip(&mlp).for_each(|(h, m)| *h += m);
            }

            present.push(LayerPast {
                keys: keys.split_off(offset * d),
                values: values.split_off(offset * d),
            });
        }

        let last = hidden.last().map(|h| self.logits(h)).unwrap_or_default();
        Ok(Forward {
            logits: last,
            present: Past::from_layers(present, tokens.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Hyperparameters {
        Hyperparameters {
            n_vocab: 16,
            n_ctx: 12,
            n_embd: 8,
            n_head: 2,
            n_layer: 2,
        }
    }

    #[test]
    fn same_seed_same_logits() {
        let a = ReferenceModel::new(tiny(), 7).unwrap();
        let b = ReferenceModel::new(tiny(), 7).unwrap();
        let la = a.forward(&[1, 2, 3], &Past::new()).unwrap().logits;
        let lb = b.forward(&[1, 2, 3], &Past::new()).unwrap().logits;
        assert_eq!(la, lb);
        assert_eq!(la.len(), 16);
        assert!(la.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn different_seeds_differ() {
        let a = ReferenceModel::new(tiny(), 1).unwrap();
        let b = ReferenceModel::new(tiny(), 2).unwrap();
        assert_ne!(
            a.forward(&[1], &Past::new()).unwrap().logits,
            b.forward(&[1], &Past::new()).unwrap().logits
        );
    }

    #[test]
    fn present_covers_input_only() {
        let model = ReferenceModel::new(tiny(), 0).unwrap();
        let first = model.forward(&[4, 5, 6], &Past::new()).unwrap();
        assert_eq!(first.present.seq_len(), 3);
        assert_eq!(first.present.layers().len(), 2);
        assert_eq!(first.present.layer(0).unwrap().keys.len(), 3 * 8);

        let mut past = Past::new();
        past.extend(first.present).unwrap();
        let second = model.forward(&[7], &past).unwrap();
        assert_eq!(second.present.seq_len(), 1);
        assert_eq!(second.present.layer(1).unwrap().values.len(), 8);
    }

    #[test]
    fn rejects_out_of_vocab_and_overflow() {
        let model = ReferenceModel::new(tiny(), 0).unwrap();
        assert!(matches!(
            model.forward(&[16], &Past::new()),
            Err(EngineError::Inference(_))
        ));
        let long: Vec<TokenId> = (0..13).map(|i| i % 16).collect();
        assert!(matches!(
            model.forward(&long, &Past::new()),
            Err(EngineError::ContextOverflow { len: 13, n_ctx: 12 })
        ));
        assert!(model.forward(&[], &Past::new()).is_err());
    }

    #[test]
    fn rejects_mismatched_cache() {
        let model = ReferenceModel::new(tiny(), 0).unwrap();
        let bogus = Past::from_layers(Vec::new(), 2);
        assert!(matches!(
            model.forward(&[1], &bogus),
            Err(EngineError::Inference(_))
        ));
    }
}
