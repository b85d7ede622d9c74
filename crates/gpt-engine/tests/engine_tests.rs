//! Integration tests for gpt-engine core trait and types.
//!
//! Validates:
//! - LanguageModel can be implemented by mock backends and used as a trait object
//! - Forward passes compose with Past to cover the whole sequence
//! - Error types display correctly and carry context
//! - Core types satisfy required trait bounds (Send, Sync)

use gpt_engine::*;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Mock Backends
// ---------------------------------------------------------------------------

/// Backend whose logits favor `last_token + 1` and whose cache records the
/// raw token ids it has seen as one-element "keys".
struct CountingModel {
    hparams: Hyperparameters,
}

impl CountingModel {
    fn new() -> Self {
        Self {
            hparams: Hyperparameters {
                n_vocab: 8,
                n_ctx: 16,
                n_embd: 4,
                n_head: 1,
                n_layer: 1,
            },
        }
    }
}

impl LanguageModel for CountingModel {
    fn hparams(&self) -> &Hyperparameters {
        &self.hparams
    }

    fn forward(&self, tokens: &[TokenId], past: &Past) -> Result<Forward> {
        let Some(&last) = tokens.last() else {
            return Err(EngineError::Inference("empty input".to_string()));
        };
        let len = past.seq_len() + tokens.len();
        if len > self.hparams.n_ctx {
            return Err(EngineError::ContextOverflow {
                len,
                n_ctx: self.hparams.n_ctx,
            });
        }
        let mut logits = vec![0.0; self.hparams.n_vocab];
        logits[(last as usize + 1) % self.hparams.n_vocab] = 10.0;
        let present = LayerPast {
            keys: tokens.iter().map(|&t| t as f32).collect(),
            values: vec![0.0; tokens.len()],
        };
        Ok(Forward {
            logits,
            present: Past::from_layers(vec![present], tokens.len()),
        })
    }
}

/// Backend that fails every call.
struct FailingModel {
    hparams: Hyperparameters,
}

impl LanguageModel for FailingModel {
    fn hparams(&self) -> &Hyperparameters {
        &self.hparams
    }

    fn forward(&self, _tokens: &[TokenId], _past: &Past) -> Result<Forward> {
        Err(EngineError::Inference("out of memory".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Trait Implementation Tests
// ---------------------------------------------------------------------------

#[test]
fn forward_returns_vocab_sized_logits() {
    let model = CountingModel::new();
    let out = model.forward(&[1, 2, 3], &Past::new()).unwrap();
    assert_eq!(out.logits.len(), 8);
    assert_eq!(out.present.seq_len(), 3);
}

#[test]
fn forward_empty_input_errors() {
    let model = CountingModel::new();
    let err = model.forward(&[], &Past::new()).unwrap_err();
    assert!(matches!(err, EngineError::Inference(_)));
}

#[test]
fn forward_respects_context_window() {
    let model = CountingModel::new();
    let tokens: Vec<TokenId> = (0..17).map(|i| i % 8).collect();
    let err = model.forward(&tokens, &Past::new()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::ContextOverflow { len: 17, n_ctx: 16 }
    ));
}

#[test]
fn incremental_forward_accumulates_history() {
    let model = CountingModel::new();
    let mut past = Past::new();

    let first = model.forward(&[3, 4], &past).unwrap();
    past.extend(first.present).unwrap();
    let second = model.forward(&[5], &past).unwrap();
    past.extend(second.present).unwrap();

    assert_eq!(past.seq_len(), 3);
    assert_eq!(past.layer(0).unwrap().keys, vec![3.0, 4.0, 5.0]);
}

// ---------------------------------------------------------------------------
// Pluggable Backend Tests (Narrow Waist Pattern)
// ---------------------------------------------------------------------------

#[test]
fn trait_object_dispatch() {
    let model: Box<dyn LanguageModel> = Box::new(CountingModel::new());
    let out = model.forward(&[6], &Past::new()).unwrap();
    let best = out
        .logits
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(best, 7);
}

#[test]
fn backend_selection_at_runtime() {
    let backends: Vec<Arc<dyn LanguageModel>> = vec![
        Arc::new(CountingModel::new()),
        Arc::new(FailingModel {
            hparams: Hyperparameters::default(),
        }),
    ];
    assert!(backends[0].forward(&[0], &Past::new()).is_ok());
    assert!(backends[1].forward(&[0], &Past::new()).is_err());
    assert_eq!(backends[1].hparams().n_vocab, 50257);
}

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

#[test]
fn error_model_load_display() {
    let err = EngineError::ModelLoad("checkpoint missing".to_string());
    assert_eq!(err.to_string(), "Model loading failed: checkpoint missing");
}

#[test]
fn error_inference_display() {
    let err = EngineError::Inference("out of memory".to_string());
    assert!(err.to_string().contains("out of memory"));
}

#[test]
fn error_context_overflow_display() {
    let err = EngineError::ContextOverflow {
        len: 1030,
        n_ctx: 1024,
    };
    let msg = err.to_string();
    assert!(msg.contains("1030"));
    assert!(msg.contains("1024"));
}

#[test]
fn error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(EngineError::ModelLoad("bad".into()));
    assert!(err.to_string().contains("bad"));
}

// ---------------------------------------------------------------------------
// Thread Safety
// ---------------------------------------------------------------------------

#[test]
fn model_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CountingModel>();
    assert_send_sync::<Arc<dyn LanguageModel>>();
    assert_send_sync::<Past>();
}

#[test]
fn model_behind_arc_is_shared_across_threads() {
    let model: Arc<dyn LanguageModel> = Arc::new(CountingModel::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let model = Arc::clone(&model);
            std::thread::spawn(move || model.forward(&[i], &Past::new()).unwrap().logits)
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let logits = handle.join().unwrap();
        assert_eq!(logits[i + 1], 10.0);
    }
}
