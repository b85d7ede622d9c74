//! Model directory layout and loading.
//!
//! ```text
//! <models_dir>/
//!   <id>/
//!     hparams.json     required; fields missing here take GPT-2 117M defaults
//!     checkpoint       required; `model_checkpoint_path: "<name>"`
//!     tokenizer.json   optional; byte-level tokenizer otherwise
//! ```

use std::path::Path;
use std::sync::Arc;

use gpt_engine::{EngineError, Hyperparameters, LanguageModel, Result};
use gpt_tokenizer::{ByteTokenizer, HfTokenizer, Tokenizer};

use crate::ReferenceModel;

pub const HPARAMS_FILE: &str = "hparams.json";
pub const CHECKPOINT_FILE: &str = "checkpoint";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

const CHECKPOINT_KEY: &str = "model_checkpoint_path:";

/// A model ready to serve: weights, tokenizer and where they came from.
#[derive(Clone)]
pub struct LoadedModel {
    pub id: String,
    pub checkpoint: String,
    pub model: Arc<dyn LanguageModel>,
    pub tokenizer: Arc<dyn Tokenizer>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("id", &self.id)
            .field("checkpoint", &self.checkpoint)
            .field("hparams", self.model.hparams())
            .finish_non_exhaustive()
    }
}

/// Names of every sub-directory of `models_dir`, sorted.
pub fn discover_models(models_dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(models_dir)
        .map_err(|e| EngineError::ModelLoad(format!("{}: {e}", models_dir.display())))?;
    let mut ids: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    ids.sort();
    Ok(ids)
}

/// Name of the newest checkpoint recorded in `model_dir/checkpoint`.
pub fn latest_checkpoint(model_dir: &Path) -> Option<String> {
    let index = std::fs::read_to_string(model_dir.join(CHECKPOINT_FILE)).ok()?;
    index
        .lines()
        .find_map(|line| line.trim().strip_prefix(CHECKPOINT_KEY))
        .map(|value| value.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Load model `id` from `models_dir/<id>`.
pub fn load_model(models_dir: &Path, id: &str) -> Result<LoadedModel> {
    let dir = models_dir.join(id);
    let hparams = Hyperparameters::from_file(&dir.join(HPARAMS_FILE))?;
    let checkpoint = latest_checkpoint(&dir).ok_or_else(|| {
        EngineError::ModelLoad(format!(
            "couldn't load checkpoint for {id} from {}",
            dir.display()
        ))
    })?;

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    let tokenizer: Arc<dyn Tokenizer> = if tokenizer_path.is_file() {
        let tok = HfTokenizer::from_file(&tokenizer_path)
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?;
        Arc::new(tok)
    } else {
        Arc::new(ByteTokenizer::new())
    };
    if tokenizer.vocab_size() != hparams.n_vocab {
        return Err(EngineError::ModelLoad(format!(
            "{id}: tokenizer has {} tokens but n_vocab is {}",
            tokenizer.vocab_size(),
            hparams.n_vocab
        )));
    }

    let model = ReferenceModel::new(hparams.clone(), checkpoint_seed(&checkpoint))?;
    tracing::info!(
        model = id,
        checkpoint = %checkpoint,
        n_vocab = hparams.n_vocab,
        n_ctx = hparams.n_ctx,
        n_layer = hparams.n_layer,
        "loaded model"
    );

    Ok(LoadedModel {
        id: id.to_string(),
        checkpoint,
        model: Arc::new(model),
        tokenizer,
    })
}

/// FNV-1a over the checkpoint name.
fn checkpoint_seed(checkpoint: &str) -> u64 {
    checkpoint
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}
