//! # gpt-runtime
//!
//! Everything needed to turn a model directory into a ready
//! [`LanguageModel`](gpt_engine::LanguageModel) + [`Tokenizer`](gpt_tokenizer::Tokenizer) pair:
//!
//! - [`loader`]: discovers model directories, reads `hparams.json` and the
//!   `checkpoint` index, picks a tokenizer
//! - [`ReferenceModel`]: GPT-2-shaped transformer on plain `f32` buffers
//! - [`ScriptedModel`]: deterministic stand-in whose output is known in advance

pub mod loader;
pub mod ops;
pub mod reference;
pub mod scripted;

pub use loader::{discover_models, latest_checkpoint, load_model, LoadedModel};
pub use reference::ReferenceModel;
pub use scripted::ScriptedModel;
