//! OpenAI-compatible request/response types.

pub mod completions;
pub mod engines;

pub use completions::{Choice, CompletionRequest, CompletionResponse, FinishReason, TextInput};
pub use engines::{EngineInfo, EngineList};
