//! Completion request/response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A string or a list of strings (`prompt`, `stop`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    One(String),
    Many(Vec<String>),
}

impl TextInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            TextInput::One(s) => vec![s],
            TextInput::Many(v) => v,
        }
    }
}

/// Completion request. Every field is optional; unknown fields are collected
/// in `extra` and ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionRequest {
    pub prompt: Option<TextInput>,
    pub n: Option<i64>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<i64>,
    pub echo: Option<bool>,
    pub frequency_penalty: Option<f32>,
    pub stop: Option<TextInput>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    /// The token budget ran out.
    Length,
    /// A stop sequence truncated the text.
    Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub index: usize,
    pub logprobs: Option<Value>,
    pub text: String,
    #[serde(rename = "finish-reason")]
    pub finish_reason: FinishReason,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
}
