//! HTTP error handling and response mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gpt_engine::EngineError;
use gpt_sampling::{GenerateError, SamplingError};
use gpt_tokenizer::TokenizerError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("invalid sampling parameters: {0}")]
    Sampling(#[from] SamplingError),

    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no engines loaded; place a model directory under MODEL_PATH or name one in MODELS")]
    NoEngines,

    #[error("generation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("engine unavailable")]
    Unavailable,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Sampling(_)
            | ServerError::Tokenizer(TokenizerError::EncodingError(_))
            | ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Engine(_)
            | ServerError::Tokenizer(_)
            | ServerError::Generation(_)
            | ServerError::NoEngines
            | ServerError::Join(_)
            | ServerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = if status.is_client_error() {
            "invalid_request_error"
        } else {
            tracing::error!(error = %self, "request failed");
            "server_error"
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
                "param": null,
                "code": null,
            }
        }));

        (status, body).into_response()
    }
}
