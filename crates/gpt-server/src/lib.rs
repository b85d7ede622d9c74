//! # gpt-server
//!
//! OpenAI-compatible text completion API over locally loaded models.
//!
//! Routes:
//! - `GET /v1/engines`: loaded model identifiers
//! - `GET|POST /v1/engines/{engine_name}/completions`: sampled completions
//! - `GET /health`

pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod server;
pub mod state;

pub use completion::{stop_text, CompletionParams};
pub use config::{Limits, ServerConfig};
pub use engine::Engine;
pub use error::ServerError;
pub use registry::EngineRegistry;
pub use server::{create_router, run_server};
pub use state::AppState;
