//! Command-line and environment configuration.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Server configuration. Every option can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "gpt-server", version, about = "OpenAI-compatible completion server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(env = "PORT", default_value_t = 9000)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Directory holding one sub-directory per model.
    #[arg(long, env = "MODEL_PATH", default_value = "models")]
    pub model_path: PathBuf,

    /// Comma-separated model identifiers to load. Defaults to every
    /// sub-directory of the model path.
    #[arg(long, env = "MODELS", value_delimiter = ',')]
    pub models: Vec<String>,

    /// Ceiling for `max_tokens`; larger requests are clamped.
    #[arg(long, env = "MAX_TOKENS", default_value_t = Limits::DEFAULT_MAX_TOKENS)]
    pub max_tokens: usize,

    /// Ceiling for `n`; larger requests are clamped.
    #[arg(long, env = "MAX_N", default_value_t = Limits::DEFAULT_MAX_N)]
    pub max_n: usize,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_tokens: self.max_tokens,
            max_n: self.max_n,
        }
    }

    /// Explicitly requested model ids, blanks dropped.
    pub fn requested_models(&self) -> Vec<String> {
        self.models
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Per-request ceilings applied during parameter normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_tokens: usize,
    pub max_n: usize,
}

impl Limits {
    pub const DEFAULT_MAX_TOKENS: usize = 500;
    pub const DEFAULT_MAX_N: usize = 4;
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            max_n: Self::DEFAULT_MAX_N,
        }
    }
}
