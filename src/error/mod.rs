//! Error types for voxcache.

use thiserror::Error;

/// Primary error type for all acquisition operations.
#[derive(Error, Debug)]
pub enum VoxError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Provider error ({provider}, status {status}): {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl VoxError {
    /// Create a provider error for a failed HTTP exchange.
    pub fn provider(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// HTTP status attached to a provider failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether calling `acquire` again later may succeed.
    ///
    /// Nothing in this crate retries on its own; this only classifies the
    /// failure for the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Provider { status, .. } => matches!(status, 200 | 408 | 429 | 500..=599),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for VoxError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(format!("invalid config file: {err}"))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, VoxError>;
