//! Error type shared by every provider and the aggregator.

/// Failures surfaced by scrapers, lookup services and the meta-provider
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("Provider {provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: String,
        operation: &'static str,
    },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl MetaError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        MetaError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetaError>;
