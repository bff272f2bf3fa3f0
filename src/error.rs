//! Error type shared by the daily run and the import run.
//!
//! Variants group into four families:
//! - configuration: [`PostError::Config`], [`PostError::Yaml`]
//! - network: [`PostError::Network`], [`PostError::Api`]
//! - format: [`PostError::Format`], [`PostError::Json`], [`PostError::Xml`]
//! - filesystem: [`PostError::Io`]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostError {
    /// Missing secret or invalid settings. Fatal before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("settings file is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The text-generation service answered with a non-success status.
    #[error("API error: {status} {body}")]
    Api { status: u16, body: String },

    #[error("format error: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PostError {
    /// True for failures that happened on the wire rather than in our own parsing.
    pub fn is_network(&self) -> bool {
        matches!(self, PostError::Network(_) | PostError::Api { .. })
    }
}

pub type PostResult<T> = Result<T, PostError>;
