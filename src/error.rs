// src/error.rs

//! Unified error handling for the ingestion pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Source page or dependent service could not be reached
    #[error("Fetch error for {url}: {message}")]
    Fetch {
        url: String,
        message: String,
        transient: bool,
    },

    /// Expected page structure was absent
    #[error("Parse error for {context}: {message}")]
    Parse { context: String, message: String },

    /// Source answered with a 404-equivalent page
    #[error("Not found: {0}")]
    NotFound(String),

    /// Download, transcode or upload of an image failed
    #[error("Image error for {source_url}: {message}")]
    Image { source_url: String, message: String },

    /// Relational store rejected a query or insert
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Tracker API call failed
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// Blob store error
    #[error("Blob store error: {0}")]
    Blob(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Image decoding failed
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error from a failed HTTP status.
    pub fn fetch(url: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self::Fetch {
            url: url.into(),
            message: format!("HTTP {status}"),
            transient: status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an image error for a source URL.
    pub fn image(source_url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Image {
            source_url: source_url.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl fmt::Display) -> Self {
        Self::Persistence(message.to_string())
    }

    /// Create a tracker error.
    pub fn tracker(message: impl fmt::Display) -> Self {
        Self::Tracker(message.to_string())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { transient, .. } => *transient,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            _ => false,
        }
    }
}
