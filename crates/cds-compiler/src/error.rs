//! Error types for the CDS compiler.
//!
//! This module provides a unified error type [`CdsError`] that encompasses
//! all errors a compile request can surface. Every variant is fatal to the
//! request: no partial connector document is ever returned alongside an error.

use thiserror::Error;

/// A specialized Result type for CDS compiler operations.
pub type CdsResult<T> = Result<T, CdsError>;

/// The main error type for the CDS compiler.
#[derive(Error, Debug)]
pub enum CdsError {
    /// The ABI is not a JSON array of entries
    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),

    /// A connector with the derived key already exists
    #[error("Connector name already used: {key}")]
    DuplicateKey {
        /// The key that collided
        key: String,
    },

    /// The structured-completion capability failed on a batch
    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    /// The icon URL could not be converted to a data URI
    #[error("Icon resolution failed: {0}")]
    IconResolution(String),

    /// A required request parameter was missing
    #[error("{0} is required")]
    MissingParameter(String),

    /// A contract address is not a 20-byte hex string
    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),

    /// The chain has no configured ABI explorer
    #[error("Chain is not supported: {0}")]
    UnsupportedChain(String),

    /// Error occurred during HTTP communication
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error occurred during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error occurred during URL parsing
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// An explorer API returned an error response
    #[error("API error ({status_code}): {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Rate limited by an explorer API
    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// How long to wait before retrying (if provided)
        retry_after_secs: Option<u64>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Maximum length for error messages to prevent excessive memory usage in logs.
const MAX_ERROR_MESSAGE_LENGTH: usize = 1000;

/// Patterns that might indicate sensitive information in error messages.
const SENSITIVE_PATTERNS: &[&str] = &["apikey", "api_key", "secret", "bearer", "authorization"];

impl CdsError {
    /// Creates a new invalid ABI error
    pub fn invalid_abi<S: Into<String>>(msg: S) -> Self {
        Self::InvalidAbi(msg.into())
    }

    /// Creates a new duplicate key error
    pub fn duplicate_key<S: Into<String>>(key: S) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// Creates a new enrichment error
    pub fn enrichment<S: Into<String>>(msg: S) -> Self {
        Self::Enrichment(msg.into())
    }

    /// Creates a new icon resolution error
    pub fn icon<S: Into<String>>(msg: S) -> Self {
        Self::IconResolution(msg.into())
    }

    /// Creates a new API error from response details
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Returns true if this is a transient error that might succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status_code, .. } => {
                matches!(status_code, 429 | 500 | 502 | 503 | 504)
            }
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Returns a sanitized version of the error message safe for logging.
    ///
    /// Control characters are removed, long messages are truncated, and
    /// messages that look like they carry credentials are redacted.
    pub fn sanitized_message(&self) -> String {
        Self::sanitize_string(&self.to_string())
    }

    fn sanitize_string(s: &str) -> String {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();

        let lower = cleaned.to_lowercase();
        for pattern in SENSITIVE_PATTERNS {
            if lower.contains(pattern) {
                return format!("[REDACTED: message contained sensitive pattern '{pattern}']");
            }
        }

        if cleaned.len() > MAX_ERROR_MESSAGE_LENGTH {
            let mut end = MAX_ERROR_MESSAGE_LENGTH;
            while !cleaned.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... [truncated, total length: {}]",
                &cleaned[..end],
                cleaned.len()
            )
        } else {
            cleaned
        }
    }

    /// Returns the error message suitable for display to end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidAbi(_) => "Invalid ABI",
            Self::DuplicateKey { .. } => "Connector name already used",
            Self::Enrichment(_) => "Failed to generate connector descriptions",
            Self::IconResolution(_) => "Failed to load connector icon",
            Self::MissingParameter(_) => "Bad request",
            Self::InvalidAddress(_) => "Invalid contract address",
            Self::UnsupportedChain(_) => "Chain is not supported",
            Self::Http(_) => "Network error occurred",
            Self::Json(_) => "Failed to process response",
            Self::Url(_) => "Invalid URL",
            Self::RateLimited { .. }
            | Self::Api {
                status_code: 429, ..
            } => "Rate limit exceeded",
            Self::Api { status_code, .. } if *status_code >= 500 => "Server error",
            Self::Api { .. } => "API error",
            Self::Config(_) => "Configuration error",
            Self::Internal(_) => "Internal error",
            Self::Other(_) => "An error occurred",
        }
    }
}
