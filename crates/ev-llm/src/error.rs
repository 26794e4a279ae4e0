//! Inference error types.

use std::time::Duration;

use thiserror::Error;

use crate::retry::Transient;

/// Errors from a language-model call, from transport through schema checks.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The API returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The call did not finish within the request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The model answered with no content, or refused.
    #[error("empty model response: {0}")]
    EmptyResponse(String),

    /// The model's answer was not JSON.
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(String),

    /// The model's JSON did not match the requested schema.
    #[error("model output violates schema: {errors:?}")]
    SchemaViolation {
        /// Individual error messages from the validator.
        errors: Vec<String>,
    },

    /// The target schema could not be generated or compiled.
    #[error("schema generation error: {0}")]
    Schema(String),

    /// Client construction failed.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl Transient for InferenceError {
    fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}
