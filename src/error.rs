//! Error types for the studio.

use std::time::Duration;

/// Errors that can occur while validating, prompting or generating.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// No active session, or the session is not on the allow-list.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// API key missing or rejected by the remote service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An uploaded file had no content.
    #[error("{slot} is empty")]
    EmptyUpload {
        /// Human-readable name of the upload slot (e.g. "image 2").
        slot: String,
    },

    /// An uploaded file exceeded the size ceiling.
    #[error("{slot} is too large ({size} bytes, limit {limit} bytes)")]
    UploadTooLarge {
        /// Human-readable name of the upload slot.
        slot: String,
        /// Actual size in bytes.
        size: usize,
        /// Allowed size in bytes.
        limit: usize,
    },

    /// An uploaded file is not a JPEG, PNG or WebP image.
    #[error("{slot} has an unsupported image type; use JPEG, PNG or WebP")]
    UnsupportedImageType {
        /// Human-readable name of the upload slot.
        slot: String,
    },

    /// More images were supplied than the mode accepts.
    #[error("too many images: {count} supplied, at most {max} allowed")]
    TooManyImages {
        /// Number of images supplied.
        count: usize,
        /// Maximum accepted by the mode.
        max: usize,
    },

    /// A progress phase sequence cannot drive an estimator.
    #[error("invalid phase sequence: {0}")]
    InvalidPhaseSequence(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if any.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The model answered without an image.
    #[error("no image returned: {0}")]
    NoImageReturned(String),

    /// Response did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StudioError {
    /// Returns the HTTP status an API route would answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::InvalidRequest(_)
            | Self::EmptyUpload { .. }
            | Self::TooManyImages { .. } => 400,
            Self::UploadTooLarge { .. } => 413,
            Self::UnsupportedImageType { .. } => 415,
            Self::RateLimited { .. } => 429,
            Self::NoImageReturned(_) => 502,
            _ => 500,
        }
    }

    /// Returns true if the error was caused by the caller's input rather than
    /// the remote service or the environment.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code()) && !matches!(self, Self::RateLimited { .. })
    }
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;

/// Truncates and strips control characters from an upstream error body so it
/// is safe to surface to users and logs.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    const MAX_LEN: usize = 500;

    let cleaned: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let trimmed = cleaned.trim();

    if trimmed.chars().count() > MAX_LEN {
        let truncated: String = trimmed.chars().take(MAX_LEN).collect();
        format!("{truncated}...")
    } else {
        trimmed.to_string()
    }
}

/// Reads a `Retry-After` header expressed in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
