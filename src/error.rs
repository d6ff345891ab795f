// Error taxonomy for the API layer. Every failure coming out of
// `ApiClient` is exactly one of these variants; the command layer wraps
// them with `anyhow` context and decides how to present them.

use thiserror::Error;

/// Classified failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API key is stored locally.
    #[error("No API key found. Please authenticate first.")]
    Authentication,

    /// HTTP 401.
    #[error("Invalid API key. Please check your credentials.")]
    Unauthorized,

    /// HTTP 403.
    #[error("Access forbidden. Check your API key permissions.")]
    Forbidden,

    /// HTTP 404.
    #[error("Resource not found.")]
    NotFound,

    /// HTTP 429.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Any other non-2xx status. `message` comes from the response body
    /// when it has one.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The request never reached the server (DNS, refused, timeout).
    #[error("Network error. Please check your connection.")]
    Network(#[source] reqwest::Error),

    /// Anything else that went wrong locally.
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    /// Short label used in debug logs.
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::Authentication => "authentication",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::NotFound => "not_found",
            ApiError::RateLimited => "rate_limited",
            ApiError::Upstream { .. } => "upstream",
            ApiError::Network(_) => "network",
            ApiError::Unknown(_) => "unknown",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
