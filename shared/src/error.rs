//! Error types for the scrape-events function.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned to clients for every server-side failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Unable to fetch events. Please try again later.";

/// Errors that can occur while serving an events request.
#[derive(Error, Debug)]
pub enum Error {
    /// Request origin is not on the allow-list
    #[error("Origin not allowed")]
    ForbiddenOrigin,

    /// Client exceeded the request budget for the current window
    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Requested date is malformed or outside the accepted horizon
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Events API answered with a non-success status
    #[error("Upstream returned status {status}")]
    Upstream { status: u16 },

    /// Events API answered 2xx but the body carried GraphQL errors
    #[error("Upstream query failed")]
    Query,

    /// Rate-limit store error
    #[error("Rate limit store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidDate(_) => 400,
            Error::ForbiddenOrigin => 403,
            Error::RateLimited { .. } => 429,
            _ => 500,
        }
    }

    /// Message that is safe to show to the caller.
    ///
    /// Only the client-actionable variants get a specific message; all server-side
    /// failures collapse to [`GENERIC_FAILURE_MESSAGE`].
    pub fn public_message(&self) -> &'static str {
        match self {
            Error::ForbiddenOrigin => "Forbidden",
            Error::RateLimited { .. } => "Too many requests. Please try again later.",
            Error::InvalidDate(_) => {
                "Invalid date format. Use YYYY-MM-DD within one year of today."
            }
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(Error::ForbiddenOrigin.status_code(), 403);
        assert_eq!(Error::RateLimited { retry_after_secs: 60 }.status_code(), 429);
        assert_eq!(Error::InvalidDate("2024-13-01".into()).status_code(), 400);
    }

    #[test]
    fn test_server_errors_share_generic_message() {
        let errors = [
            Error::Upstream { status: 503 },
            Error::Query,
            Error::Store("connection refused".into()),
            Error::Config("missing token".into()),
        ];

        for error in errors {
            assert_eq!(error.status_code(), 500);
            assert_eq!(error.public_message(), GENERIC_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn test_invalid_date_message_hides_input() {
        let error = Error::InvalidDate("<script>".into());
        assert!(!error.public_message().contains("<script>"));
    }
}
