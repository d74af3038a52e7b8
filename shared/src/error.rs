//! Error types for the meal log Lambda.

use thiserror::Error;

use crate::models::LineErrorDetail;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while handling a LINE webhook.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Webhook signature did not verify
    #[error("Invalid signature: {0}")]
    Signature(String),

    /// LINE Messaging API returned an error
    #[error("LINE Messaging API error ({status}): {message}")]
    Line {
        status: u16,
        message: String,
        details: Vec<LineErrorDetail>,
    },

    /// Google service account authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Google Sheets API error
    #[error("Sheets error: {0}")]
    Sheets(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport error
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
            Error::Signature(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_maps_to_bad_request() {
        assert_eq!(Error::Signature("missing".to_string()).status_code(), 400);
        assert_eq!(Error::Sheets("boom".to_string()).status_code(), 500);
    }

    #[test]
    fn test_line_error_display() {
        let err = Error::Line {
            status: 400,
            message: "Invalid reply token".to_string(),
            details: vec![],
        };
        assert_eq!(
            err.to_string(),
            "LINE Messaging API error (400): Invalid reply token"
        );
    }
}
