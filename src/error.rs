//! Error types for the banking prompt chain
//!
//! Every variant renders with an `Error:` prefix so a failure can be shown to
//! the customer as-is.

use thiserror::Error;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Error, Debug)]
pub enum ChainError {

    // =============================
    // Configuration
    // =============================

    #[error("Error: GEMINI_API_KEY not found in environment")]
    MissingApiKey,

    #[error("Error: invalid configuration: {0}")]
    Config(String),

    // =============================
    // Model Client
    // =============================

    #[error("Error: refusing to send an empty prompt")]
    EmptyPrompt,

    #[error("Error: request to model endpoint failed: {0}")]
    Transport(String),

    #[error("Error: model request timed out after {0}s")]
    Timeout(u64),

    #[error("Error: model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Error: unexpected response shape: {0}")]
    MalformedResponse(String),

    #[error("Error: model returned an empty reply")]
    EmptyReply,

    // =============================
    // External Library Conversions
    // =============================

    #[error("Error: serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Error: HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Error: IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_renders_error_prefix() {
        let errors = vec![
            ChainError::MissingApiKey,
            ChainError::Config("PORT=abc".to_string()),
            ChainError::EmptyPrompt,
            ChainError::Transport("connection refused".to_string()),
            ChainError::Timeout(15),
            ChainError::Status {
                status: 503,
                body: "unavailable".to_string(),
            },
            ChainError::MalformedResponse("no candidates".to_string()),
            ChainError::EmptyReply,
            ChainError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom")),
        ];

        for e in errors {
            assert!(e.to_string().starts_with("Error:"), "{}", e);
        }
    }

    #[test]
    fn test_serde_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ChainError = parse_err.into();
        assert!(err.to_string().starts_with("Error: serialization failed"));
    }
}
