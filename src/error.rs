//! Errors returned by the chat completion client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing or unreadable configuration. Never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request could not be built.
    #[error("failed to build request: {0}")]
    Request(String),

    #[error("failed to send request to LLM API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("deadline exceeded before a reply was received")]
    DeadlineExceeded,
}

impl ChatError {
    /// Whether another attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChatError::Request(_) | ChatError::Transport(_) | ChatError::Parse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_not_retryable() {
        assert!(!ChatError::Config("api url required".to_string()).is_retryable());
        assert!(!ChatError::DeadlineExceeded.is_retryable());
    }

    #[test]
    fn test_parse_errors_are_retryable() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ChatError::from(err);
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("failed to parse response JSON"));
    }
}
