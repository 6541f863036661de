use thiserror::Error;

pub const COMMUNICATION_ERROR: &str = "Could not reach the server. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error("request rejected: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: Some(message.into()),
        }
    }

    /// Text shown to the user: the backend's own message when it sent one,
    /// a communication error for transport failures, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Rejected {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            ClientError::Transport(_) | ClientError::InvalidUrl(_) => {
                COMMUNICATION_ERROR.to_string()
            }
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_backend_text() {
        let err = ClientError::rejected("Insufficient quantity");
        assert_eq!(err.user_message("fallback"), "Insufficient quantity");
    }

    #[test]
    fn user_message_falls_back_without_backend_text() {
        assert_eq!(
            ClientError::Rejected { message: None }.user_message("fallback"),
            "fallback"
        );
        assert_eq!(
            ClientError::rejected("  ").user_message("fallback"),
            "fallback"
        );
        assert_eq!(ClientError::Status(502).user_message("fallback"), "fallback");
        assert_eq!(
            ClientError::Malformed("missing field".into()).user_message("fallback"),
            "fallback"
        );
    }
}
