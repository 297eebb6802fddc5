//! Error Types

use thiserror::Error;

/// Result type alias for generation operations
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Stable prefix the presentation layer matches on to offer "reconnect credential"
pub const AUTH_ERROR_PREFIX: &str = "API_KEY_INVALID";

/// Stable prefix for quota failures
pub const QUOTA_ERROR_PREFIX: &str = "QUOTA_EXHAUSTED";

/// Failures of the structured-generation pipeline
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Credential absent, too short or wrongly prefixed
    #[error("{0}")]
    Config(String),

    /// Upstream rejected the credential
    #[error("API_KEY_INVALID: {provider} rejected the API key ({message})")]
    Auth { provider: String, message: String },

    /// Upstream quota or rate limit hit
    #[error("QUOTA_EXHAUSTED: {provider} rate limit reached (429): {message}")]
    RateLimited { provider: String, message: String },

    /// Any other non-success upstream status (malformed schema, server error)
    #[error("{provider} error {status}: {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    /// DNS, connection or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider output could not be turned into JSON
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Check if error is retryable by the user
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Transport(_) | Self::Provider { status: 500..=599, .. }
        )
    }

    pub const fn is_quota_exhausted(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether the fix is to supply a different credential
    pub const fn is_credential_problem(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Auth { .. })
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => msg.clone(),
            Self::Auth { .. } => "The AI provider rejected the API key. Reconnect a valid key.".into(),
            Self::RateLimited { .. } => "The AI provider quota is exhausted. Wait a moment and retry.".into(),
            Self::Provider { provider, status, .. } => {
                format!("{provider} returned an error ({status}). Please try again.")
            }
            Self::Transport(_) => "Could not reach the AI provider. Check the network connection.".into(),
            Self::Parse(_) | Self::Json(_) => "The AI provider returned an unreadable response.".into(),
        }
    }
}

/// Why a raw provider response could not be normalized into JSON
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("response was empty")]
    Empty,

    #[error("no JSON object or array found in response")]
    NoStructure,

    #[error("JSON structure is truncated or unbalanced")]
    Unbalanced,

    #[error("malformed JSON: {0}")]
    Malformed(String),

    /// Valid JSON of the wrong shape
    #[error("unexpected JSON shape: {0}")]
    Shape(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_message_is_stable() {
        let err = GenerationError::Auth {
            provider: "Gemini".into(),
            message: "API key not valid".into(),
        };
        assert!(err.to_string().starts_with(AUTH_ERROR_PREFIX));
        assert!(err.is_credential_problem());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_quota_is_retryable() {
        let err = GenerationError::RateLimited {
            provider: "Groq".into(),
            message: "slow down".into(),
        };
        assert!(err.to_string().starts_with(QUOTA_ERROR_PREFIX));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_server_errors_retryable_client_errors_not() {
        let server = GenerationError::Provider {
            provider: "Groq".into(),
            status: 503,
            message: "overloaded".into(),
        };
        let client = GenerationError::Provider {
            provider: "Gemini".into(),
            status: 400,
            message: "bad schema".into(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
    }
}
