//! Upstream Failure Classification
//!
//! Maps HTTP status codes and provider error envelopes onto the
//! `GenerationError` taxonomy so the dashboard can tell "reconnect the
//! key" apart from "wait for quota" and "try again".

use std::time::Duration;

use riskit_core::GenerationError;
use serde::Deserialize;

/// Longest upstream message carried into an error
const MAX_MESSAGE_LEN: usize = 500;

/// `{"error": {"message": ...}}` as returned by both Groq and Gemini
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Human-readable message from an upstream error body
pub fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    truncate(&message, MAX_MESSAGE_LEN)
}

/// True when a 400 body is really a credential rejection
fn mentions_bad_key(body: &str) -> bool {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let lower = body.to_ascii_lowercase();

    let code_says_key = envelope
        .as_ref()
        .and_then(|e| e.error.code.as_ref())
        .and_then(serde_json::Value::as_str)
        .is_some_and(|code| code.eq_ignore_ascii_case("invalid_api_key"));
    let status_says_key = envelope
        .as_ref()
        .and_then(|e| e.error.status.as_deref())
        .is_some_and(|status| status == "UNAUTHENTICATED" || status == "PERMISSION_DENIED");

    code_says_key
        || status_says_key
        || lower.contains("api key not valid")
        || lower.contains("api_key_invalid")
        || lower.contains("invalid api key")
        || lower.contains("missing api key")
}

/// Classify a non-success upstream response
pub fn classify_failure(provider: &str, status: u16, body: &str) -> GenerationError {
    let message = error_message(body);

    match status {
        401 | 403 => GenerationError::Auth {
            provider: provider.into(),
            message,
        },
        400 if mentions_bad_key(body) => GenerationError::Auth {
            provider: provider.into(),
            message,
        },
        429 => GenerationError::RateLimited {
            provider: provider.into(),
            message,
        },
        _ => GenerationError::Provider {
            provider: provider.into(),
            status,
            message,
        },
    }
}

/// Classify a reqwest failure (DNS, connect, timeout, body read)
pub fn transport_error(provider: &str, err: &reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Transport(format!("{provider} request timed out: {err}"))
    } else if err.is_connect() {
        GenerationError::Transport(format!("could not connect to {provider}: {err}"))
    } else {
        GenerationError::Transport(format!("{provider} request failed: {err}"))
    }
}

/// Build the shared HTTP client
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::Transport(format!("failed to create HTTP client: {e}")))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    format!("{cut}…")
}
