//! Credential Resolution
//!
//! Reads the upstream API key from configuration, sanitizes it, and decides
//! which provider it belongs to. Classification is purely syntactic: a
//! correctly prefixed but revoked key is only discovered at call time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Prefix of Groq API keys
pub const GROQ_KEY_PREFIX: &str = "gsk_";

/// Prefix of Google AI Studio keys
pub const GEMINI_KEY_PREFIX: &str = "AIza";

/// Keys shorter than this are rejected before any network call
pub const MIN_KEY_LENGTH: usize = 20;

/// Displayed instead of a hint when no key is configured
pub const NOT_SET: &str = "NOT_SET";

/// Upstream provider selected by the credential
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    Gemini,
    None,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Gemini => "gemini",
            Self::None => "none",
        }
    }

    /// Key prefix expected by this provider
    pub const fn key_prefix(self) -> Option<&'static str> {
        match self {
            Self::Groq => Some(GROQ_KEY_PREFIX),
            Self::Gemini => Some(GEMINI_KEY_PREFIX),
            Self::None => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sanitized API key. Empty means "unset".
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Sanitize a raw configuration value
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let unquoted = strip_matching_quotes(trimmed).trim();

        // Build-time injection stringifies missing values
        if unquoted == "undefined" || unquoted == "null" {
            return Self::default();
        }

        Self(unquoted.to_string())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Check the key is plausible for `kind` before spending a request on it
    pub fn validate_for(&self, kind: ProviderKind) -> Result<()> {
        if self.is_empty() {
            return Err(GenerationError::Config(
                "API_KEY is not set. Set API_KEY (or VITE_API_KEY) and restart.".into(),
            ));
        }

        if self.len() < MIN_KEY_LENGTH {
            return Err(GenerationError::Config(format!(
                "INVALID_KEY: the provided API_KEY is too short ({} chars). Check your settings.",
                self.len()
            )));
        }

        match kind.key_prefix() {
            Some(prefix) if self.0.starts_with(prefix) => Ok(()),
            Some(prefix) => Err(GenerationError::Config(format!(
                "INVALID_KEY: key must start with '{prefix}'. Check your {kind} API key."
            ))),
            None => Err(GenerationError::Config(format!(
                "INVALID_KEY: key must start with '{GEMINI_KEY_PREFIX}' (Gemini) or '{GROQ_KEY_PREFIX}' (Groq)."
            ))),
        }
    }
}

// Never print the secret itself
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&hint(self)).finish()
    }
}

fn strip_matching_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Map a credential to its provider by prefix
pub fn classify(credential: &Credential) -> ProviderKind {
    let key = credential.as_str();
    if key.starts_with(GROQ_KEY_PREFIX) {
        ProviderKind::Groq
    } else if key.starts_with(GEMINI_KEY_PREFIX) {
        ProviderKind::Gemini
    } else {
        ProviderKind::None
    }
}

/// Keys shorter than this only show a prefix in their hint
const FULL_HINT_MIN_LENGTH: usize = 16;

/// Redacted display form: first and last four characters.
///
/// Shorter keys show at most a quarter of their characters, so head and
/// tail never overlap.
pub fn hint(credential: &Credential) -> String {
    if credential.is_empty() {
        return NOT_SET.into();
    }

    let chars: Vec<char> = credential.as_str().chars().collect();
    if chars.len() < FULL_HINT_MIN_LENGTH {
        let head: String = chars.iter().take(chars.len() / 4).collect();
        return format!("{head}...");
    }
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Source of the raw credential string
pub trait CredentialProvider: Send + Sync {
    /// Raw configuration value, if any
    fn raw(&self) -> Option<String>;
}

/// Reads `VITE_API_KEY`, falling back to `API_KEY`
pub struct EnvCredentialProvider {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl EnvCredentialProvider {
    /// Variables consulted, in priority order
    pub const VARIABLES: [&'static str; 2] = ["VITE_API_KEY", "API_KEY"];

    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Use a custom variable lookup (tests, embedded configs)
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn raw(&self) -> Option<String> {
        Self::VARIABLES
            .iter()
            .filter_map(|name| (self.lookup)(name))
            .find(|value| !value.trim().is_empty())
    }
}

/// A fixed key, for tests and explicit wiring
#[derive(Clone, Debug, Default)]
pub struct StaticCredentialProvider(Option<String>);

impl StaticCredentialProvider {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Some(key.into()))
    }

    pub const fn unset() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn raw(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolves and inspects the configured credential
#[derive(Clone)]
pub struct KeyResolver {
    source: Arc<dyn CredentialProvider>,
}

impl KeyResolver {
    pub fn new(source: Arc<dyn CredentialProvider>) -> Self {
        Self { source }
    }

    /// Resolver backed by process environment
    pub fn from_env() -> Self {
        Self::new(Arc::new(EnvCredentialProvider::new()))
    }

    /// Read and sanitize the credential; absent yields an empty credential
    pub fn resolve(&self) -> Credential {
        self.source
            .raw()
            .map(|raw| Credential::new(&raw))
            .unwrap_or_default()
    }

    pub fn classify(&self) -> ProviderKind {
        classify(&self.resolve())
    }

    pub fn hint(&self) -> String {
        hint(&self.resolve())
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus::of(&self.resolve())
    }
}

/// Summary of the active engine for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub provider: ProviderKind,
    pub key_hint: String,
    pub configured: bool,
}

impl EngineStatus {
    pub fn of(credential: &Credential) -> Self {
        let provider = classify(credential);
        Self {
            provider,
            key_hint: hint(credential),
            configured: credential.validate_for(provider).is_ok(),
        }
    }
}
