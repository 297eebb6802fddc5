//! # riskit-runtime
//!
//! Upstream providers for RiskIT structured generation.
//!
//! ## Providers
//!
//! - **Gemini** (`AIza...` keys): `generateContent` with response schema and
//!   optional Google Search grounding
//! - **Groq** (`gsk_...` keys): OpenAI-compatible chat completions in
//!   JSON-object mode, no grounding
//!
//! ## Usage
//!
//! ```rust,ignore
//! use riskit_core::KeyResolver;
//! use riskit_runtime::{connect, RuntimeConfig};
//!
//! let provider = connect(&KeyResolver::from_env(), &RuntimeConfig::from_env());
//! let service = StructuredGenerationService::new(provider);
//! ```

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "groq")]
pub mod groq;
pub mod upstream;

use std::sync::Arc;

use async_trait::async_trait;
use riskit_core::{
    GenerationError, GenerationRequest, GenerationResult, KeyResolver, ProviderInfo, ProviderKind,
    Result, StructuredProvider,
};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiProvider};
#[cfg(feature = "groq")]
pub use groq::{GroqConfig, GroqProvider};

// Re-export core types for convenience
pub use riskit_core::{Credential, EngineStatus, GenerationOptions, GroundingSource, UseCase};

/// Default upstream deadline
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for every provider the runtime can build
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    #[cfg(feature = "groq")]
    pub groq: GroqConfig,

    #[cfg(feature = "gemini")]
    pub gemini: GeminiConfig,
}

impl RuntimeConfig {
    /// Read `GROQ_*`, `GEMINI_*` and `RISKIT_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("RISKIT_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            #[cfg(feature = "groq")]
            groq: GroqConfig {
                timeout_secs,
                ..GroqConfig::from_env()
            },
            #[cfg(feature = "gemini")]
            gemini: GeminiConfig {
                timeout_secs,
                ..GeminiConfig::from_env()
            },
        }
    }
}

/// Stand-in used when no usable credential is configured.
///
/// Every call fails with the configuration error; the process keeps running.
pub struct UnconfiguredProvider {
    kind: ProviderKind,
    reason: String,
}

impl UnconfiguredProvider {
    pub fn new(kind: ProviderKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[async_trait]
impl StructuredProvider for UnconfiguredProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Unconfigured".into(),
            kind: self.kind,
            model: String::new(),
            supports_grounding: false,
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        tracing::warn!(use_case = %request.use_case, "generation requested without a usable API key");
        Err(GenerationError::Config(self.reason.clone()))
    }
}

/// Resolve the credential once and build the matching provider
pub fn connect(resolver: &KeyResolver, config: &RuntimeConfig) -> Arc<dyn StructuredProvider> {
    let credential = resolver.resolve();
    let kind = riskit_core::credential::classify(&credential);

    let built: Result<Arc<dyn StructuredProvider>> = match kind {
        #[cfg(feature = "groq")]
        ProviderKind::Groq => GroqProvider::try_new(credential.clone(), config.groq.clone())
            .map(|p| Arc::new(p) as Arc<dyn StructuredProvider>),
        #[cfg(feature = "gemini")]
        ProviderKind::Gemini => GeminiProvider::try_new(credential.clone(), config.gemini.clone())
            .map(|p| Arc::new(p) as Arc<dyn StructuredProvider>),
        _ => credential
            .validate_for(kind)
            .and_then(|()| {
                Err(GenerationError::Config(format!(
                    "{kind} support is not compiled into this build"
                )))
            }),
    };

    match built {
        Ok(provider) => {
            let info = provider.info();
            tracing::info!(
                provider = %info.name,
                model = %info.model,
                key = %riskit_core::credential::hint(&credential),
                "structured generation provider ready"
            );
            provider
        }
        Err(e) => {
            tracing::warn!(provider = %kind, "no usable provider: {}", e);
            Arc::new(UnconfiguredProvider::new(kind, e.to_string()))
        }
    }
}
