//! Application State

use std::sync::Arc;

use riskit_core::{EngineStatus, KeyResolver, ProviderInfo};
use riskit_insights::{Dashboard, StructuredGenerationService};
use riskit_runtime::RuntimeConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Use-case runner and per-tab results
    pub dashboard: Arc<Dashboard>,

    /// Credential summary captured at startup
    pub engine: EngineStatus,

    /// Provider selected at startup (Groq, Gemini, or unconfigured)
    pub provider: ProviderInfo,
}

impl AppState {
    /// Resolve the credential once and wire the provider into the dashboard
    pub fn connect(resolver: &KeyResolver, config: &RuntimeConfig) -> Self {
        let provider = riskit_runtime::connect(resolver, config);
        let info = provider.info();
        let service = Arc::new(StructuredGenerationService::new(provider));

        Self {
            dashboard: Arc::new(Dashboard::new(service)),
            engine: resolver.status(),
            provider: info,
        }
    }
}
