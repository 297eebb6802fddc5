//! RiskIT HTTP Server
//!
//! Axum-based server exposing the four insight use-cases, the engine
//! status and the dashboard's per-tab state.

mod handlers;
mod state;

use axum::{
    Router,
    routing::{delete, get, post},
};
use riskit_core::KeyResolver;
use riskit_runtime::RuntimeConfig;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::handlers::{
    analyze, architect, clear_slot, compare, dashboard, engine_status, health_check, pulse,
};
use crate::state::AppState;

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & engine
        .route("/health", get(health_check))
        .route("/api/engine", get(engine_status))

        // Use-cases
        .route("/api/architect", post(architect))
        .route("/api/compare", post(compare))
        .route("/api/analyze", post(analyze))
        .route("/api/pulse", get(pulse))

        // Dashboard state
        .route("/api/dashboard", get(dashboard))
        .route("/api/dashboard/{use_case}", delete(clear_slot))

        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before anything reads it
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let resolver = KeyResolver::from_env();
    let state = AppState::connect(&resolver, &RuntimeConfig::from_env());

    if state.engine.configured {
        tracing::info!(
            provider = %state.provider.name,
            model = %state.provider.model,
            key = %state.engine.key_hint,
            "✓ Engine ready"
        );
    } else {
        tracing::warn!("⚠ No usable API key - every generation request will fail");
        tracing::warn!("  Set VITE_API_KEY or API_KEY (gsk_... for Groq, AIza... for Gemini)");
    }

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 riskit server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                    - Health check");
    tracing::info!("  GET    /api/engine                - Active engine and key hint");
    tracing::info!("  POST   /api/architect             - Build a portfolio");
    tracing::info!("  POST   /api/compare               - Compare two symbols");
    tracing::info!("  POST   /api/analyze               - Audit one ticker");
    tracing::info!("  GET    /api/pulse                 - Market news pulse");
    tracing::info!("  GET    /api/dashboard             - Latest state per use-case");
    tracing::info!("  DELETE /api/dashboard/{{use_case}}  - Clear a tab");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
