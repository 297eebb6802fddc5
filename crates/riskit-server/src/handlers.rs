//! HTTP Handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use riskit_core::{EngineStatus, GenerationError, ProviderKind, UseCase};
use riskit_insights::{
    AnalyzeRequest, ArchitectRequest, AssetAnalysis, CompareRequest, ComparisonVerdict,
    ErrorCategory, InsightError, PortfolioPlan, PulseFeed, Slot, Tracked,
};
use serde::Serialize;

use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: ProviderKind,
    pub model: String,
    pub key_hint: String,
    pub configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Message suitable for the dashboard's error overlay
    pub error: String,
    pub code: &'static str,
    pub category: ErrorCategory,
    pub detail: String,
}

/// Map a failure to its status code and JSON body
pub fn error_response(error: &InsightError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match error {
        InsightError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        InsightError::Synthesis { .. } => (StatusCode::BAD_GATEWAY, "SYNTHESIS_FAILED"),
        InsightError::Generation(e) => match e {
            GenerationError::Auth { .. } => (StatusCode::UNAUTHORIZED, "API_KEY_INVALID"),
            GenerationError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXHAUSTED"),
            GenerationError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "ENGINE_NOT_CONFIGURED"),
            GenerationError::Transport(_) => (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR"),
            GenerationError::Provider { .. } | GenerationError::Parse(_) | GenerationError::Json(_) => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR")
            }
        },
    };

    (
        status,
        Json(ErrorResponse {
            error: error.user_message(),
            code,
            category: ErrorCategory::of(error),
            detail: error.to_string(),
        }),
    )
}

fn failed(use_case: UseCase, error: &InsightError) -> (StatusCode, Json<ErrorResponse>) {
    let response = error_response(error);
    if response.0.is_server_error() {
        tracing::error!(%use_case, "Use-case failed: {}", error);
    } else {
        tracing::warn!(%use_case, "Use-case rejected: {}", error);
    }
    response
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.kind,
        model: state.provider.model.clone(),
        key_hint: state.engine.key_hint.clone(),
        configured: state.engine.configured,
    })
}

/// Active engine and redacted key
pub async fn engine_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.engine.clone())
}

pub async fn architect(
    State(state): State<AppState>,
    Json(request): Json<ArchitectRequest>,
) -> ApiResult<Tracked<PortfolioPlan>> {
    state
        .dashboard
        .architect(&request)
        .await
        .map(Json)
        .map_err(|e| failed(UseCase::Architect, &e))
}

pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> ApiResult<Tracked<ComparisonVerdict>> {
    state
        .dashboard
        .compare(&request)
        .await
        .map(Json)
        .map_err(|e| failed(UseCase::Compare, &e))
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Tracked<AssetAnalysis>> {
    state
        .dashboard
        .analyze(&request)
        .await
        .map(Json)
        .map_err(|e| failed(UseCase::Analyze, &e))
}

pub async fn pulse(State(state): State<AppState>) -> ApiResult<Tracked<PulseFeed>> {
    state
        .dashboard
        .pulse()
        .await
        .map(Json)
        .map_err(|e| failed(UseCase::Pulse, &e))
}

/// Latest state and result for every use-case
pub async fn dashboard(State(state): State<AppState>) -> Json<BTreeMap<UseCase, Slot>> {
    Json(state.dashboard.snapshot().await)
}

pub async fn clear_slot(
    State(state): State<AppState>,
    Path(use_case): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let Some(use_case) = UseCase::parse(&use_case) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown use-case '{use_case}'"),
                code: "UNKNOWN_USE_CASE",
                category: ErrorCategory::Other,
                detail: "expected one of architect, compare, analyze, pulse".into(),
            }),
        ));
    };

    state.dashboard.clear(use_case).await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (InsightError::InvalidInput("ticker must not be empty".into()), StatusCode::BAD_REQUEST),
            (
                InsightError::Generation(GenerationError::Auth {
                    provider: "Gemini".into(),
                    message: "API key not valid".into(),
                }),
                StatusCode::UNAUTHORIZED,
            ),
            (
                InsightError::Generation(GenerationError::RateLimited {
                    provider: "Groq".into(),
                    message: "slow down".into(),
                }),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                InsightError::Generation(GenerationError::Config("API_KEY is not set".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (InsightError::synthesis(UseCase::Pulse, "no JSON"), StatusCode::BAD_GATEWAY),
            (
                InsightError::Generation(GenerationError::Transport("timed out".into())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error_response(&error).0, expected, "{error}");
        }
    }

    #[test]
    fn test_error_body_carries_category() {
        let error = InsightError::Generation(GenerationError::Auth {
            provider: "Gemini".into(),
            message: "API key not valid".into(),
        });
        let (_, Json(body)) = error_response(&error);
        assert_eq!(body.code, "API_KEY_INVALID");
        assert_eq!(body.category, ErrorCategory::Credential);
        assert!(body.detail.starts_with("API_KEY_INVALID"));
    }
}
