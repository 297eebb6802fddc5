//! Structured Generation Service
//!
//! Renders a use-case's prompt, hands it to the configured provider,
//! normalizes the raw text and parses it into the typed result. The
//! provider is injected, so the service never decides which backend runs.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use riskit_core::{
    GenerationRequest, GroundingSource, ProviderInfo, StructuredProvider, normalize_into,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{InsightError, Result};
use crate::model::{
    AnalyzeRequest, ArchitectRequest, AssetAnalysis, CompareRequest, ComparisonVerdict,
    PortfolioPlan, PulseFeed, PulsePayload,
};
use crate::prompts;

/// Parsed payload plus the citations that came with it
struct Synthesized<T> {
    payload: T,
    sources: Vec<GroundingSource>,
}

pub struct StructuredGenerationService {
    provider: Arc<dyn StructuredProvider>,
}

impl StructuredGenerationService {
    pub fn new(provider: Arc<dyn StructuredProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_info(&self) -> ProviderInfo {
        self.provider.info()
    }

    /// Build a ten-holding portfolio for the given capital and market
    pub async fn architect(&self, request: &ArchitectRequest) -> Result<PortfolioPlan> {
        request.validate()?;
        let Synthesized { payload, sources } =
            self.run::<PortfolioPlan>(prompts::architect(request)).await?;

        if payload.nodes.len() != prompts::PORTFOLIO_NODES {
            tracing::warn!(
                expected = prompts::PORTFOLIO_NODES,
                actual = payload.nodes.len(),
                "Portfolio node count differs from request"
            );
        }
        for node in payload.nodes.iter().filter(|n| n.trend.len() != prompts::TREND_POINTS) {
            tracing::warn!(ticker = %node.ticker, points = node.trend.len(), "Short trend series");
        }

        Ok(PortfolioPlan {
            sources,
            generated_at: Utc::now(),
            ..payload
        })
    }

    /// Head-to-head comparison of two symbols
    pub async fn compare(&self, request: &CompareRequest) -> Result<ComparisonVerdict> {
        request.validate()?;
        let Synthesized { payload, sources } =
            self.run::<ComparisonVerdict>(prompts::compare(request)).await?;

        if payload.scorecard.is_empty() {
            tracing::warn!(s1 = %request.s1, s2 = %request.s2, "Comparison returned an empty scorecard");
        }

        Ok(ComparisonVerdict {
            sources,
            generated_at: Utc::now(),
            ..payload
        })
    }

    /// Fundamentals, sentiment and catalysts for one ticker
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AssetAnalysis> {
        request.validate()?;
        let Synthesized { payload, sources } =
            self.run::<AssetAnalysis>(prompts::analyze(request)).await?;

        if payload.metrics.len() != prompts::ANALYSIS_METRICS
            || payload.catalysts.len() != prompts::ANALYSIS_CATALYSTS
            || payload.sentiment.len() != prompts::SENTIMENT_ENTRIES
        {
            tracing::warn!(
                ticker = %payload.ticker,
                metrics = payload.metrics.len(),
                catalysts = payload.catalysts.len(),
                sentiment = payload.sentiment.len(),
                "Analysis counts differ from request"
            );
        }

        Ok(AssetAnalysis {
            sources,
            generated_at: Utc::now(),
            ..payload
        })
    }

    /// Latest high-impact market events
    pub async fn pulse(&self) -> Result<PulseFeed> {
        let Synthesized { payload, sources } = self.run::<PulsePayload>(prompts::pulse()).await?;
        let items = payload.into_items();

        if items.len() != prompts::PULSE_ITEMS {
            tracing::warn!(expected = prompts::PULSE_ITEMS, actual = items.len(), "Pulse item count differs from request");
        }

        Ok(PulseFeed {
            items,
            sources,
            generated_at: Utc::now(),
        })
    }

    async fn run<T: DeserializeOwned>(&self, request: GenerationRequest) -> Result<Synthesized<T>> {
        let request_id = Uuid::new_v4();
        let use_case = request.use_case;
        let started = Instant::now();
        tracing::info!(%request_id, %use_case, provider = %self.provider.kind(), "Generation started");

        let result = self.provider.generate(&request).await.inspect_err(|e| {
            tracing::warn!(%request_id, %use_case, error = %e, "Provider call failed");
        })?;

        let payload = normalize_into::<T>(&result.raw_text).map_err(|e| {
            tracing::warn!(%request_id, %use_case, error = %e, "Could not parse provider output");
            InsightError::synthesis(use_case, e)
        })?;

        tracing::info!(
            %request_id,
            %use_case,
            sources = result.sources.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Generation complete"
        );

        Ok(Synthesized {
            payload,
            sources: result.sources,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use riskit_core::{GenerationError, GenerationResult, ProviderKind, UseCase};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays a canned response and records what it was asked
    pub(crate) struct StubProvider {
        reply: std::result::Result<GenerationResult, fn() -> GenerationError>,
        pub(crate) seen: Mutex<Vec<GenerationRequest>>,
    }

    impl StubProvider {
        pub(crate) fn replying(text: impl Into<String>) -> Self {
            Self::with_result(GenerationResult::text(text))
        }

        pub(crate) fn with_result(result: GenerationResult) -> Self {
            Self {
                reply: Ok(result),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(error: fn() -> GenerationError) -> Self {
            Self {
                reply: Err(error),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StructuredProvider for StubProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Gemini
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "Stub".into(),
                kind: ProviderKind::Gemini,
                model: "stub-model".into(),
                supports_grounding: true,
            }
        }

        async fn generate(&self, request: &GenerationRequest) -> riskit_core::Result<GenerationResult> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(result) => Ok(result.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn service(stub: StubProvider) -> (StructuredGenerationService, Arc<StubProvider>) {
        let stub = Arc::new(stub);
        (StructuredGenerationService::new(stub.clone()), stub)
    }

    fn portfolio_json() -> String {
        let nodes: Vec<_> = (0..10)
            .map(|i| json!({"ticker": format!("T{i}"), "name": format!("Node {i}"), "trend": [42, 58, 31, 89, 64, 95, 72]}))
            .collect();
        json!({"strategy": "Defensive growth tilted to energy", "nodes": nodes}).to_string()
    }

    #[tokio::test]
    async fn test_architect_scenario() {
        let reply = GenerationResult::text(format!("```json\n{}\n```", portfolio_json()))
            .with_sources(vec![GroundingSource::new("PSX", "https://psx.com.pk")]);
        let (service, stub) = service(StubProvider::with_result(reply));

        let request = ArchitectRequest {
            amount: dec!(50000),
            market: "Pakistan".into(),
            horizon: "Medium Term".into(),
            halal: true,
        };
        let plan = service.architect(&request).await.unwrap();

        assert_eq!(plan.strategy, "Defensive growth tilted to energy");
        assert_eq!(plan.nodes.len(), 10);
        assert_eq!(plan.nodes[0].trend.len(), 7);
        assert_eq!(plan.sources.len(), 1);

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].use_case, UseCase::Architect);
        assert!(seen[0].use_grounding);
    }

    #[tokio::test]
    async fn test_invalid_input_skips_provider() {
        let (service, stub) = service(StubProvider::replying("{}"));
        let request = ArchitectRequest {
            amount: dec!(-1),
            ..Default::default()
        };

        let err = service.architect(&request).await.unwrap_err();
        assert!(matches!(err, InsightError::InvalidInput(_)));
        assert!(stub.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_short_counts_are_tolerated() {
        let reply = json!({
            "strategy": "Concentrated",
            "nodes": [{"ticker": "NVDA", "name": "Nvidia", "trend": [1, 2]}]
        });
        let (service, _) = service(StubProvider::replying(reply.to_string()));
        let plan = service.architect(&ArchitectRequest::default()).await.unwrap();
        assert_eq!(plan.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_compare_with_citation_markers() {
        let reply = r#"Here is the verdict:
{"winner": "BTC", "decision": "Accumulate", "summary": "Deeper liquidity [1]",
 "scorecard": [{"label": "Liquidity", "s1Value": "High", "s2Value": 7, "s1Percent": 80, "s2Percent": 40}]}[2]"#;
        let (service, _) = service(StubProvider::replying(reply));

        let verdict = service.compare(&CompareRequest::new("BTC", "ETH")).await.unwrap();
        assert_eq!(verdict.winner, "BTC");
        assert_eq!(verdict.summary, "Deeper liquidity ");
        let (a, b) = verdict.scorecard[0].bar_widths();
        assert!((a - 200.0 / 3.0).abs() < 1e-9);
        assert!((b - 100.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_analyze_percentage_health() {
        let reply = json!({
            "ticker": "NVDA", "name": "Nvidia", "health": 82,
            "desc": "GPU leader", "short": "Momentum", "long": "AI capex",
            "metrics": [{"label": "Beta", "value": "1.7", "status": "negative"}],
            "sentiment": [{"label": "Bullish", "score": 70}, {"label": "Bearish", "score": 30}],
            "catalysts": [{"title": "Earnings", "impact": "high"}]
        });
        let (service, _) = service(StubProvider::replying(reply.to_string()));

        let analysis = service.analyze(&AnalyzeRequest::new("NVDA")).await.unwrap();
        assert_eq!(analysis.health_percent(), 82);
        assert_eq!(analysis.sentiment_score("bullish"), Some(70.0));
    }

    #[tokio::test]
    async fn test_pulse_accepts_bare_and_wrapped() {
        let (bare, _) = service(StubProvider::replying(r#"[{"title": "CPI beat", "sector": "Macro"}]"#));
        assert_eq!(bare.pulse().await.unwrap().items.len(), 1);

        let (wrapped, _) = service(StubProvider::replying(r#"{"items": [{"title": "A"}, {"title": "B"}]}"#));
        assert_eq!(wrapped.pulse().await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_output_is_synthesis_failure() {
        let (service, _) = service(StubProvider::replying("I cannot help with that."));
        let err = service.pulse().await.unwrap_err();
        match err {
            InsightError::Synthesis { use_case, .. } => assert_eq!(use_case, UseCase::Pulse),
            other => panic!("expected synthesis failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_shape_is_synthesis_failure() {
        let (service, _) = service(StubProvider::replying(r#"{"verdict": "BTC"}"#));
        let err = service.compare(&CompareRequest::new("BTC", "ETH")).await.unwrap_err();
        assert!(err.to_string().starts_with("SYNTHESIS_FAILED"));
    }

    #[tokio::test]
    async fn test_provider_errors_pass_through() {
        let (service, _) = service(StubProvider::failing(|| GenerationError::Auth {
            provider: "Gemini".into(),
            message: "API key not valid".into(),
        }));
        let err = service.pulse().await.unwrap_err();
        assert!(matches!(err, InsightError::Generation(GenerationError::Auth { .. })));
        assert!(err.to_string().starts_with("API_KEY_INVALID"));
    }
}
