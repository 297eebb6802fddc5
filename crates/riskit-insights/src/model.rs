//! Domain Models
//!
//! Request parameters for the four dashboard tabs and the typed results the
//! providers' JSON is parsed into. Field names on the wire follow the
//! schemas sent upstream (`s1Percent`, `desc`, ...).

use std::fmt;

use chrono::{DateTime, Utc};
use riskit_core::{GroundingSource, UseCase};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::display;
use crate::error::{InsightError, Result};

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InsightError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

// ============================================================================
// Requests
// ============================================================================

/// Parameters for the portfolio architect
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectRequest {
    /// Capital to allocate, in USD
    pub amount: Decimal,

    /// Market segment or country (e.g., "S&P 500", "Pakistan")
    pub market: String,

    /// Investment horizon (e.g., "Medium Term")
    pub horizon: String,

    /// Exclude non-halal entities
    #[serde(default)]
    pub halal: bool,
}

impl Default for ArchitectRequest {
    fn default() -> Self {
        Self {
            amount: Decimal::from(50_000),
            market: "S&P 500".into(),
            horizon: "Medium Term".into(),
            halal: true,
        }
    }
}

impl ArchitectRequest {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(InsightError::InvalidInput(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        require("market", &self.market)?;
        require("horizon", &self.horizon)
    }
}

/// Parameters for a head-to-head comparison
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub s1: String,
    pub s2: String,

    #[serde(default = "default_market")]
    pub market: String,

    #[serde(default)]
    pub halal: bool,
}

impl CompareRequest {
    pub fn new(s1: impl Into<String>, s2: impl Into<String>) -> Self {
        Self {
            s1: s1.into(),
            s2: s2.into(),
            market: default_market(),
            halal: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("s1", &self.s1)?;
        require("s2", &self.s2)?;
        require("market", &self.market)
    }
}

/// Parameters for a single-asset audit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub ticker: String,

    #[serde(default = "default_market")]
    pub market: String,

    #[serde(default = "default_horizon")]
    pub horizon: String,

    #[serde(default)]
    pub halal: bool,
}

impl AnalyzeRequest {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            market: default_market(),
            horizon: default_horizon(),
            halal: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("ticker", &self.ticker)?;
        require("market", &self.market)
    }
}

fn default_market() -> String {
    "S&P 500".into()
}

fn default_horizon() -> String {
    "Medium Term".into()
}

// ============================================================================
// Results
// ============================================================================

/// One suggested holding with its seven-point trend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioNode {
    pub ticker: String,
    pub name: String,

    /// Relative trend series; integers are requested, floats tolerated
    #[serde(default)]
    pub trend: Vec<f64>,
}

/// Output of the portfolio architect
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPlan {
    pub strategy: String,
    pub nodes: Vec<PortfolioNode>,

    #[serde(default)]
    pub sources: Vec<GroundingSource>,

    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

/// A scorecard cell: providers return either text or a bare number
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl Default for MetricValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One dimension of a comparison
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardMetric {
    pub label: String,
    pub s1_value: MetricValue,
    pub s2_value: MetricValue,

    /// Relative dominance of the first symbol; not guaranteed to sum to 100 with `s2_percent`
    pub s1_percent: f64,
    pub s2_percent: f64,
}

impl ScorecardMetric {
    /// Bar widths normalized to the pair's own sum
    pub fn bar_widths(&self) -> (f64, f64) {
        display::bar_split(self.s1_percent, self.s2_percent)
    }
}

/// Output of the comparator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonVerdict {
    pub winner: String,
    pub decision: String,
    pub summary: String,
    pub scorecard: Vec<ScorecardMetric>,

    #[serde(default)]
    pub sources: Vec<GroundingSource>,

    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

/// Direction of a fundamental metric
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl<'de> Deserialize<'de> for MetricStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: MetricValue,
    #[serde(default)]
    pub status: MetricStatus,
}

/// A labeled sentiment score on a 0-100 scale
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

/// Expected impact of a catalyst
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for Impact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalyst {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub impact: Impact,
}

/// Output of the single-asset audit.
///
/// Sentiment is a list of labeled scores (bullish, bearish); the
/// `{bullish, bearish, summary}` object shape is not accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetAnalysis {
    pub ticker: String,
    pub name: String,

    /// Either a fraction in [0, 1] or a percentage; see `health_fraction`
    pub health: f64,

    pub desc: String,
    pub short: String,
    pub long: String,
    pub metrics: Vec<Metric>,
    pub sentiment: Vec<SentimentScore>,
    pub catalysts: Vec<Catalyst>,

    #[serde(default)]
    pub sources: Vec<GroundingSource>,

    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

impl AssetAnalysis {
    pub fn health_fraction(&self) -> f64 {
        display::normalized_health(self.health)
    }

    pub fn health_percent(&self) -> u8 {
        display::health_percent(self.health)
    }

    /// Score for a sentiment label, case-insensitive
    pub fn sentiment_score(&self, label: &str) -> Option<f64> {
        self.sentiment
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(label))
            .map(|s| s.score)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub sector: String,
}

/// Output of the news pulse
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PulseFeed {
    pub items: Vec<PulseItem>,

    #[serde(default)]
    pub sources: Vec<GroundingSource>,

    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

/// Pulse payload as providers return it: a bare array, or wrapped when the
/// provider can only emit objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PulsePayload {
    Bare(Vec<PulseItem>),
    Wrapped { items: Vec<PulseItem> },
}

impl PulsePayload {
    pub(crate) fn into_items(self) -> Vec<PulseItem> {
        match self {
            Self::Bare(items) | Self::Wrapped { items } => items,
        }
    }
}

/// Any use-case result, as held by the dashboard
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainResult {
    Portfolio(PortfolioPlan),
    Comparison(ComparisonVerdict),
    Analysis(AssetAnalysis),
    Pulse(PulseFeed),
}

impl DomainResult {
    pub const fn use_case(&self) -> UseCase {
        match self {
            Self::Portfolio(_) => UseCase::Architect,
            Self::Comparison(_) => UseCase::Compare,
            Self::Analysis(_) => UseCase::Analyze,
            Self::Pulse(_) => UseCase::Pulse,
        }
    }

    pub fn sources(&self) -> &[GroundingSource] {
        match self {
            Self::Portfolio(r) => &r.sources,
            Self::Comparison(r) => &r.sources,
            Self::Analysis(r) => &r.sources,
            Self::Pulse(r) => &r.sources,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Portfolio(r) => r.generated_at,
            Self::Comparison(r) => r.generated_at,
            Self::Analysis(r) => r.generated_at,
            Self::Pulse(r) => r.generated_at,
        }
    }
}

impl From<PortfolioPlan> for DomainResult {
    fn from(plan: PortfolioPlan) -> Self {
        Self::Portfolio(plan)
    }
}

impl From<ComparisonVerdict> for DomainResult {
    fn from(verdict: ComparisonVerdict) -> Self {
        Self::Comparison(verdict)
    }
}

impl From<AssetAnalysis> for DomainResult {
    fn from(analysis: AssetAnalysis) -> Self {
        Self::Analysis(analysis)
    }
}

impl From<PulseFeed> for DomainResult {
    fn from(feed: PulseFeed) -> Self {
        Self::Pulse(feed)
    }
}
