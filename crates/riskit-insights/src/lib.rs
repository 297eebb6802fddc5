//! # riskit-insights
//!
//! The four dashboard use-cases built on top of `riskit-core`.
//!
//! ## Flow
//!
//! ```text
//! ┌───────────┐   ┌─────────────────────────────┐   ┌────────────────────┐
//! │ Dashboard │──▶│ StructuredGenerationService │──▶│ StructuredProvider │
//! │ (tickets, │   │  prompt + schema per tab    │   │  (Groq / Gemini)   │
//! │  slots)   │◀──│  normalize + typed parse    │◀──│                    │
//! └───────────┘   └─────────────────────────────┘   └────────────────────┘
//! ```
//!
//! | Use-case  | Result              | Requested shape                     |
//! |-----------|---------------------|-------------------------------------|
//! | architect | `PortfolioPlan`     | 10 holdings, 7-point trends         |
//! | compare   | `ComparisonVerdict` | winner, decision, scorecard         |
//! | analyze   | `AssetAnalysis`     | health, 6 metrics, 3 catalysts      |
//! | pulse     | `PulseFeed`         | 5 market events                     |
//!
//! Counts are requested in the prompt, not enforced on the response.

pub mod dashboard;
pub mod display;
pub mod error;
pub mod model;
pub mod prompts;
pub mod sequence;
pub mod service;

pub use dashboard::{Dashboard, RequestState, Slot, Tracked};
pub use display::{ErrorCategory, bar_split, health_percent, normalized_health, sparkline};
pub use error::{InsightError, Result};
pub use model::{
    AnalyzeRequest, ArchitectRequest, AssetAnalysis, CompareRequest, ComparisonVerdict,
    DomainResult, PortfolioNode, PortfolioPlan, PulseFeed, PulseItem, ScorecardMetric,
};
pub use sequence::{RequestSequencer, Ticket};
pub use service::StructuredGenerationService;
