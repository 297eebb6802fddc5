//! Structured Generation Provider Strategy
//!
//! Defines a common interface for upstream LLM providers (Groq, Gemini)
//! that turn a prompt plus output schema into raw JSON-ish text and
//! optional grounding citations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use riskit_core::provider::{GenerationRequest, StructuredProvider, UseCase};
//!
//! let request = GenerationRequest::new(UseCase::Pulse, prompt, instruction, schema)
//!     .with_grounding(true);
//! let result = provider.generate(&request).await?;
//! let value = riskit_core::normalize(&result.raw_text)?;
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credential::ProviderKind;
use crate::error::Result;
use crate::schema::OutputSchema;

/// The four generation operations the dashboard offers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    /// Portfolio architecture
    Architect,
    /// Pairwise comparison
    Compare,
    /// Single-asset analysis
    Analyze,
    /// News pulse feed
    Pulse,
}

impl UseCase {
    pub const ALL: [Self; 4] = [Self::Architect, Self::Compare, Self::Analyze, Self::Pulse];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Architect => "architect",
            Self::Compare => "compare",
            Self::Analyze => "analyze",
            Self::Pulse => "pulse",
        }
    }

    /// Parse from a path segment
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|use_case| use_case.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully rendered generation request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub use_case: UseCase,

    /// User-turn prompt text
    pub prompt: String,

    /// System instruction for the model
    pub system_instruction: String,

    /// Shape the response must take
    pub schema: OutputSchema,

    /// Attach a web-search tool (ignored by providers without one)
    #[serde(default)]
    pub use_grounding: bool,
}

impl GenerationRequest {
    pub fn new(
        use_case: UseCase,
        prompt: impl Into<String>,
        system_instruction: impl Into<String>,
        schema: OutputSchema,
    ) -> Self {
        Self {
            use_case,
            prompt: prompt.into(),
            system_instruction: system_instruction.into(),
            schema,
            use_grounding: false,
        }
    }

    #[must_use]
    pub fn with_grounding(mut self, use_grounding: bool) -> Self {
        self.use_grounding = use_grounding;
        self
    }
}

/// A web citation attached by a grounded provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

impl GroundingSource {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// Raw provider output, before normalization
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Unprocessed text returned by the model
    pub raw_text: String,

    /// Citations in provider order, not deduplicated
    #[serde(default)]
    pub sources: Vec<GroundingSource>,

    /// Model that produced the text
    #[serde(default)]
    pub model: String,
}

impl GenerationResult {
    pub fn text(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Sampling configuration shared by providers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "llama-3.3-70b-versatile", "gemini-3-flash-preview")
    pub model: String,

    /// Low temperature favors deterministic structure
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

const fn default_temperature() -> f32 {
    0.1
}

impl GenerationOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
        }
    }
}

/// Provider metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Display name (e.g., "Groq", "Gemini")
    pub name: String,

    pub kind: ProviderKind,

    pub model: String,

    /// Whether web-grounding citations can be produced
    pub supports_grounding: bool,
}

/// Strategy trait for structured-generation providers
///
/// Implementations issue exactly one upstream call per `generate` and never
/// retry; callers decide whether to try again.
#[async_trait]
pub trait StructuredProvider: Send + Sync {
    /// Which provider this is
    fn kind(&self) -> ProviderKind;

    /// Provider information and capabilities
    fn info(&self) -> ProviderInfo;

    /// Send one structured-generation request
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_case_parse() {
        assert_eq!(UseCase::parse("Pulse"), Some(UseCase::Pulse));
        assert_eq!(UseCase::parse(" architect "), Some(UseCase::Architect));
        assert_eq!(UseCase::parse("pathfinder"), None);
    }

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new(
            UseCase::Compare,
            "Compare BTC vs ETH",
            "Output JSON.",
            OutputSchema::object([("winner", OutputSchema::string())]),
        );
        assert!(!request.use_grounding);
        assert!(request.with_grounding(true).use_grounding);
    }

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::new("llama-3.3-70b-versatile");
        assert!((opts.temperature - 0.1).abs() < f32::EPSILON);
    }
}
