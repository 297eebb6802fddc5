//! Gemini Provider
//!
//! Implementation of `StructuredProvider` over the Gemini `generateContent`
//! endpoint. The schema is passed as `responseSchema`, and a Google Search
//! tool is attached when grounding is requested; its citations come back in
//! `groundingMetadata`.

use std::time::Duration;

use async_trait::async_trait;
use riskit_core::{
    Credential, GenerationError, GenerationOptions, GenerationRequest, GenerationResult,
    GroundingSource, ProviderInfo, ProviderKind, Result, StructuredProvider,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::upstream;

const PROVIDER_NAME: &str = "Gemini";

/// Title used when a grounding chunk has none
const UNTITLED_SOURCE: &str = "Source";

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub base_url: String,

    pub options: GenerationOptions,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            options: GenerationOptions::new("gemini-3-flash-preview"),
            timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.options.model = model;
        }
        config
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.options.model
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

/// Gemini structured-generation provider
pub struct GeminiProvider {
    client: reqwest::Client,
    credential: Credential,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a provider, rejecting implausible keys up front
    pub fn try_new(credential: Credential, config: GeminiConfig) -> Result<Self> {
        credential.validate_for(ProviderKind::Gemini)?;
        let client = upstream::http_client(Duration::from_secs(config.timeout_secs))?;

        Ok(Self {
            client,
            credential,
            config,
        })
    }

    fn build_body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }],
            },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.schema.to_gemini(),
                "temperature": self.config.options.temperature,
            },
        });

        if request.use_grounding {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }

        body
    }

    /// Text of the first candidate and its web citations
    fn convert_response(response: GenerateResponse, fallback_model: &str) -> GenerationResult {
        let model = response
            .model_version
            .unwrap_or_else(|| fallback_model.to_string());
        let Some(candidate) = response.candidates.into_iter().next() else {
            return GenerationResult::text("").with_model(model);
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let sources = candidate
            .grounding_metadata
            .map(|metadata| extract_sources(metadata.grounding_chunks))
            .unwrap_or_default();

        GenerationResult::text(text)
            .with_sources(sources)
            .with_model(model)
    }
}

fn extract_sources(chunks: Vec<GroundingChunk>) -> Vec<GroundingSource> {
    chunks
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .filter_map(|web| {
            let uri = web.uri.filter(|uri| !uri.is_empty())?;
            let title = web
                .title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| UNTITLED_SOURCE.into());
            Some(GroundingSource::new(title, uri))
        })
        .collect()
}

#[async_trait]
impl StructuredProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER_NAME.into(),
            kind: ProviderKind::Gemini,
            model: self.config.options.model.clone(),
            supports_grounding: true,
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let body = self.build_body(request);
        let response = self
            .client
            .post(self.config.generate_url())
            .header("x-goog-api-key", self.credential.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream::transport_error(PROVIDER_NAME, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| upstream::transport_error(PROVIDER_NAME, &e))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), use_case = %request.use_case, "Gemini request rejected");
            return Err(upstream::classify_failure(PROVIDER_NAME, status.as_u16(), &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(GenerationError::Json)?;
        let result = Self::convert_response(parsed, &self.config.options.model);
        tracing::debug!(
            use_case = %request.use_case,
            sources = result.sources.len(),
            "Gemini generation complete"
        );
        Ok(result)
    }
}
