//! Groq Provider
//!
//! Implementation of `StructuredProvider` over Groq's OpenAI-compatible
//! chat-completions endpoint. JSON-object mode guarantees an object but not
//! a schema, so the schema travels inside the system message. Groq has no
//! web-search tool: results never carry citations.

use std::time::Duration;

use async_trait::async_trait;
use riskit_core::{
    Credential, GenerationError, GenerationOptions, GenerationRequest, GenerationResult,
    ProviderInfo, ProviderKind, Result, StructuredProvider,
};
use serde::{Deserialize, Serialize};

use crate::upstream;

const PROVIDER_NAME: &str = "Groq";

/// Groq provider configuration
#[derive(Clone, Debug)]
pub struct GroqConfig {
    /// Base URL up to and including `/openai/v1`
    pub base_url: String,

    pub options: GenerationOptions,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".into(),
            options: GenerationOptions::new("llama-3.3-70b-versatile"),
            timeout_secs: 60,
        }
    }
}

impl GroqConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("GROQ_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("GROQ_MODEL") {
            config.options.model = model;
        }
        config
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Groq structured-generation provider
pub struct GroqProvider {
    client: reqwest::Client,
    credential: Credential,
    config: GroqConfig,
}

impl GroqProvider {
    /// Create a provider, rejecting implausible keys up front
    pub fn try_new(credential: Credential, config: GroqConfig) -> Result<Self> {
        credential.validate_for(ProviderKind::Groq)?;
        let client = upstream::http_client(Duration::from_secs(config.timeout_secs))?;

        Ok(Self {
            client,
            credential,
            config,
        })
    }

    /// System message carrying the instruction and the expected schema
    fn system_message(request: &GenerationRequest) -> String {
        let schema = request.schema.to_json_schema();
        let mut content = format!(
            "{}\n\nRespond with a single JSON value that conforms to this JSON Schema:\n{schema}",
            request.system_instruction
        );
        // json_object mode cannot return a bare array
        if request.schema.is_array_rooted() {
            content.push_str("\nWrap the array in an object as {\"items\": [...]}.");
        }
        content
    }

    fn build_body<'a>(&'a self, request: &GenerationRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.options.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::system_message(request),
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt.clone(),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: self.config.options.temperature,
        }
    }

    fn convert_response(response: ChatResponse, fallback_model: &str) -> GenerationResult {
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        GenerationResult::text(text)
            .with_model(response.model.unwrap_or_else(|| fallback_model.to_string()))
    }
}

#[async_trait]
impl StructuredProvider for GroqProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER_NAME.into(),
            kind: ProviderKind::Groq,
            model: self.config.options.model.clone(),
            supports_grounding: false,
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        if request.use_grounding {
            tracing::debug!(use_case = %request.use_case, "Groq has no web-search tool; grounding ignored");
        }

        let body = self.build_body(request);
        let response = self
            .client
            .post(self.config.chat_completions_url())
            .bearer_auth(self.credential.as_str())
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
            tracing::warn!(status = status.as_u16(), use_case = %request.use_case, "Groq request rejected");
            return Err(upstream::classify_failure(PROVIDER_NAME, status.as_u16(), &text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(GenerationError::Json)?;
        Ok(Self::convert_response(parsed, &self.config.options.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskit_core::{OutputSchema, UseCase};

    const KEY: &str = "gsk_0123456789abcdefghijklmnop";

    fn provider() -> GroqProvider {
        GroqProvider::try_new(Credential::new(KEY), GroqConfig::default()).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = GroqConfig::default();
        assert_eq!(
            config.chat_completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(config.options.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_rejects_gemini_key() {
        let result = GroqProvider::try_new(
            Credential::new("AIzaSyD-0123456789abcdefghijk"),
            GroqConfig::default(),
        );
        assert!(matches!(result, Err(GenerationError::Config(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let provider = provider();
        let request = GenerationRequest::new(
            UseCase::Compare,
            "Compare BTC vs ETH",
            "Risk arb specialist.",
            OutputSchema::object([("winner", OutputSchema::string())]).all_required(),
        );

        let body = serde_json::to_value(provider.build_body(&request)).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Compare BTC vs ETH");
        let system = body["messages"][0]["content"].as_str().unwrap();
        assert!(system.starts_with("Risk arb specialist."));
        assert!(system.contains("\"winner\""));
        assert!(!system.contains("\"items\""));
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_array_schema_requests_envelope() {
        let request = GenerationRequest::new(
            UseCase::Pulse,
            "Latest events",
            "Fetch 5 events.",
            OutputSchema::array(OutputSchema::object([("title", OutputSchema::string())])),
        );
        assert!(GroqProvider::system_message(&request).contains("{\"items\": [...]}"));
    }

    #[test]
    fn test_response_conversion() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"model":"llama-3.3-70b-versatile","choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#,
        )
        .unwrap();
        let result = GroqProvider::convert_response(response, "fallback");
        assert_eq!(result.raw_text, "{\"a\":1}");
        assert_eq!(result.model, "llama-3.3-70b-versatile");
        assert!(result.sources.is_empty());
    }

    #[test]
    fn test_empty_choices_yield_empty_text() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let result = GroqProvider::convert_response(response, "fallback");
        assert!(result.raw_text.is_empty());
        assert_eq!(result.model, "fallback");
    }
}
