//! Google Gemini provider (Generative Language API, `generateContent`).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{LlmProvider, Prompt, ProviderConfig, TokenUsage, build_schema_prompt};
use crate::ai::validation::extract_json_from_response;
use crate::constants::llm::GEMINI_BASE_URL;
use crate::types::{AdrError, ErrorClassifier, LlmError, Result};

const NAME: &str = "gemini";

pub struct GeminiProvider {
    api_key: SecretString,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AdrError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key: SecretString::from(api_key.to_string()),
            model: model.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, prompt: &Prompt, schema: Option<&Value>) -> GenerateContentRequest {
        let (user_text, response_mime_type) = match schema {
            Some(schema) => (
                build_schema_prompt(&prompt.user, schema),
                Some("application/json".to_string()),
            ),
            None => (prompt.user.clone(), None),
        };

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: prompt.system.clone(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: user_text }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
                response_mime_type,
            },
        }
    }

    async fn generate(&self, prompt: &Prompt, schema: Option<&Value>) -> Result<String> {
        info!(
            "[{}] gemini (model: {}, temperature: {})",
            prompt.label, self.model, self.temperature
        );

        let start_time = Instant::now();
        let url = format!("{}/models/{}:generateContent", GEMINI_BASE_URL, self.model);
        let request = self.build_request(prompt, schema);

        debug!("Sending {} chars to gemini", prompt.char_count());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify(&e.to_string(), NAME))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(status.as_u16(), &body, NAME).into());
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(format!("Unreadable response body: {}", e), NAME))?;

        let usage = body
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        debug!(
            "[{}] gemini responded in {:?} ({} tokens)",
            prompt.label,
            start_time.elapsed(),
            usage.total()
        );

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::parse("No content in response", NAME).into());
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn invoke(&self, prompt: &Prompt) -> Result<String> {
        self.generate(prompt, None).await
    }

    async fn invoke_structured(&self, prompt: &Prompt, schema: &Value) -> Result<Value> {
        let content = self.generate(prompt, Some(schema)).await?;
        extract_json_from_response(&content).map_err(|e| LlmError::parse(e.to_string(), NAME).into())
    }

    fn name(&self) -> &str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
