//! OpenAI-compatible Chat Completions provider.
//!
//! Serves both OpenAI and Groq; they differ only in base URL and name.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{LlmProvider, Prompt, ProviderConfig, TokenUsage, build_schema_prompt};
use crate::ai::validation::extract_json_from_response;
use crate::types::{AdrError, ErrorClassifier, LlmError, Result};

pub struct OpenAiCompatibleProvider {
    name: &'static str,
    /// Never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("name", &self.name)
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: &'static str,
        api_key: &str,
        model: &str,
        api_base: &str,
        config: &ProviderConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AdrError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            name,
            api_key: SecretString::from(api_key.to_string()),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, prompt: &Prompt, schema: Option<&Value>) -> ChatCompletionRequest {
        let (system, response_format) = match schema {
            Some(schema) => (
                build_schema_prompt(&prompt.system, schema),
                Some(ResponseFormat {
                    format_type: "json_object".to_string(),
                }),
            ),
            None => (prompt.system.clone(), None),
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format,
        }
    }

    async fn complete(&self, prompt: &Prompt, schema: Option<&Value>) -> Result<String> {
        info!(
            "[{}] {} (model: {}, temperature: {})",
            prompt.label, self.name, self.model, self.temperature
        );

        let start_time = Instant::now();
        let request = self.build_request(prompt, schema);
        let url = format!("{}/chat/completions", self.api_base);

        debug!(
            "Sending {} chars to {} ({})",
            prompt.char_count(),
            self.name,
            url
        );

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify(&e.to_string(), self.name))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(status.as_u16(), &body, self.name).into());
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::parse(format!("Unreadable response body: {}", e), self.name)
        })?;

        let usage = body
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        debug!(
            "[{}] {} responded in {:?} ({} tokens)",
            prompt.label,
            self.name,
            start_time.elapsed(),
            usage.total()
        );

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::parse("No content in response", self.name).into())
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn invoke(&self, prompt: &Prompt) -> Result<String> {
        self.complete(prompt, None).await
    }

    async fn invoke_structured(&self, prompt: &Prompt, schema: &Value) -> Result<Value> {
        let content = self.complete(prompt, Some(schema)).await?;
        extract_json_from_response(&content)
            .map_err(|e| LlmError::parse(e.to_string(), self.name).into())
    }

    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::LlmBackend;
    use serde_json::json;

    fn provider() -> OpenAiCompatibleProvider {
        let config = ProviderConfig {
            backend: LlmBackend::Groq {
                api_key: "gsk-test".into(),
                model: "llama".into(),
            },
            temperature: 0.2,
            max_tokens: Some(512),
            timeout_secs: 5,
        };
        OpenAiCompatibleProvider::new("groq", "gsk-test", "llama", "https://x.test/v1/", &config)
            .unwrap()
    }

    #[test]
    fn test_free_text_request_has_no_response_format() {
        let prompt = Prompt::new("comparison", "You compare.", "Compare these.");
        let request = serde_json::to_value(provider().build_request(&prompt, None)).unwrap();

        assert!(request.get("response_format").is_none());
        assert_eq!(request["messages"][0]["content"], "You compare.");
        assert_eq!(request["messages"][1]["role"], "user");
        assert_eq!(request["max_tokens"], 512);
    }

    #[test]
    fn test_structured_request_embeds_schema() {
        let prompt = Prompt::new("infra_analysis:minor", "You classify.", "Terraform...");
        let schema = json!({"type": "object", "required": ["microservices"]});
        let request =
            serde_json::to_value(provider().build_request(&prompt, Some(&schema))).unwrap();

        assert_eq!(request["response_format"]["type"], "json_object");
        let system = request["messages"][0]["content"].as_str().unwrap();
        assert!(system.starts_with("You classify."));
        assert!(system.contains("\"microservices\""));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("gsk-test"));
        assert!(debug.contains("https://x.test/v1"));
    }
}
