//! OpenAI-compatible classification provider.
//!
//! Works against OpenAI, Azure OpenAI, Ollama, vLLM, and any endpoint that
//! follows the OpenAI chat completions API format.

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::parser;
use crate::providers::AbstractClassifier;
use crate::record::AnnotationRecord;
use crate::schema;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// OpenAI-compatible chat-completions classifier.
pub struct OpenAiCompatibleClassifier {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleClassifier {
    /// Create a classifier from configuration.
    ///
    /// Reads the API key from the environment variable named in
    /// `config.api_key_env`. Local endpoints (Ollama, vLLM, LM Studio) are
    /// exempt and get a dummy bearer token.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let is_local = config
            .base_url
            .as_ref()
            .map(|u| u.contains("localhost") || u.contains("127.0.0.1"))
            .unwrap_or(false);

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .or_else(|| {
                if is_local {
                    debug!("No API key set for local provider; using dummy bearer token");
                    Some("ollama".to_string())
                } else {
                    None
                }
            })
            .ok_or_else(|| LlmError::AuthFailed {
                provider: format!(
                    "OpenAI-compatible: env var '{}' not set",
                    config.api_key_env
                ),
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Build the chat-completions request body for one abstract.
    fn request_body(&self, abstract_text: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": schema::SYSTEM_PROMPT },
                { "role": "user", "content": schema::build_classification_prompt(abstract_text) },
            ],
            "temperature": self.temperature,
            "stream": false,
        })
    }

    /// Pull the assistant message text out of a chat-completions response.
    fn response_content(body: &Value) -> Result<String, LlmError> {
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|text| text.trim().to_string())
            .ok_or_else(|| LlmError::ResponseParse {
                message: "No message content in response".to_string(),
            })
    }

    /// Map an HTTP status code to the appropriate LlmError.
    fn map_http_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        match status.as_u16() {
            401 => {
                debug!(body = %body, "Authentication failed (401)");
                LlmError::AuthFailed {
                    provider: "OpenAI-compatible".to_string(),
                }
            }
            429 => {
                // Try to extract "try again in Xs" from the error message.
                let retry_secs = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|v| {
                        v.get("error")?
                            .get("message")?
                            .as_str()
                            .map(|s| s.to_string())
                    })
                    .and_then(|msg| {
                        msg.split("in ")
                            .last()
                            .and_then(|s| s.trim_end_matches('s').parse::<u64>().ok())
                    })
                    .unwrap_or(5);
                LlmError::RateLimited {
                    retry_after_secs: retry_secs,
                }
            }
            status if status >= 500 => LlmError::ApiRequest {
                message: format!("Server error ({}): {}", status, body),
            },
            _ => LlmError::ApiRequest {
                message: format!("HTTP {}: {}", status, body),
            },
        }
    }
}

#[async_trait]
impl AbstractClassifier for OpenAiCompatibleClassifier {
    async fn classify(&self, abstract_text: &str) -> Result<AnnotationRecord, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(abstract_text);

        debug!(url = %url, model = %self.model, "Sending classification request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        let response_body = response.text().await.map_err(|e| LlmError::ApiRequest {
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &response_body));
        }

        let json: Value =
            serde_json::from_str(&response_body).map_err(|e| LlmError::ResponseParse {
                message: format!("Invalid JSON: {}", e),
            })?;

        let content = Self::response_content(&json)?;

        // An undeliverable annotation is still a delivered response: keep
        // the batch alive by downgrading it to an error-marker record.
        match parser::extract_annotation(&content) {
            Ok(record) => Ok(record),
            Err(failure) => {
                warn!(model = %self.model, "response was not parseable JSON");
                Ok(AnnotationRecord::from_error(failure.to_string()))
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "GEROSCOPE_TEST_OPENAI_KEY".to_string(),
            base_url: None,
            temperature: 0.7,
        }
    }

    fn classifier_with_key() -> OpenAiCompatibleClassifier {
        OpenAiCompatibleClassifier {
            client: Client::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: "sk-test".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let classifier = classifier_with_key();
        let body = classifier.request_body("Older adults were surveyed in JAPAN.");

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], schema::SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Older adults were surveyed in JAPAN."));
        assert!(user.contains("'country'"));
    }

    #[test]
    fn test_response_content_drill_down() {
        let body = json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "  {\"aging_related\": 1}  " },
                "finish_reason": "stop"
            }],
            "model": "gpt-4o"
        });
        let content = OpenAiCompatibleClassifier::response_content(&body).unwrap();
        assert_eq!(content, "{\"aging_related\": 1}");
    }

    #[test]
    fn test_response_content_no_choices() {
        let body = json!({"choices": []});
        let result = OpenAiCompatibleClassifier::response_content(&body);
        assert!(matches!(result, Err(LlmError::ResponseParse { .. })));
    }

    #[test]
    fn test_http_error_mapping_401() {
        let err = OpenAiCompatibleClassifier::map_http_error(
            reqwest::StatusCode::UNAUTHORIZED,
            "Unauthorized",
        );
        assert!(matches!(err, LlmError::AuthFailed { .. }));
    }

    #[test]
    fn test_http_error_mapping_429() {
        let err = OpenAiCompatibleClassifier::map_http_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit exceeded, try again in 12s"}}"#,
        );
        match err {
            LlmError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 12),
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn test_http_error_mapping_500() {
        let err = OpenAiCompatibleClassifier::map_http_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        );
        match err {
            LlmError::ApiRequest { message } => assert!(message.contains("500")),
            other => panic!("Expected ApiRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_new_reads_env() {
        // SAFETY: test-only env var manipulation
        unsafe { std::env::set_var("GEROSCOPE_TEST_OPENAI_KEY", "sk-test-key") };
        let classifier = OpenAiCompatibleClassifier::new(&test_config()).unwrap();
        assert_eq!(classifier.model_name(), "gpt-4o");
        // SAFETY: test-only env var manipulation
        unsafe { std::env::remove_var("GEROSCOPE_TEST_OPENAI_KEY") };
    }

    #[test]
    fn test_new_missing_key() {
        // SAFETY: test-only env var manipulation
        unsafe { std::env::remove_var("GEROSCOPE_TEST_OPENAI_KEY_MISSING") };
        let mut config = test_config();
        config.api_key_env = "GEROSCOPE_TEST_OPENAI_KEY_MISSING".to_string();
        assert!(OpenAiCompatibleClassifier::new(&config).is_err());
    }

    #[test]
    fn test_local_endpoint_no_api_key_required() {
        // SAFETY: test-only env var manipulation
        unsafe { std::env::remove_var("GEROSCOPE_TEST_OLLAMA_KEY_NONEXISTENT") };
        let mut config = test_config();
        config.api_key_env = "GEROSCOPE_TEST_OLLAMA_KEY_NONEXISTENT".to_string();
        config.base_url = Some("http://localhost:11434/v1".to_string());
        config.model = "qwen2.5:14b".to_string();
        let classifier = OpenAiCompatibleClassifier::new(&config).unwrap();
        assert_eq!(classifier.model_name(), "qwen2.5:14b");
        assert_eq!(classifier.base_url, "http://localhost:11434/v1");
    }
}
