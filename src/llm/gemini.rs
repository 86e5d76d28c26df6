//! Gemini API client
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use super::LanguageModel;
use crate::error::AnalyzerError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> crate::Result<Self> {
        Self::with_base_url(api_key, model, GEMINI_BASE_URL)
    }

    pub fn with_base_url(api_key: String, model: String, base_url: &str) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(120))
            .build()?;

        let endpoint = format!("{}/{}:generateContent", base_url.trim_end_matches('/'), model);

        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, system_prompt: &str, prompt: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(AnalyzerError::LlmError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 2048,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            },
        };

        info!(model = %self.model, prompt_chars = prompt.len(), "Calling Gemini API");

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // Error text is returned to API callers; never include the request URL
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                AnalyzerError::LlmError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AnalyzerError::LlmError(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            AnalyzerError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        extract_answer(gemini_response)
    }
}

fn extract_answer(response: GeminiResponse) -> crate::Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AnalyzerError::LlmError("No response from Gemini API".to_string()))?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        warn!("Gemini response stopped by safety filter");
    }

    let answer = candidate
        .content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");

    if answer.trim().is_empty() {
        return Err(AnalyzerError::LlmError(
            "Empty response from Gemini".to_string(),
        ));
    }

    Ok(answer)
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "Summarize the cash flow statement".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 2048,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: "You are a financial analyst".to_string(),
                }],
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("Summarize the cash flow statement"));
        assert!(json.contains("system_instruction"));
    }

    #[test]
    fn test_extract_answer_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Revenue grew " }, { "text": "12%." }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(extract_answer(response).unwrap(), "Revenue grew 12%.");
    }

    #[test]
    fn test_extract_answer_rejects_empty() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({ "candidates": [] })).unwrap();
        assert!(matches!(extract_answer(response), Err(AnalyzerError::LlmError(_))));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let client = GeminiClient::new(String::new(), "gemini-2.0-flash".to_string()).unwrap();
        let err = client.generate("system", "prompt").await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_key() {
        let client = GeminiClient::with_base_url(
            "SECRET123".to_string(),
            "gemini-2.0-flash".to_string(),
            "http://127.0.0.1:9/v1beta/models",
        )
        .unwrap();

        let err = client.generate("system", "prompt").await.unwrap_err();
        let message = err.to_string();

        assert!(matches!(err, AnalyzerError::LlmError(_)));
        assert!(!message.contains("SECRET123"), "key leaked: {}", message);
    }

    #[test]
    fn test_endpoint_has_no_key() {
        let client = GeminiClient::new("SECRET123".to_string(), "gemini-2.0-flash".to_string()).unwrap();
        assert!(client.endpoint.ends_with("/gemini-2.0-flash:generateContent"));
        assert!(!client.endpoint.contains("SECRET123"));
    }
}
