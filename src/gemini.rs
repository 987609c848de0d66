use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::GeminiConfig;
use crate::error::AppError;

#[derive(Debug)]
pub struct GenerationError {
    pub message: String,
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for GenerationError {
    fn from(s: String) -> Self {
        GenerationError { message: s }
    }
}

impl From<&str> for GenerationError {
    fn from(s: &str) -> Self {
        GenerationError {
            message: s.to_string(),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        AppError::Upstream(err.message)
    }
}

/// Single-shot text completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::from("GEMINI_API_KEY is not configured"))?;

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::from(format!("Gemini request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GenerationError::from(format!("Failed to read Gemini response: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| env.error.message)
                .unwrap_or_else(|_| text.chars().take(512).collect());
            return Err(GenerationError::from(format!(
                "Gemini returned {}: {detail}",
                status.as_u16()
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::from(format!("Invalid Gemini response: {e}")))?;
        parsed.into_text()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn into_text(self) -> Result<String, GenerationError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerationError::from(format!("Prompt blocked: {reason}")));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::from("Gemini returned no candidates"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(GenerationError::from(format!(
                "Gemini returned no text (finish reason: {reason})"
            )));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: serde_json::Value) -> Result<String, GenerationError> {
        serde_json::from_value::<GenerateContentResponse>(body)
            .unwrap()
            .into_text()
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let text = parse(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "Hel" }, { "text": "lo" }] }, "finishReason": "STOP" },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(text, "Hello");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let err = parse(json!({
            "candidates": [],
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap_err();
        assert!(err.message.contains("SAFETY"));
    }

    #[test]
    fn candidate_without_text_is_an_error() {
        let err = parse(json!({
            "candidates": [{ "finishReason": "RECITATION" }]
        }))
        .unwrap_err();
        assert!(err.message.contains("RECITATION"));

        assert!(parse(json!({})).is_err());
    }

    #[test]
    fn endpoint_uses_configured_model() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: Some("k".to_string()),
            base_url: "http://127.0.0.1:9999/".to_string(),
            model: "gemini-pro".to_string(),
        });
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:9999/v1beta/models/gemini-pro:generateContent"
        );
    }
}
