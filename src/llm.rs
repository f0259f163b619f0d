use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use crate::conf::Settings;

#[derive(Debug, Clone, PartialEq)]
pub struct LlmError(pub String);

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(value: reqwest::Error) -> Self {
        LlmError(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the raw text of the first choice.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    key: String,
}

impl OpenAiClient {
    pub fn from_settings(s: &Settings) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(OpenAiClient {
            http,
            endpoint: s.ai_endpoint.trim_end_matches('/').to_string(),
            model: s.ai_model.clone(),
            key: s.ai_key.clone(),
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "response_format": { "type": "json_object" },
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError(format!("completion endpoint returned {status}: {detail}")));
        }
        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError("completion had no content".into()))
    }
}

/// Structured screening verdict returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(deserialize_with = "number_or_string")]
    pub score: f64,
    #[serde(rename = "pontos_fortes", default)]
    pub strengths: Vec<String>,
    #[serde(rename = "pontos_melhoria", default)]
    pub improvements: Vec<String>,
    #[serde(rename = "adequacao_vaga", default)]
    pub job_fit: String,
    #[serde(rename = "recomendacao", default)]
    pub recommendation: String,
    #[serde(rename = "justificativa", default)]
    pub justification: String,
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(serde::de::Error::custom),
    }
}

/// Parses a model reply, tolerating markdown code fences around the JSON.
pub fn parse_analysis(raw: &str) -> Result<AiAnalysis, LlmError> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(cleaned).map_err(|e| LlmError(format!("unparseable analysis: {e}")))
}
