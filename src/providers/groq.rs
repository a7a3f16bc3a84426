//! Groq backend adapter
//!
//! OpenAI-compatible chat completions over HTTPS. The API key comes from
//! `BackendSettings`; this module never reads the environment itself.

use super::truncate_str;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

const GROQ_MODELS_URL: &str = "https://api.groq.com/openai/v1/models";
const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Environment variable the key is sourced from; referenced in error
/// text so a missing credential is diagnosable from the result alone.
pub const CREDENTIAL_ENV: &str = "GROQ_API_KEY";

/// Non-text models excluded from the model listing.
const EXCLUDED_MODEL_KEYWORDS: [&str; 5] =
    ["whisper", "guard", "safeguard", "prompt-guard", "orpheus"];

#[derive(Debug)]
pub struct GroqClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

impl GroqClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    /// List chat-capable model ids, sorted and de-duplicated. Returns an
    /// empty list when the key is missing or the request fails.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        let response = self
            .http
            .get(GROQ_MODELS_URL)
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(10))
            .send()
            .await;

        let payload: ModelList = match response {
            Ok(response) if response.status().is_success() => {
                response.json().await.unwrap_or(ModelList { data: vec![] })
            }
            _ => return Ok(Vec::new()),
        };

        let mut ids: Vec<String> = payload
            .data
            .into_iter()
            .filter_map(|entry| entry.id)
            .filter(|id| {
                let lowered = id.to_lowercase();
                !EXCLUDED_MODEL_KEYWORDS
                    .iter()
                    .any(|keyword| lowered.contains(keyword))
            })
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Generate completion text via the chat-completions endpoint.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("{CREDENTIAL_ENV} is not set.");
        };

        let payload = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.2,
        });

        let response = self
            .http
            .post(GROQ_CHAT_URL)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .context("Groq request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Groq API error {}: {}", status, truncate_str(&text, 200));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Groq response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Groq response contained no choices")
    }
}
