//! Ollama backend adapter
//!
//! Local-model transport against an Ollama host. Host, context window,
//! and request timeout come from `BackendSettings` built once at startup.

use crate::config::BackendSettings;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    num_ctx: u32,
    timeout: Duration,
}

#[derive(Deserialize)]
struct TagList {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaClient {
    pub fn new(http: reqwest::Client, settings: &BackendSettings) -> Self {
        Self {
            http,
            host: settings.ollama_host.trim_end_matches('/').to_string(),
            num_ctx: settings.ollama_num_ctx,
            timeout: settings.ollama_timeout,
        }
    }

    /// List model names available on the configured host.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.host))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("Ollama tags request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Ollama API error {}", status);
        }

        let payload: TagList = response
            .json()
            .await
            .context("Failed to parse Ollama tags response")?;
        Ok(payload.models.into_iter().filter_map(|entry| entry.name).collect())
    }

    /// Generate completion text for an already-composed prompt.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": {"num_ctx": self.num_ctx},
        });

        let response = self
            .http
            .post(format!("{}/api/generate", self.host))
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .context("Ollama request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!(
                "Ollama API error {}: {}",
                status,
                super::truncate_str(&text, 200)
            );
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;
        payload
            .response
            .context("Invalid Ollama response payload")
    }
}
