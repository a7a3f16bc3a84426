//! Provider registry and shared capability surface
//!
//! Each backend is a transport adapter only: it receives fully-composed
//! prompt text and returns raw model text. Prompt strategy and rule
//! policy live upstream. New backends are added as enum variants and
//! registered under a name, keeping a closed, uniform call surface.

pub mod groq;
pub mod ollama;
pub mod scripted;

use crate::config::BackendSettings;
use anyhow::Result;
use groq::GroqClient;
use ollama::OllamaClient;
use scripted::ScriptedProvider;
use std::collections::BTreeMap;

/// One registered generation backend.
#[derive(Debug)]
pub enum Provider {
    Ollama(OllamaClient),
    Groq(GroqClient),
    /// In-memory fake with canned replies (testing only)
    Scripted(ScriptedProvider),
}

impl Provider {
    /// Generate raw text for a fully-prepared prompt. Every failure maps
    /// to `provider_error` upstream.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        match self {
            Provider::Ollama(client) => client.generate(prompt, model).await,
            Provider::Groq(client) => client.generate(prompt, model).await,
            Provider::Scripted(fake) => fake.generate(prompt, model),
        }
    }

    /// List available model identifiers; may be empty on failure.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        match self {
            Provider::Ollama(client) => client.list_models().await,
            Provider::Groq(client) => client.list_models().await,
            Provider::Scripted(fake) => Ok(fake.list_models()),
        }
    }

    /// Name of the credential this backend cannot run without, if any.
    /// The fallback coordinator uses this to refuse masking a missing
    /// credential behind a fallback target.
    pub fn credential_hint(&self) -> Option<&'static str> {
        match self {
            Provider::Ollama(_) => None,
            Provider::Groq(_) => Some(groq::CREDENTIAL_ENV),
            Provider::Scripted(fake) => fake.credential_hint(),
        }
    }
}

/// Mapping from provider name to its backend implementation.
#[derive(Debug, Default)]
pub struct Registry {
    providers: BTreeMap<String, Provider>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the production registry from process-wide backend settings.
    pub fn from_settings(settings: &BackendSettings) -> Self {
        let http = reqwest::Client::new();
        let mut registry = Self::new();
        registry.register(
            "ollama",
            Provider::Ollama(OllamaClient::new(http.clone(), settings)),
        );
        registry.register(
            "groq",
            Provider::Groq(GroqClient::new(http, settings.groq_api_key.clone())),
        );
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Provider) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

/// Truncate a string for error previews (Unicode-safe).
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    if s.chars().count() <= max_chars {
        s
    } else {
        let byte_idx = s
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        &s[..byte_idx]
    }
}
