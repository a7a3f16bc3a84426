//! In-memory scripted provider (testing only)
//!
//! Satisfies the provider surface with canned replies so engine behavior
//! can be exercised without network access. Records every prompt it sees
//! for assertions.

use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    models: Vec<String>,
    credential_hint: Option<&'static str>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful raw-text reply.
    pub fn reply_ok(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queue a transport/backend failure.
    pub fn reply_err(self, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    pub fn with_credential_hint(mut self, hint: &'static str) -> Self {
        self.credential_hint = Some(hint);
        self
    }

    pub fn generate(&self, prompt: &str, _model: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Err(anyhow!("scripted provider exhausted")),
        }
    }

    pub fn list_models(&self) -> Vec<String> {
        self.models.clone()
    }

    pub fn credential_hint(&self) -> Option<&'static str> {
        self.credential_hint
    }

    /// Number of generate calls observed so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}
