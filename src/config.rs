//! Configuration loading for production and lab execution modes
//!
//! Config files are TOML. Violated constraint bounds are a configuration
//! error surfaced at load time, never a runtime error.

use crate::types::GenerationTarget;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Word-count constraint bounds. Unset bounds impose no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintBounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ConstraintBounds {
    /// Check `min <= max` when both bounds are set.
    pub fn check(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                bail!("constraint bounds invalid: min ({}) exceeds max ({})", min, max);
            }
        }
        Ok(())
    }

    /// Stable sorted-key serialization used in prompt composition, so
    /// prompt text is reproducible for identical inputs.
    pub fn to_sorted_json(&self) -> String {
        let mut map = BTreeMap::new();
        if let Some(max) = self.max {
            map.insert("max", max);
        }
        if let Some(min) = self.min {
            map.insert("min", min);
        }
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Production runtime configuration (`config/prod.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdConfig {
    pub provider: String,
    pub model: String,
    pub strategy: String,
    pub fallback: GenerationTarget,
    #[serde(default)]
    pub constraints: ConstraintBounds,
    pub max_retries: u32,
    pub timeout_seconds: u64,
}

impl ProdConfig {
    pub fn primary_target(&self) -> GenerationTarget {
        GenerationTarget {
            provider: self.provider.clone(),
            model: self.model.clone(),
            strategy: self.strategy.clone(),
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// One lab single-run target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabSingleConfig {
    pub provider: String,
    pub model: String,
    pub strategy: String,
    #[serde(default)]
    pub constraints: ConstraintBounds,
}

impl LabSingleConfig {
    pub fn target(&self) -> GenerationTarget {
        GenerationTarget {
            provider: self.provider.clone(),
            model: self.model.clone(),
            strategy: self.strategy.clone(),
        }
    }
}

/// Ordered provider entry in the batch matrix. An array of tables keeps
/// expansion order deterministic, which row ids depend on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderModels {
    pub provider: String,
    pub models: Vec<String>,
}

/// Labelled constraint set in the batch matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub label: String,
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ConstraintSet {
    pub fn bounds(&self) -> ConstraintBounds {
        ConstraintBounds {
            min: self.min,
            max: self.max,
        }
    }
}

/// Batch experiment matrix definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabBatchConfig {
    pub providers: Vec<ProviderModels>,
    pub strategies: Vec<String>,
    pub constraints: Vec<ConstraintSet>,
}

/// Top-level lab configuration (`config/lab.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabConfig {
    pub single: LabSingleConfig,
    pub batch: LabBatchConfig,
}

/// Process-wide backend settings, read from the environment exactly once
/// at startup and passed down to each provider client.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub ollama_host: String,
    pub ollama_num_ctx: u32,
    pub ollama_timeout: Duration,
    pub groq_api_key: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            ollama_host: "http://localhost:11434".to_string(),
            ollama_num_ctx: 8192,
            ollama_timeout: Duration::from_secs(120),
            groq_api_key: None,
        }
    }
}

impl BackendSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ollama_host: std::env::var("OLLAMA_HOST").unwrap_or(defaults.ollama_host),
            ollama_num_ctx: std::env::var("OLLAMA_NUM_CTX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ollama_num_ctx),
            ollama_timeout: std::env::var("OLLAMA_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.ollama_timeout),
            groq_api_key: std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }
}

/// Load and validate production config from a TOML file.
pub fn load_prod_config(path: &Path) -> Result<ProdConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Config file not found: {}", path.display()))?;
    let config: ProdConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.constraints.check()?;
    Ok(config)
}

/// Load and validate lab config from a TOML file.
pub fn load_lab_config(path: &Path) -> Result<LabConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Config file not found: {}", path.display()))?;
    let config: LabConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.single.constraints.check()?;
    for set in &config.batch.constraints {
        set.bounds()
            .check()
            .with_context(|| format!("constraint set '{}'", set.label))?;
    }
    Ok(config)
}
