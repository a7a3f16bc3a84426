//! Single lab experiment execution
//!
//! Runs one provider/model/strategy/constraint cell through the engine.
//! Lab runs have no separate fallback target; the primary target doubles
//! as its own fallback so exhaustion reports the primary's failure.

use crate::config::{LabSingleConfig, ProdConfig};
use crate::engine;
use crate::prompt::PromptLibrary;
use crate::providers::Registry;
use crate::types::{ChangeSnapshot, EngineResult};

/// Knobs shared by every cell of a lab run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub max_retries: u32,
    pub timeout_seconds: u64,
    pub intent: Option<String>,
    pub debug: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout_seconds: 60,
            intent: None,
            debug: false,
        }
    }
}

pub async fn run_single_experiment(
    registry: &Registry,
    prompts: &PromptLibrary,
    snapshot: &ChangeSnapshot,
    config: &LabSingleConfig,
    options: &RunOptions,
) -> EngineResult {
    let prod = ProdConfig {
        provider: config.provider.clone(),
        model: config.model.clone(),
        strategy: config.strategy.clone(),
        fallback: config.target(),
        constraints: config.constraints,
        max_retries: options.max_retries,
        timeout_seconds: options.timeout_seconds,
    };
    engine::run_once(
        registry,
        prompts,
        snapshot,
        &prod,
        options.intent.as_deref(),
        options.debug,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConstraintBounds;
    use crate::providers::scripted::ScriptedProvider;
    use crate::providers::Provider;

    #[tokio::test]
    async fn single_run_reports_target_meta() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zero-shot.txt"), "Write a commit message.").unwrap();
        let prompts = PromptLibrary::new(dir.path());

        let mut registry = Registry::new();
        registry.register(
            "mock",
            Provider::Scripted(
                ScriptedProvider::new().reply_ok(r#"{"subject":"fix parser bounds"}"#),
            ),
        );

        let config = LabSingleConfig {
            provider: "mock".to_string(),
            model: "test-model".to_string(),
            strategy: "zero-shot".to_string(),
            constraints: ConstraintBounds::default(),
        };
        let snapshot = ChangeSnapshot {
            diff: "+x".to_string(),
            ..Default::default()
        };

        let result = run_single_experiment(
            &registry,
            &prompts,
            &snapshot,
            &config,
            &RunOptions::default(),
        )
        .await;

        assert!(result.is_valid());
        assert_eq!(result.meta["provider"], "mock");
        assert_eq!(result.meta["fallback_used"], false);
    }
}
