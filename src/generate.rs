//! Single generation attempt: prompt → provider → normalized candidate
//!
//! Owns prompt composition and the provider call. Rule checks belong to
//! the validator; retry policy belongs to the engine. Every failure on
//! the way to raw text (missing template, unknown provider, transport
//! error, timeout) classifies as `provider_error`.

use crate::config::ConstraintBounds;
use crate::normalize::{normalize_response, NormalizeError};
use crate::prompt::{build_prompt, PromptLibrary};
use crate::providers::Registry;
use crate::types::{AttemptOutcome, ChangeSnapshot, ErrorKind, GenerationTarget};
use std::time::Duration;

fn failed(kind: ErrorKind, reason: Option<String>) -> AttemptOutcome {
    AttemptOutcome::Failed { kind, reason }
}

/// Run one backend attempt against a target.
///
/// `feedback` is an extensibility point for threading the previous
/// attempt's failure back into the prompt; the engine currently passes
/// `None`. The timeout is a per-attempt deadline around the provider
/// call; a timed-out call counts as a provider failure.
pub async fn generate_candidate(
    registry: &Registry,
    prompts: &PromptLibrary,
    snapshot: &ChangeSnapshot,
    target: &GenerationTarget,
    intent: Option<&str>,
    bounds: &ConstraintBounds,
    feedback: Option<&str>,
    attempt_timeout: Duration,
) -> AttemptOutcome {
    let template = match prompts.load(&target.strategy) {
        Ok(template) => template,
        Err(err) => return failed(ErrorKind::ProviderError, Some(format!("{err:#}"))),
    };

    let mut prompt = build_prompt(&template, snapshot, intent, bounds);
    if let Some(feedback) = feedback {
        prompt = format!("{prompt}\n\nFeedback:\n{feedback}");
    }

    let Some(provider) = registry.get(&target.provider) else {
        return failed(
            ErrorKind::ProviderError,
            Some(format!("Unknown provider: {}", target.provider)),
        );
    };

    let raw = match tokio::time::timeout(attempt_timeout, provider.generate(&prompt, &target.model))
        .await
    {
        Err(_) => {
            return failed(
                ErrorKind::ProviderError,
                Some(format!(
                    "attempt timed out after {}s",
                    attempt_timeout.as_secs()
                )),
            )
        }
        Ok(Err(err)) => return failed(ErrorKind::ProviderError, Some(format!("{err:#}"))),
        Ok(Ok(raw)) => raw,
    };

    match normalize_response(&raw) {
        Ok(candidate) => AttemptOutcome::Generated(candidate),
        Err(NormalizeError::InvalidJson) => failed(ErrorKind::InvalidJson, None),
        Err(NormalizeError::InvalidSchema) => failed(ErrorKind::InvalidSchema, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::scripted::ScriptedProvider;
    use crate::providers::Provider;

    fn snapshot() -> ChangeSnapshot {
        ChangeSnapshot {
            diff: "+line".to_string(),
            status: "M  src/lib.rs".to_string(),
            files_changed: vec!["src/lib.rs".to_string()],
            insertions: 1,
            deletions: 0,
        }
    }

    fn target(provider: &str) -> GenerationTarget {
        GenerationTarget {
            provider: provider.to_string(),
            model: "test-model".to_string(),
            strategy: "zero-shot".to_string(),
        }
    }

    fn library(dir: &tempfile::TempDir) -> PromptLibrary {
        std::fs::write(dir.path().join("zero-shot.txt"), "TEMPLATE").unwrap();
        PromptLibrary::new(dir.path())
    }

    #[tokio::test]
    async fn unknown_provider_is_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = generate_candidate(
            &Registry::new(),
            &library(&dir),
            &snapshot(),
            &target("nope"),
            None,
            &ConstraintBounds::default(),
            None,
            Duration::from_secs(5),
        )
        .await;

        match outcome {
            AttemptOutcome::Failed { kind, reason } => {
                assert_eq!(kind, ErrorKind::ProviderError);
                assert!(reason.unwrap().contains("Unknown provider: nope"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_template_is_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new();
        let outcome = generate_candidate(
            &registry,
            &PromptLibrary::new(dir.path()),
            &snapshot(),
            &target("mock"),
            None,
            &ConstraintBounds::default(),
            None,
            Duration::from_secs(5),
        )
        .await;

        match outcome {
            AttemptOutcome::Failed { kind, reason } => {
                assert_eq!(kind, ErrorKind::ProviderError);
                assert!(reason.unwrap().contains("zero-shot"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn feedback_is_appended_to_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new();
        registry.register(
            "mock",
            Provider::Scripted(ScriptedProvider::new().reply_ok(r#"{"subject":"s"}"#)),
        );

        let outcome = generate_candidate(
            &registry,
            &library(&dir),
            &snapshot(),
            &target("mock"),
            Some("be brief"),
            &ConstraintBounds::default(),
            Some("subject was empty"),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(outcome, AttemptOutcome::Generated(_)));

        let Provider::Scripted(fake) = registry.get("mock").unwrap() else {
            unreachable!()
        };
        let prompt = fake.prompts().pop().unwrap();
        assert!(prompt.contains("Intent: be brief"));
        assert!(prompt.ends_with("\n\nFeedback:\nsubject was empty"));
    }

    #[tokio::test]
    async fn normalization_failures_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new();
        registry.register(
            "mock",
            Provider::Scripted(
                ScriptedProvider::new()
                    .reply_ok("plain prose, no json")
                    .reply_ok(r#"{"subject": 7}"#),
            ),
        );
        let library = library(&dir);

        let first = generate_candidate(
            &registry,
            &library,
            &snapshot(),
            &target("mock"),
            None,
            &ConstraintBounds::default(),
            None,
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(
            first,
            AttemptOutcome::Failed {
                kind: ErrorKind::InvalidJson,
                ..
            }
        ));

        let second = generate_candidate(
            &registry,
            &library,
            &snapshot(),
            &target("mock"),
            None,
            &ConstraintBounds::default(),
            None,
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(
            second,
            AttemptOutcome::Failed {
                kind: ErrorKind::InvalidSchema,
                ..
            }
        ));
    }
}
