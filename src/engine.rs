//! Engine orchestration: retry loop per target, fallback across targets
//!
//! `run_target` drives one provider/model/strategy through composing,
//! calling, normalizing, and validating, retrying up to the configured
//! cap. `run_once` wraps a primary and a fallback target and decides
//! which result to surface. The snapshot is built by the caller and read
//! here exactly once per run, never re-fetched between attempts or
//! targets.

use crate::config::{ConstraintBounds, ProdConfig};
use crate::generate::generate_candidate;
use crate::logger::debug_log;
use crate::prompt::PromptLibrary;
use crate::providers::Registry;
use crate::types::{
    AttemptOutcome, ChangeSnapshot, EngineResult, ErrorKind, GenerationTarget, Meta,
};
use crate::validate::validate_candidate;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Last failed attempt, carried across loop iterations in place of
/// scattered mutable state.
struct LastFailure {
    kind: ErrorKind,
    violations: Vec<String>,
    reason: Option<String>,
}

fn base_meta(target: &GenerationTarget, run_id: Uuid) -> Meta {
    let mut meta = Meta::new();
    meta.insert("provider".to_string(), target.provider.clone().into());
    meta.insert("model".to_string(), target.model.clone().into());
    meta.insert("strategy".to_string(), target.strategy.clone().into());
    meta.insert("run_id".to_string(), run_id.to_string().into());
    meta
}

/// Run one target with retries. Performs at most `max_retries + 1`
/// backend invocations, then reports the last-seen failure.
#[allow(clippy::too_many_arguments)]
pub async fn run_target(
    registry: &Registry,
    prompts: &PromptLibrary,
    snapshot: &ChangeSnapshot,
    target: &GenerationTarget,
    intent: Option<&str>,
    bounds: &ConstraintBounds,
    max_retries: u32,
    attempt_timeout: Duration,
) -> EngineResult {
    let started = Instant::now();
    let run_id = Uuid::new_v4();
    let mut last: Option<LastFailure> = None;

    for attempt in 0..=max_retries {
        // Feedback from the previous failure is an extensibility point;
        // the current flow passes None.
        let outcome = generate_candidate(
            registry,
            prompts,
            snapshot,
            target,
            intent,
            bounds,
            None,
            attempt_timeout,
        )
        .await;

        last = Some(match outcome {
            AttemptOutcome::Generated(mut candidate) => {
                let validation = validate_candidate(&candidate, bounds);
                candidate.word_count = Some(validation.word_count);
                if validation.violations.is_empty() {
                    return EngineResult {
                        commit: Some(candidate),
                        violations: Vec::new(),
                        retries: attempt,
                        latency_ms: started.elapsed().as_millis() as u64,
                        error: None,
                        meta: base_meta(target, run_id),
                    };
                }
                LastFailure {
                    kind: ErrorKind::ValidationFailed,
                    violations: validation.violations,
                    reason: None,
                }
            }
            AttemptOutcome::Failed { kind, reason } => LastFailure {
                kind,
                violations: Vec::new(),
                reason,
            },
        });
    }

    // The loop always runs at least once, so Unknown is unreachable in
    // normal operation.
    let last = last.unwrap_or(LastFailure {
        kind: ErrorKind::Unknown,
        violations: Vec::new(),
        reason: None,
    });

    let mut meta = base_meta(target, run_id);
    if let Some(reason) = &last.reason {
        meta.insert("reason".to_string(), reason.clone().into());
    }

    EngineResult {
        commit: None,
        violations: last.violations,
        retries: max_retries,
        latency_ms: started.elapsed().as_millis() as u64,
        error: Some(last.kind.as_str().to_string()),
        meta,
    }
}

/// Check whether a primary failure is a missing-credential provider
/// error that should surface as a configuration defect instead of being
/// masked by the fallback target.
fn missing_credential(registry: &Registry, provider_name: &str, result: &EngineResult) -> Option<&'static str> {
    if result.error.as_deref() != Some(ErrorKind::ProviderError.as_str()) {
        return None;
    }
    let hint = registry.get(provider_name)?.credential_hint()?;
    let reason = result.meta.get("reason")?.as_str()?;
    reason.contains(hint).then_some(hint)
}

/// Run the primary target, falling back to the configured fallback
/// target when the primary is exhausted. The one exception is a missing
/// backend credential: that is a configuration defect and is returned
/// immediately with an unambiguous error message.
pub async fn run_once(
    registry: &Registry,
    prompts: &PromptLibrary,
    snapshot: &ChangeSnapshot,
    config: &ProdConfig,
    intent: Option<&str>,
    debug: bool,
) -> EngineResult {
    let primary_target = config.primary_target();
    let mut primary = run_target(
        registry,
        prompts,
        snapshot,
        &primary_target,
        intent,
        &config.constraints,
        config.max_retries,
        config.attempt_timeout(),
    )
    .await;
    primary
        .meta
        .insert("timeout_seconds".to_string(), config.timeout_seconds.into());
    primary.meta.insert("fallback_used".to_string(), false.into());

    if primary.commit.is_some() {
        return primary;
    }

    debug_log(
        debug,
        "primary_failed",
        serde_json::json!({ "error": primary.error, "meta": primary.meta }),
    );

    if let Some(hint) = missing_credential(registry, &config.provider, &primary) {
        primary.error = Some(format!("{hint} is not set."));
        return primary;
    }

    let mut fallback = run_target(
        registry,
        prompts,
        snapshot,
        &config.fallback,
        intent,
        &config.constraints,
        config.max_retries,
        config.attempt_timeout(),
    )
    .await;
    fallback
        .meta
        .insert("timeout_seconds".to_string(), config.timeout_seconds.into());
    fallback.meta.insert("fallback_used".to_string(), true.into());
    if let Some(error) = &primary.error {
        fallback
            .meta
            .insert("primary_error".to_string(), error.clone().into());
    }
    fallback
        .meta
        .insert("primary_retries".to_string(), primary.retries.into());

    fallback
}
