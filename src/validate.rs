//! Constraint validation for commit candidates
//!
//! Deterministic rule checks only: same candidate and bounds always yield
//! the same violation list and word count. No retries, no provider calls,
//! no orchestration state.

use crate::config::ConstraintBounds;
use crate::types::{CommitCandidate, ValidationOutcome};
use regex::Regex;
use std::sync::OnceLock;

pub const SUBJECT_MISSING: &str = "subject_missing";
pub const SUBJECT_TOO_LONG: &str = "subject_too_long";
pub const INVALID_TYPE_FORMAT: &str = "invalid_type_format";
pub const WORD_COUNT_BELOW_MIN: &str = "word_count_below_min";
pub const WORD_COUNT_ABOVE_MAX: &str = "word_count_above_max";

/// Conventional-commit subject line limit, in characters.
const SUBJECT_MAX_CHARS: usize = 72;

fn type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[a-z]+$").expect("valid type pattern"))
}

fn validate_presence(candidate: &CommitCandidate) -> Vec<String> {
    match candidate.subject.as_deref() {
        Some(subject) if !subject.is_empty() => vec![],
        _ => vec![SUBJECT_MISSING.to_string()],
    }
}

fn validate_subject_length(candidate: &CommitCandidate) -> Vec<String> {
    match candidate.subject.as_deref() {
        Some(subject) if !subject.is_empty() && subject.chars().count() > SUBJECT_MAX_CHARS => {
            vec![SUBJECT_TOO_LONG.to_string()]
        }
        _ => vec![],
    }
}

fn validate_type_format(candidate: &CommitCandidate) -> Vec<String> {
    match candidate.kind.as_deref() {
        Some(kind) if !type_pattern().is_match(kind) => vec![INVALID_TYPE_FORMAT.to_string()],
        _ => vec![],
    }
}

/// Count whitespace-delimited tokens across subject and body joined with
/// a single space. Empty or absent fields contribute nothing.
pub fn compute_word_count(candidate: &CommitCandidate) -> usize {
    let parts: Vec<&str> = [candidate.subject.as_deref(), candidate.body.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();
    parts.join(" ").split_whitespace().count()
}

fn validate_word_bounds(word_count: usize, bounds: &ConstraintBounds) -> Vec<String> {
    let mut violations = Vec::new();
    if let Some(min) = bounds.min {
        if word_count < min {
            violations.push(WORD_COUNT_BELOW_MIN.to_string());
        }
    }
    if let Some(max) = bounds.max {
        if word_count > max {
            violations.push(WORD_COUNT_ABOVE_MAX.to_string());
        }
    }
    violations
}

/// Run every check independently and report all violations; checks are
/// never short-circuited.
pub fn validate_candidate(
    candidate: &CommitCandidate,
    bounds: &ConstraintBounds,
) -> ValidationOutcome {
    let mut violations = Vec::new();
    violations.extend(validate_presence(candidate));
    violations.extend(validate_subject_length(candidate));
    violations.extend(validate_type_format(candidate));

    let word_count = compute_word_count(candidate);
    violations.extend(validate_word_bounds(word_count, bounds));

    ValidationOutcome {
        violations,
        word_count,
    }
}
