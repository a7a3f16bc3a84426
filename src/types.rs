//! Core data model shared across the engine and the lab
//!
//! These are the values that cross module boundaries: the snapshot fed
//! into prompts, the candidate coming back from a backend, and the
//! result envelope every run produces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Auxiliary result context. A sorted map keeps serialized output stable.
pub type Meta = BTreeMap<String, serde_json::Value>;

/// Staged repository state captured once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSnapshot {
    pub diff: String,
    pub status: String,
    pub files_changed: Vec<String>,
    pub insertions: usize,
    pub deletions: usize,
}

/// One provider/model/strategy combination to generate against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTarget {
    pub provider: String,
    pub model: String,
    pub strategy: String,
}

/// Structured commit message as produced by a backend. All text fields
/// are optional; presence rules are the validator's business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitCandidate {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub scope: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

/// Failure classification for a run, in wire form via `as_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProviderError,
    InvalidJson,
    InvalidSchema,
    ValidationFailed,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ProviderError => "provider_error",
            ErrorKind::InvalidJson => "invalid_json",
            ErrorKind::InvalidSchema => "invalid_schema",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// Outcome of a single backend attempt, before validation.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Generated(CommitCandidate),
    Failed {
        kind: ErrorKind,
        reason: Option<String>,
    },
}

/// Result of checking one candidate against the constraint rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub violations: Vec<String>,
    pub word_count: usize,
}

/// Final envelope for one engine run (primary plus optional fallback).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResult {
    pub commit: Option<CommitCandidate>,
    pub violations: Vec<String>,
    pub retries: u32,
    pub latency_ms: u64,
    pub error: Option<String>,
    pub meta: Meta,
}

impl EngineResult {
    /// A run is valid when it produced a candidate with no violations.
    pub fn is_valid(&self) -> bool {
        self.commit.is_some() && self.violations.is_empty() && self.error.is_none()
    }
}

/// One line of the append-only run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogRecord {
    pub schema_version: String,
    pub timestamp_utc: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub strategy: Option<String>,
    pub valid: bool,
    pub violations: Vec<String>,
    pub retries: u32,
    pub latency_ms: u64,
    pub word_count: Option<usize>,
}
