//! Machine-readable run logging
//!
//! Appends one JSON object per completed attempt sequence to a JSONL
//! file with a fixed, versioned schema. Logging is side-effect-only and
//! never drives control flow.

use crate::types::{EngineResult, RunLogRecord};
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const RUN_LOG_SCHEMA_VERSION: &str = "1.0";
pub const DEFAULT_RUN_LOG_PATH: &str = "eval/runs.jsonl";

/// Emit a structured debug line to stderr when enabled.
pub fn debug_log(enabled: bool, event: &str, payload: serde_json::Value) {
    if !enabled {
        return;
    }
    let record = serde_json::json!({ "event": event, "payload": payload });
    eprintln!("{record}");
}

/// Append-only JSONL sink for engine results.
///
/// Appends are serialized through an internal lock so concurrent batch
/// cells never interleave partial records.
#[derive(Debug)]
pub struct RunLogger {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new(DEFAULT_RUN_LOG_PATH)
    }
}

impl RunLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Project one result into the stable schema and append it.
    pub fn log_run(&self, result: &EngineResult) -> Result<()> {
        let record = self.to_record(result);
        let line = serde_json::to_string(&record).context("Failed to serialize run record")?;
        self.append_line(&line)
    }

    fn to_record(&self, result: &EngineResult) -> RunLogRecord {
        let meta_str = |key: &str| {
            result
                .meta
                .get(key)
                .and_then(|value| value.as_str())
                .map(str::to_string)
        };
        RunLogRecord {
            schema_version: RUN_LOG_SCHEMA_VERSION.to_string(),
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
            provider: meta_str("provider"),
            model: meta_str("model"),
            strategy: meta_str("strategy"),
            valid: result.is_valid(),
            violations: result.violations.clone(),
            retries: result.retries,
            latency_ms: result.latency_ms,
            word_count: result.commit.as_ref().and_then(|commit| commit.word_count),
        }
    }

    fn append_line(&self, line: &str) -> Result<()> {
        let _guard = self.append_lock.lock().expect("run log lock poisoned");
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open run log {}", self.path.display()))?;
        writeln!(file, "{line}")
            .with_context(|| format!("Failed to append to {}", self.path.display()))
    }
}
