//! Prompt template loading and prompt composition
//!
//! Templates live at `<dir>/<strategy>.txt`. Composition is deterministic:
//! identical snapshot, intent, and bounds always produce identical prompt
//! text, so retries and experiments are reproducible.

use crate::config::ConstraintBounds;
use crate::types::ChangeSnapshot;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

/// Marker used when no intent was supplied by the caller.
const NO_INTENT_MARKER: &str = "none";

/// Loads prompt templates by strategy name from a directory.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the template for a strategy, trying `<strategy>.txt` and a
    /// hyphen-to-underscore variant.
    pub fn load(&self, strategy: &str) -> Result<String> {
        let candidates = [
            self.dir.join(format!("{strategy}.txt")),
            self.dir.join(format!("{}.txt", strategy.replace('-', "_"))),
        ];
        for path in &candidates {
            if path.exists() {
                return fs::read_to_string(path)
                    .with_context(|| format!("Failed to read template {}", path.display()));
            }
        }
        bail!("Prompt strategy file not found for: {strategy}");
    }
}

/// Compose the full provider prompt from template, snapshot, intent, and
/// constraint bounds (serialized with sorted keys).
pub fn build_prompt(
    template: &str,
    snapshot: &ChangeSnapshot,
    intent: Option<&str>,
    bounds: &ConstraintBounds,
) -> String {
    format!(
        "{template}\n\nIntent: {intent}\nConstraints: {constraints}\nStatus:\n{status}\n\nDiff:\n{diff}\n",
        intent = intent.unwrap_or(NO_INTENT_MARKER),
        constraints = bounds.to_sorted_json(),
        status = snapshot.status,
        diff = snapshot.diff,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn snapshot() -> ChangeSnapshot {
        ChangeSnapshot {
            diff: "+added line".to_string(),
            status: "M  src/lib.rs".to_string(),
            files_changed: vec!["src/lib.rs".to_string()],
            insertions: 1,
            deletions: 0,
        }
    }

    #[test]
    fn loads_template_by_strategy_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("zero-shot.txt")).unwrap();
        write!(file, "Write a commit message.").unwrap();

        let library = PromptLibrary::new(dir.path());
        assert_eq!(library.load("zero-shot").unwrap(), "Write a commit message.");
    }

    #[test]
    fn falls_back_to_underscore_filename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("few_shot.txt"), "examples...").unwrap();

        let library = PromptLibrary::new(dir.path());
        assert_eq!(library.load("few-shot").unwrap(), "examples...");
    }

    #[test]
    fn missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let library = PromptLibrary::new(dir.path());
        let err = library.load("structured").unwrap_err();
        assert!(err.to_string().contains("structured"));
    }

    #[test]
    fn prompt_is_deterministic_and_carries_all_sections() {
        let bounds = ConstraintBounds {
            min: Some(3),
            max: Some(50),
        };
        let prompt = build_prompt("TEMPLATE", &snapshot(), Some("tighten wording"), &bounds);
        assert!(prompt.starts_with("TEMPLATE\n\n"));
        assert!(prompt.contains("Intent: tighten wording\n"));
        assert!(prompt.contains(r#"Constraints: {"max":50,"min":3}"#));
        assert!(prompt.contains("Status:\nM  src/lib.rs"));
        assert!(prompt.contains("Diff:\n+added line"));

        let again = build_prompt("TEMPLATE", &snapshot(), Some("tighten wording"), &bounds);
        assert_eq!(prompt, again);
    }

    #[test]
    fn absent_intent_uses_explicit_marker() {
        let prompt = build_prompt("T", &snapshot(), None, &ConstraintBounds::default());
        assert!(prompt.contains("Intent: none\n"));
    }
}
