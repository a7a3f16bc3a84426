//! Git operations for snapshotting staged changes
//!
//! Reads the staged diff and index status the engine summarizes. Only
//! index state counts; unstaged worktree edits are ignored.

use crate::types::ChangeSnapshot;
use anyhow::{Context, Result};
use git2::{DiffFormat, Repository, Status};
use std::path::Path;

fn status_code(status: Status) -> Option<char> {
    if status.is_index_new() {
        Some('A')
    } else if status.is_index_modified() {
        Some('M')
    } else if status.is_index_deleted() {
        Some('D')
    } else if status.is_index_renamed() {
        Some('R')
    } else if status.is_index_typechange() {
        Some('T')
    } else {
        None
    }
}

/// Capture the staged changes of a repository as a snapshot.
///
/// On an unborn HEAD (fresh repository with no commits) the diff is
/// taken against an empty tree, so newly staged files still show up.
pub fn read_snapshot(repo_path: &Path) -> Result<ChangeSnapshot> {
    let repo = Repository::open(repo_path)
        .with_context(|| format!("Failed to open repository at {}", repo_path.display()))?;

    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree().context("Failed to resolve HEAD tree")?),
        Err(_) => None,
    };

    let index = repo.index().context("Failed to read index")?;
    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)
        .context("Failed to diff HEAD against index")?;

    let mut diff_text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => diff_text.push(line.origin()),
            _ => {}
        }
        diff_text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .context("Failed to render staged diff")?;

    let stats = diff.stats().context("Failed to compute diff stats")?;

    let mut status_lines = Vec::new();
    let mut files_changed = Vec::new();
    for entry in repo.statuses(None).context("Failed to read statuses")?.iter() {
        let Some(code) = status_code(entry.status()) else {
            continue;
        };
        let path = entry.path().unwrap_or("").to_string();
        status_lines.push(format!("{code}  {path}"));
        files_changed.push(path);
    }

    Ok(ChangeSnapshot {
        diff: diff_text,
        status: status_lines.join("\n"),
        files_changed,
        insertions: stats.insertions(),
        deletions: stats.deletions(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("tester", "tester@local").unwrap();
        let parent = repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn staged_modification_appears_in_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("lib.rs"), "fn main() {}\n").unwrap();
        commit_all(&repo, "initial");

        fs::write(dir.path().join("lib.rs"), "fn main() { run(); }\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("lib.rs")).unwrap();
        index.write().unwrap();

        let snapshot = read_snapshot(dir.path()).unwrap();
        assert!(snapshot.diff.contains("+fn main() { run(); }"));
        assert!(snapshot.status.contains("M  lib.rs"));
        assert_eq!(snapshot.files_changed, vec!["lib.rs"]);
        assert_eq!(snapshot.insertions, 1);
        assert_eq!(snapshot.deletions, 1);
    }

    #[test]
    fn unborn_head_diffs_against_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("new.txt"), "hello\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("new.txt")).unwrap();
        index.write().unwrap();

        let snapshot = read_snapshot(dir.path()).unwrap();
        assert!(snapshot.diff.contains("+hello"));
        assert!(snapshot.status.contains("A  new.txt"));
        assert_eq!(snapshot.insertions, 1);
        assert_eq!(snapshot.deletions, 0);
    }

    #[test]
    fn clean_index_yields_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        commit_all(&repo, "initial");

        let snapshot = read_snapshot(dir.path()).unwrap();
        assert!(snapshot.diff.is_empty());
        assert!(snapshot.files_changed.is_empty());
        assert_eq!(snapshot.insertions, 0);
    }
}
