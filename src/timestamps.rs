//! "Last updated" timestamps derived from git.
//!
//! A [`TimestampResolver`] asks its sources in order. A source either answers,
//! reports `Unavailable` (try the next one), or reports a `Tool` failure
//! (stop and use the fallback). When nothing answers the fallback is the
//! instant the run started, so every defaulted value in one run agrees.

use crate::runtime::resolve_git_binary;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("no timestamp available for {}", .path.display())]
    Unavailable { path: PathBuf },

    #[error("git {command} failed for {}: {message}", .path.display())]
    Tool {
        command: String,
        path: PathBuf,
        message: String,
    },
}

impl TimestampError {
    pub fn unavailable(path: &Path) -> Self {
        TimestampError::Unavailable {
            path: path.to_path_buf(),
        }
    }

    fn tool(command: &str, path: &Path, message: impl Into<String>) -> Self {
        TimestampError::Tool {
            command: command.to_string(),
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Something that can say when a path last meaningfully changed.
pub trait TimestampSource {
    fn resolve(&self, path: &Path) -> Result<DateTime<Utc>, TimestampError>;
}

#[derive(Clone, Debug)]
/// A git executable bound to a working tree.
pub struct Git {
    binary: Option<PathBuf>,
    repo_root: PathBuf,
}

impl Git {
    /// Use the git found via `CATALOG_GIT` or PATH.
    pub fn discover(repo_root: &Path) -> Self {
        Self::with_binary(resolve_git_binary(), repo_root)
    }

    pub fn with_binary(binary: Option<PathBuf>, repo_root: &Path) -> Self {
        Self {
            binary,
            repo_root: repo_root.to_path_buf(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    // Runs `git <args> -- <path>` in the repo root and returns trimmed stdout.
    fn query(&self, label: &str, args: &[&str], path: &Path) -> Result<String, TimestampError> {
        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| TimestampError::tool(label, path, "git executable not found"))?;
        let output = Command::new(binary)
            .args(args)
            .arg("--")
            .arg(path)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|err| TimestampError::tool(label, path, err.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TimestampError::tool(
                label,
                path,
                format!(
                    "exit status {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Uncommitted local changes (including untracked files) mean "changed now".
pub struct DirtyWorkingTree {
    git: Git,
    now: DateTime<Utc>,
}

impl DirtyWorkingTree {
    pub fn new(git: Git, now: DateTime<Utc>) -> Self {
        Self { git, now }
    }
}

impl TimestampSource for DirtyWorkingTree {
    fn resolve(&self, path: &Path) -> Result<DateTime<Utc>, TimestampError> {
        let status = self.git.query("status", &["status", "--porcelain"], path)?;
        if status.is_empty() {
            Err(TimestampError::unavailable(path))
        } else {
            debug!(path = %path.display(), "uncommitted changes; using current time");
            Ok(self.now)
        }
    }
}

/// Committer date of the newest commit touching the path, following renames.
pub struct CommitHistory {
    git: Git,
}

impl CommitHistory {
    pub fn new(git: Git) -> Self {
        Self { git }
    }
}

impl TimestampSource for CommitHistory {
    fn resolve(&self, path: &Path) -> Result<DateTime<Utc>, TimestampError> {
        let stdout = self
            .git
            .query("log", &["log", "-1", "--follow", "--format=%cI"], path)?;
        let Some(line) = stdout.lines().next().filter(|line| !line.is_empty()) else {
            return Err(TimestampError::unavailable(path));
        };
        DateTime::parse_from_rfc3339(line)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|err| {
                TimestampError::tool("log", path, format!("unparsable date {line:?}: {err}"))
            })
    }
}

/// Ordered fallback chain over timestamp sources.
pub struct TimestampResolver {
    sources: Vec<Box<dyn TimestampSource>>,
    fallback: DateTime<Utc>,
}

impl TimestampResolver {
    pub fn new(sources: Vec<Box<dyn TimestampSource>>, fallback: DateTime<Utc>) -> Self {
        Self { sources, fallback }
    }

    /// Dirty check, then commit history, then `now`.
    pub fn git(repo_root: &Path, now: DateTime<Utc>) -> Self {
        let git = Git::discover(repo_root);
        if !git.is_available() {
            warn!("git executable not found; every timestamp will fall back to the run time");
        }
        Self::new(
            vec![
                Box::new(DirtyWorkingTree::new(git.clone(), now)),
                Box::new(CommitHistory::new(git)),
            ],
            now,
        )
    }

    pub fn fallback(&self) -> DateTime<Utc> {
        self.fallback
    }

    /// Never fails: tool errors and missing history both yield the fallback.
    pub fn resolve(&self, path: &Path) -> DateTime<Utc> {
        for source in &self.sources {
            match source.resolve(path) {
                Ok(ts) => return ts,
                Err(TimestampError::Unavailable { .. }) => continue,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "timestamp lookup failed; using current time");
                    return self.fallback;
                }
            }
        }
        debug!(path = %path.display(), "no history; using current time");
        self.fallback
    }
}
