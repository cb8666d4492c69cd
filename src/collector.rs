//! Discovery of per-app `metadata.json` files.
//!
//! The walk never fails: a missing apps directory or an unreadable subtree is
//! logged and treated as empty so one bad checkout path cannot sink the run.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const METADATA_FILE_NAME: &str = "metadata.json";

#[derive(Clone, Debug, PartialEq, Eq)]
/// A discovered metadata file, addressable from disk and from the repo root.
pub struct MetadataFile {
    pub absolute: PathBuf,
    /// Path relative to the repository root; equal to `absolute` when the
    /// file lives outside the root.
    pub relative: PathBuf,
}

impl MetadataFile {
    /// Repo-relative directory holding the file, always `/`-separated.
    pub fn directory(&self) -> String {
        let parent = self.relative.parent().unwrap_or_else(|| Path::new(""));
        to_forward_slashes(parent)
    }
}

/// Recursively collect every file named exactly `metadata.json` under
/// `apps_dir` (relative paths are resolved against `repo_root`).
pub fn collect_metadata_files(repo_root: &Path, apps_dir: &Path) -> Vec<MetadataFile> {
    let start = if apps_dir.is_absolute() {
        apps_dir.to_path_buf()
    } else {
        repo_root.join(apps_dir)
    };
    if !start.is_dir() {
        warn!(
            path = %start.display(),
            "apps directory missing or not a directory; treating as empty"
        );
        return Vec::new();
    }

    let mut files = Vec::new();
    for item in WalkDir::new(&start).sort_by_file_name() {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let location = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| start.display().to_string());
                warn!(path = %location, error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != METADATA_FILE_NAME {
            continue;
        }
        let absolute = entry.into_path();
        let relative = absolute
            .strip_prefix(repo_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| absolute.clone());
        debug!(path = %relative.display(), "found metadata file");
        files.push(MetadataFile { absolute, relative });
    }
    files
}

/// Render a path with `/` separators regardless of platform.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
