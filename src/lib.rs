//! Shared library for the app catalog generators.
//!
//! The crate turns a tree of per-app `metadata.json` files into the JSON
//! artifacts the catalog site serves. The binaries (`build-catalog`,
//! `build-releases`) are thin wrappers over [`pipeline`]; everything they
//! need is public here so tests can drive the same code paths with a scripted
//! timestamp source instead of git.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod catalog;
pub mod cli_support;
pub mod collector;
pub mod emit_support;
pub mod loader;
pub mod pipeline;
pub mod runtime;
pub mod schema_loader;
pub mod timestamps;

pub use catalog::{
    AppEntry, CatalogApp, CategoryConfig, CategoryGroup, CategoryIndex, CategoryKind,
    CategoryRegistry, CategorySpec, Slug, locale_cmp, slugify,
};
pub use collector::{MetadataFile, collect_metadata_files};
pub use loader::{EntryLoader, LoadOptions, LoadReport, LoadedEntry, SkippedEntry, UNCATEGORIZED};
pub use pipeline::{
    CatalogPaths, CategoryTimestamps, ReleaseOptions, build_consolidated, build_releases,
};
pub use timestamps::{TimestampError, TimestampResolver, TimestampSource};

const VCS_SENTINEL: &str = ".git";

/// Returns true when `candidate` looks like the catalog repository root.
fn is_repo_root(candidate: &Path, apps_dir: &Path) -> bool {
    candidate.join(VCS_SENTINEL).exists() && candidate.join(apps_dir).is_dir()
}

fn search_upwards(start: &Path, apps_dir: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_repo_root(&dir, apps_dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the repository root.
///
/// An explicit root (from `--root` or `CATALOG_ROOT`) must be a directory.
/// Otherwise climb from the current directory to the first ancestor holding
/// both `.git` and the apps directory, falling back to the current directory.
pub fn find_repo_root(explicit: Option<&Path>, apps_dir: &Path) -> Result<PathBuf> {
    if let Some(root) = explicit {
        if !root.is_dir() {
            bail!("catalog root {} is not a directory", root.display());
        }
        return Ok(fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf()));
    }

    let cwd = env::current_dir()?;
    if apps_dir.is_relative() {
        if let Some(root) = search_upwards(&cwd, apps_dir) {
            return Ok(root);
        }
    }
    Ok(cwd)
}
