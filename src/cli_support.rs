// Argument and logging plumbing shared by build-catalog and build-releases.
// Keeping both binaries on one option set means the same flags and env vars
// resolve the same layout no matter which artifact is being generated.

use crate::find_repo_root;
use crate::pipeline::{
    CatalogPaths, DEFAULT_APPS_DIR, DEFAULT_CATEGORIES_FILE, DEFAULT_OUTPUT_DIR,
};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Repository root (default: nearest ancestor with .git and the apps directory)
    #[arg(long, env = "CATALOG_ROOT")]
    pub root: Option<PathBuf>,

    /// Directory searched for metadata.json files, relative to the root
    #[arg(long, default_value = DEFAULT_APPS_DIR)]
    pub apps_dir: PathBuf,

    /// Directory receiving the generated JSON, relative to the root
    #[arg(long, env = "CATALOG_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Known-category list, relative to the root
    #[arg(long, env = "CATALOG_CATEGORIES", default_value = DEFAULT_CATEGORIES_FILE)]
    pub categories_file: PathBuf,

    /// Metadata schema replacing the built-in one, relative to the root
    #[arg(long, env = "CATALOG_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Do everything except writing or deleting files
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn catalog_paths(&self) -> Result<CatalogPaths> {
        let root = find_repo_root(self.root.as_deref(), &self.apps_dir)?;
        Ok(CatalogPaths {
            root,
            apps_dir: self.apps_dir.clone(),
            output_dir: self.output_dir.clone(),
            categories_file: self.categories_file.clone(),
            schema_file: self.schema.clone(),
        })
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins unless `--verbose`.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // A second init (e.g. from tests) keeps the existing subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
