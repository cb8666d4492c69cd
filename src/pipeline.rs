//! The two batch jobs: consolidated catalog and per-category releases.
//!
//! Both run collect → load → aggregate → timestamps → emit exactly once.
//! Only the primary artifact (the consolidated catalog, or the categories
//! index) can fail a run; per-category files and pruning log and move on.

use crate::catalog::{CategoryIndex, CategoryRegistry};
use crate::collector::collect_metadata_files;
use crate::emit_support::{
    CatalogDocument, CategoriesIndexDocument, PruneReport, ReleaseDocument, prune_stale_releases,
    write_json_atomic,
};
use crate::loader::{EntryLoader, LoadOptions, SkippedEntry};
use crate::schema_loader::MetadataSchema;
use crate::timestamps::TimestampResolver;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const DEFAULT_APPS_DIR: &str = "apps";
pub const DEFAULT_OUTPUT_DIR: &str = "public/data";
pub const DEFAULT_CATEGORIES_FILE: &str = "config/categories.json";
pub const CATALOG_FILE_NAME: &str = "catalog.json";
pub const CATEGORIES_INDEX_FILE_NAME: &str = "categories.json";
pub const RELEASES_DIR_NAME: &str = "categories";

#[derive(Clone, Debug)]
/// Inputs and outputs of a run. Relative paths resolve against `root`.
pub struct CatalogPaths {
    pub root: PathBuf,
    pub apps_dir: PathBuf,
    pub output_dir: PathBuf,
    pub categories_file: PathBuf,
    /// Replacement for the embedded metadata schema.
    pub schema_file: Option<PathBuf>,
}

impl CatalogPaths {
    /// Default layout under `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            apps_dir: PathBuf::from(DEFAULT_APPS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            categories_file: PathBuf::from(DEFAULT_CATEGORIES_FILE),
            schema_file: None,
        }
    }

    fn under_root(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.under_root(&self.output_dir)
    }

    pub fn categories_path(&self) -> PathBuf {
        self.under_root(&self.categories_file)
    }

    pub fn schema_path(&self) -> Option<PathBuf> {
        self.schema_file.as_deref().map(|path| self.under_root(path))
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.output_path().join(CATALOG_FILE_NAME)
    }

    pub fn categories_index_file(&self) -> PathBuf {
        self.output_path().join(CATEGORIES_INDEX_FILE_NAME)
    }

    pub fn releases_dir(&self) -> PathBuf {
        self.output_path().join(RELEASES_DIR_NAME)
    }

    /// Path as git sees it from the repository root.
    pub fn repo_relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
/// Where a category's `lastUpdated` comes from in per-category mode.
pub enum CategoryTimestamps {
    /// Newest member metadata file.
    #[default]
    Members,
    /// The category's own release file after it is written.
    ReleaseFile,
}

struct Collected {
    index: CategoryIndex,
    registry: CategoryRegistry,
    skipped: Vec<SkippedEntry>,
}

fn collect_catalog(paths: &CatalogPaths, options: LoadOptions) -> Result<Collected> {
    let registry = load_registry(&paths.categories_path());
    let files = collect_metadata_files(&paths.root, &paths.apps_dir);
    info!(files = files.len(), "collected metadata files");

    let loader = match paths.schema_path() {
        Some(path) => {
            info!(schema = %path.display(), "validating against external schema");
            EntryLoader::with_schema(MetadataSchema::load(&path)?, options)
        }
        None => EntryLoader::new(options)?,
    };
    let report = loader.load_all(&files);
    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "some metadata files were skipped");
    }

    let index = CategoryIndex::build(report.entries);
    if !registry.is_empty() {
        for name in registry.unknown(index.names()) {
            warn!(category = %name, "category not listed in category config");
        }
    }
    Ok(Collected {
        index,
        registry,
        skipped: report.skipped,
    })
}

// The config only adds context, so a broken file degrades to an empty one.
fn load_registry(path: &Path) -> CategoryRegistry {
    match CategoryRegistry::load(path) {
        Ok(registry) => registry,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "ignoring unreadable category config");
            CategoryRegistry::default()
        }
    }
}

#[derive(Debug)]
pub struct ConsolidatedSummary {
    pub output: PathBuf,
    pub categories: usize,
    pub apps: usize,
    pub skipped: Vec<SkippedEntry>,
}

/// Build and write `catalog.json`. A write failure is returned as an error.
pub fn build_consolidated(
    paths: &CatalogPaths,
    resolver: &TimestampResolver,
    generated_at: DateTime<Utc>,
    dry_run: bool,
) -> Result<ConsolidatedSummary> {
    let Collected {
        mut index, skipped, ..
    } = collect_catalog(paths, LoadOptions::with_uncategorized())?;
    index.attach_timestamps(resolver);

    let document = CatalogDocument::build(&index, generated_at)?;
    let output = paths.catalog_file();
    if dry_run {
        info!(path = %output.display(), "dry run; not writing catalog");
    } else {
        write_json_atomic(&output, &document)
            .with_context(|| format!("writing catalog {}", output.display()))?;
        info!(path = %output.display(), "wrote catalog");
    }

    Ok(ConsolidatedSummary {
        output,
        categories: index.len(),
        apps: index.total_apps(),
        skipped,
    })
}

#[derive(Clone, Copy, Debug)]
pub struct ReleaseOptions {
    pub prune: bool,
    pub dry_run: bool,
    pub category_timestamps: CategoryTimestamps,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            prune: true,
            dry_run: false,
            category_timestamps: CategoryTimestamps::Members,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct ReleaseSummary {
    pub index_file: PathBuf,
    pub written: Vec<PathBuf>,
    pub failed: Vec<ReleaseFailure>,
    pub pruned: PruneReport,
    pub categories: usize,
    pub apps: usize,
    pub skipped: Vec<SkippedEntry>,
}

/// Write one file per category, the categories index, and prune leftovers.
pub fn build_releases(
    paths: &CatalogPaths,
    resolver: &TimestampResolver,
    options: ReleaseOptions,
) -> Result<ReleaseSummary> {
    let Collected {
        mut index,
        registry,
        skipped,
    } = collect_catalog(paths, LoadOptions::strict())?;
    index.attach_timestamps(resolver);

    let releases_dir = paths.releases_dir();
    let mut written = Vec::new();
    let mut failed = Vec::new();
    for group in index.groups_mut() {
        let target = releases_dir.join(format!("{}.json", group.slug));
        let kind = registry.kind_of(&group.name);
        let outcome = ReleaseDocument::build(group, &kind).and_then(|document| {
            if options.dry_run {
                Ok(())
            } else {
                write_json_atomic(&target, &document)
            }
        });
        match outcome {
            Ok(()) => {
                if options.category_timestamps == CategoryTimestamps::ReleaseFile
                    && !options.dry_run
                {
                    group.last_updated = Some(resolver.resolve(&paths.repo_relative(&target)));
                }
                written.push(target);
            }
            Err(err) => {
                let reason = format!("{err:#}");
                error!(path = %target.display(), reason = %reason, "failed to write release file");
                failed.push(ReleaseFailure {
                    path: target,
                    reason,
                });
            }
        }
    }

    let index_file = paths.categories_index_file();
    let index_document = CategoriesIndexDocument::build(&index);
    if options.dry_run {
        info!(path = %index_file.display(), "dry run; not writing categories index");
    } else {
        write_json_atomic(&index_file, &index_document)
            .with_context(|| format!("writing categories index {}", index_file.display()))?;
    }

    let pruned = if options.prune {
        prune_stale_releases(&releases_dir, &index.slugs(), options.dry_run)
    } else {
        PruneReport::default()
    };
    for path in &pruned.removed {
        info!(path = %path.display(), dry_run = options.dry_run, "pruned stale release file");
    }

    Ok(ReleaseSummary {
        index_file,
        written,
        failed,
        pruned,
        categories: index.len(),
        apps: index.total_apps(),
        skipped,
    })
}
