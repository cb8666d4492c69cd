//! Parsing and validation of discovered metadata files.
//!
//! Bad files are never fatal. Each rejection is logged and recorded in the
//! report so the binaries can summarize how many entries were dropped and
//! why, while every valid entry still reaches the aggregator.

use crate::catalog::AppEntry;
use crate::collector::MetadataFile;
use crate::schema_loader::MetadataSchema;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Sentinel category for entries that omit one in consolidated mode.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// When set, a missing or blank `category` is replaced with this value
    /// before validation instead of rejecting the entry.
    pub default_category: Option<String>,
}

impl LoadOptions {
    /// Every required field, including `category`, must be present.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Missing categories fall back to [`UNCATEGORIZED`].
    pub fn with_uncategorized() -> Self {
        Self {
            default_category: Some(UNCATEGORIZED.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
/// A validated entry and the repo-relative path of its metadata file.
pub struct LoadedEntry {
    pub entry: AppEntry,
    pub source: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub entries: Vec<LoadedEntry>,
    pub skipped: Vec<SkippedEntry>,
}

pub struct EntryLoader {
    schema: MetadataSchema,
    options: LoadOptions,
}

impl EntryLoader {
    /// Loader backed by the bundled metadata schema.
    pub fn new(options: LoadOptions) -> Result<Self> {
        Ok(Self::with_schema(MetadataSchema::embedded()?, options))
    }

    pub fn with_schema(schema: MetadataSchema, options: LoadOptions) -> Self {
        Self { schema, options }
    }

    /// Load every file, keeping valid entries and recording the rest.
    pub fn load_all(&self, files: &[MetadataFile]) -> LoadReport {
        let mut report = LoadReport::default();
        for file in files {
            match self.load_one(file) {
                Ok(loaded) => {
                    debug!(path = %file.relative.display(), app = %loaded.entry.name, "loaded entry");
                    report.entries.push(loaded);
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    warn!(path = %file.relative.display(), reason = %reason, "skipping metadata file");
                    report.skipped.push(SkippedEntry {
                        path: file.relative.clone(),
                        reason,
                    });
                }
            }
        }
        report
    }

    /// Read, default, validate, and type one metadata file.
    pub fn load_one(&self, file: &MetadataFile) -> Result<LoadedEntry> {
        let data = fs::read_to_string(&file.absolute)
            .with_context(|| format!("reading {}", file.absolute.display()))?;
        let mut value: Value = serde_json::from_str(&data).context("invalid JSON")?;

        if let Some(default) = &self.options.default_category {
            apply_default_category(&mut value, default);
        }

        let violations = self.schema.violations(&value);
        if !violations.is_empty() {
            bail!("failed validation: {}", violations.join("; "));
        }

        let mut entry: AppEntry =
            serde_json::from_value(value).context("unexpected metadata shape")?;
        entry.file_path = file.directory();
        Ok(LoadedEntry {
            entry,
            source: file.relative.clone(),
        })
    }
}

fn apply_default_category(value: &mut Value, default: &str) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    let needs_default = match object.get("category") {
        None | Some(Value::Null) => true,
        Some(Value::String(current)) => current.trim().is_empty(),
        // Wrong types are left for the schema to reject.
        Some(_) => false,
    };
    if needs_default {
        object.insert("category".to_string(), Value::String(default.to_string()));
    }
}
