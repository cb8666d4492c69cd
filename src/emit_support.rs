//! Shaping and writing of the JSON release artifacts.
//!
//! Documents are built from typed aggregates, serialized pretty-printed with a
//! trailing newline, and written through a temp file in the destination
//! directory so readers never observe a half-written artifact.

use crate::catalog::{CatalogApp, CategoryGroup, CategoryIndex, CategoryKind, Slug, slugify};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Internal bookkeeping fields the per-category artifacts never expose.
pub const RELEASE_STRIPPED_FIELDS: &[&str] =
    &["commit", "owner", "repo", "path", "filePath", "category"];

const DEVICES_FIELD: &str = "devices";
const SCREEN_SIZES_FIELD: &str = "screenSizes";

/// RFC 3339, UTC, millisecond precision, `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Default, Clone)]
/// Ordered list of edits applied to a JSON object: merges, sets, removals.
pub struct JsonObjectBuilder {
    sources: Vec<JsonValueSource>,
}

impl JsonObjectBuilder {
    pub fn merge_value(&mut self, value: Value, label: &str) -> Result<&mut Self> {
        match value {
            Value::Object(map) => {
                self.sources.push(JsonValueSource::MergeObject(map));
                Ok(self)
            }
            _ => bail!("{label} must be a JSON object"),
        }
    }

    pub fn insert_string(&mut self, key: &str, value: String) -> &mut Self {
        self.insert_value(key, Value::String(value))
    }

    pub fn insert_value(&mut self, key: &str, value: Value) -> &mut Self {
        self.sources.push(JsonValueSource::SetField {
            key: key.to_string(),
            value,
        });
        self
    }

    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.sources
            .push(JsonValueSource::RemoveField(key.to_string()));
        self
    }

    pub fn build(&self) -> Value {
        let mut map: Map<String, Value> = Map::new();
        for source in &self.sources {
            match source {
                JsonValueSource::MergeObject(obj) => {
                    for (key, value) in obj {
                        map.insert(key.clone(), value.clone());
                    }
                }
                JsonValueSource::SetField { key, value } => {
                    map.insert(key.clone(), value.clone());
                }
                JsonValueSource::RemoveField(key) => {
                    map.remove(key);
                }
            }
        }
        Value::Object(map)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[derive(Clone)]
enum JsonValueSource {
    MergeObject(Map<String, Value>),
    SetField { key: String, value: Value },
    RemoveField(String),
}

fn entry_object(app: &CatalogApp) -> Result<JsonObjectBuilder> {
    let value = serde_json::to_value(&app.entry)
        .with_context(|| format!("serializing {}", app.source.display()))?;
    let mut builder = JsonObjectBuilder::default();
    builder.merge_value(value, "app entry")?;
    Ok(builder)
}

/// Full entry plus a slug of the app name and its resolved timestamp.
pub fn catalog_app(app: &CatalogApp) -> Result<Value> {
    let mut builder = entry_object(app)?;
    builder.insert_string("slug", slugify(&app.entry.name).0);
    builder.insert_value("lastUpdated", optional_timestamp(app.last_updated));
    Ok(builder.build())
}

/// Entry with internal fields removed and an `owner/repo/name` slug added.
///
/// Only categories of the matching kind keep `devices` / `screenSizes`.
pub fn release_app(app: &CatalogApp, kind: &CategoryKind) -> Result<Value> {
    let mut builder = entry_object(app)?;
    for field in RELEASE_STRIPPED_FIELDS {
        builder.remove(field);
    }
    if !kind.keeps_devices() {
        builder.remove(DEVICES_FIELD);
    }
    if !kind.keeps_screen_sizes() {
        builder.remove(SCREEN_SIZES_FIELD);
    }
    builder.insert_string("slug", app.entry.release_slug());
    Ok(builder.build())
}

fn optional_timestamp(ts: Option<DateTime<Utc>>) -> Value {
    ts.map(|ts| Value::String(format_timestamp(ts)))
        .unwrap_or(Value::Null)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
/// Consolidated artifact: every category and every app in one document.
pub struct CatalogDocument {
    pub generated_at: String,
    pub total_apps: usize,
    pub total_categories: usize,
    pub categories: Vec<CatalogCategory>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCategory {
    pub name: String,
    pub slug: Slug,
    pub count: usize,
    pub last_updated: Option<String>,
    pub apps: Vec<Value>,
}

impl CatalogDocument {
    pub fn build(index: &CategoryIndex, generated_at: DateTime<Utc>) -> Result<Self> {
        let categories = index
            .groups()
            .iter()
            .map(|group| -> Result<CatalogCategory> {
                Ok(CatalogCategory {
                    name: group.name.clone(),
                    slug: group.slug.clone(),
                    count: group.count(),
                    last_updated: group.last_updated.map(format_timestamp),
                    apps: group.apps.iter().map(catalog_app).collect::<Result<_>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            generated_at: format_timestamp(generated_at),
            total_apps: index.total_apps(),
            total_categories: index.len(),
            categories,
        })
    }
}

#[derive(Debug, Serialize)]
/// Per-category artifact.
pub struct ReleaseDocument {
    pub category: String,
    pub slug: Slug,
    pub count: usize,
    pub apps: Vec<Value>,
}

impl ReleaseDocument {
    pub fn build(group: &CategoryGroup, kind: &CategoryKind) -> Result<Self> {
        Ok(Self {
            category: group.name.clone(),
            slug: group.slug.clone(),
            count: group.count(),
            apps: group
                .apps
                .iter()
                .map(|app| release_app(app, kind))
                .collect::<Result<_>>()?,
        })
    }
}

#[derive(Debug, Serialize)]
/// Top-level list of categories for the per-category mode.
pub struct CategoriesIndexDocument {
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub slug: Slug,
    pub count: usize,
    pub last_updated: Option<String>,
}

impl CategoriesIndexDocument {
    pub fn build(index: &CategoryIndex) -> Self {
        Self {
            categories: index
                .groups()
                .iter()
                .map(|group| CategorySummary {
                    name: group.name.clone(),
                    slug: group.slug.clone(),
                    count: group.count(),
                    last_updated: group.last_updated.map(format_timestamp),
                })
                .collect(),
        }
    }
}

/// Pretty JSON with a trailing newline, exactly as written to disk.
pub fn render_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value).context("serializing JSON")?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write `value` to `path` via a sibling temp file and an atomic rename.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = render_json(value)?;
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("creating directory {}", parent.display()))?;
    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temp file in {}", parent.display()))?;
    temp.write_all(&bytes)
        .with_context(|| format!("writing temp file for {}", path.display()))?;
    temp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    Ok(())
}

#[derive(Debug, Default)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Delete `<stem>.json` files in `dir` whose stem is not a current slug.
///
/// A missing directory prunes nothing. Individual deletion failures are
/// logged and reported, never fatal.
pub fn prune_stale_releases(dir: &Path, keep: &BTreeSet<Slug>, dry_run: bool) -> PruneReport {
    let mut report = PruneReport::default();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %dir.display(), error = %err, "release directory unreadable; nothing to prune");
            return report;
        }
    };

    let mut stale = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !keep.contains(&Slug(stem.to_string())) {
            stale.push(path);
        }
    }
    stale.sort();

    for path in stale {
        if dry_run {
            report.removed.push(path);
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => report.removed.push(path),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to remove stale release file");
                report.failed.push((path, err.to_string()));
            }
        }
    }
    report
}
