//! Holds the configured category list for lookup by name.
//!
//! The registry is context, not a filter: categories found in metadata but
//! absent here are still emitted, the caller only logs them.

use crate::catalog::identity::CategoryKind;
use crate::catalog::model::{CategoryConfig, load_category_config};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Default)]
/// In-memory store of configured categories keyed by display name.
pub struct CategoryRegistry {
    categories: BTreeMap<String, CategoryKind>,
}

impl CategoryRegistry {
    /// Build a registry from an already parsed config.
    pub fn from_config(config: &CategoryConfig) -> Self {
        let mut registry = Self::default();
        for spec in &config.categories {
            registry.register(spec.name(), spec.kind());
        }
        registry
    }

    /// Load the config file once; a missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            warn!(
                path = %path.display(),
                "category config not found; continuing without category context"
            );
            return Ok(Self::default());
        }
        let config = load_category_config(path)?;
        let registry = Self::from_config(&config);
        debug!(
            path = %path.display(),
            categories = registry.len(),
            "loaded category config"
        );
        Ok(registry)
    }

    /// Register a category; later registrations of the same name win.
    pub fn register(&mut self, name: &str, kind: CategoryKind) {
        let name = name.trim();
        if name.is_empty() {
            warn!("ignoring blank category name in config");
            return;
        }
        if self.categories.insert(name.to_string(), kind).is_some() {
            warn!(category = name, "category listed more than once in config");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Kind for a category; unknown categories are plain.
    pub fn kind_of(&self, name: &str) -> CategoryKind {
        self.categories.get(name).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Names seen in the data but not listed in the config, in stable order.
    pub fn unknown<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = names
            .into_iter()
            .filter(|name| !self.contains(name))
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}
