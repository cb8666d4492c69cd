//! Deserializable representation of per-app `metadata.json` files and of the
//! category config list.
//!
//! The types mirror the on-disk JSON so loaders and emitters can work on
//! typed values instead of ad-hoc maps. Keys the site does not know about are
//! kept in `extra` and flow through to the consolidated artifact untouched.

use crate::catalog::identity::CategoryKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Required metadata keys; an entry missing any of them never reaches output.
pub const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "category",
    "description",
    "version",
    "commit",
    "owner",
    "repo",
    "path",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One catalog item as described by a `metadata.json` file.
pub struct AppEntry {
    pub name: String,
    pub category: String,
    pub description: String,
    pub version: String,
    pub commit: String,
    pub owner: String,
    pub repo: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<String>>,
    #[serde(
        rename = "screenSizes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub screen_sizes: Option<Vec<String>>,
    /// Repo-relative directory of the source file, `/`-separated.
    #[serde(rename = "filePath", default)]
    pub file_path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppEntry {
    /// Display slug used by the release artifacts: `owner/repo/name`.
    pub fn release_slug(&self) -> String {
        format!("{}/{}/{}", self.owner, self.repo, self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Externally maintained list of known categories.
pub struct CategoryConfig {
    pub categories: Vec<CategorySpec>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
/// A config item is either a bare category name or a name with a kind.
pub enum CategorySpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        supports: CategoryKind,
    },
}

impl CategorySpec {
    pub fn name(&self) -> &str {
        match self {
            CategorySpec::Name(name) => name,
            CategorySpec::Detailed { name, .. } => name,
        }
    }

    pub fn kind(&self) -> CategoryKind {
        match self {
            CategorySpec::Name(_) => CategoryKind::Plain,
            CategorySpec::Detailed { supports, .. } => supports.clone(),
        }
    }
}

// The config has been maintained both as a bare array and as an object with a
// `categories` key; accept either.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryConfigFile {
    List(Vec<CategorySpec>),
    Object {
        #[serde(default)]
        categories: Vec<CategorySpec>,
    },
}

impl From<CategoryConfigFile> for CategoryConfig {
    fn from(file: CategoryConfigFile) -> Self {
        let categories = match file {
            CategoryConfigFile::List(categories) => categories,
            CategoryConfigFile::Object { categories } => categories,
        };
        CategoryConfig { categories }
    }
}

/// Read and parse the category config from disk without further checks.
pub fn load_category_config(path: &Path) -> Result<CategoryConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: CategoryConfigFile =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(file.into())
}
