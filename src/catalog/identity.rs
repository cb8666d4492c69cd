use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// URL-safe identifier derived from a human-readable name.
///
/// Slugs only ever contain `[a-z0-9-]`, never start or end with `-`, and
/// never contain `--`. Construct them with [`slugify`].
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(pub String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Names made entirely of punctuation still need a usable file stem.
const EMPTY_SLUG: &str = "category";

/// Lowercase `value` and collapse every run of non-alphanumeric characters
/// into a single `-`.
pub fn slugify(value: &str) -> Slug {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        out.push_str(EMPTY_SLUG);
    }
    Slug(out)
}

/// Which optional support list a category's release artifact carries.
///
/// Known variants keep serialization consistent; `Other` preserves values a
/// newer config may introduce, and is treated like `Plain` by the emitter.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum CategoryKind {
    #[default]
    Plain,
    Devices,
    Screens,
    Other(String),
}

impl CategoryKind {
    pub fn as_str(&self) -> &str {
        match self {
            CategoryKind::Plain => "plain",
            CategoryKind::Devices => "devices",
            CategoryKind::Screens => "screens",
            CategoryKind::Other(value) => value.as_str(),
        }
    }

    fn from_str(value: &str) -> Self {
        match value {
            "plain" => CategoryKind::Plain,
            "devices" => CategoryKind::Devices,
            "screens" => CategoryKind::Screens,
            other => CategoryKind::Other(other.to_string()),
        }
    }

    pub fn keeps_devices(&self) -> bool {
        matches!(self, CategoryKind::Devices)
    }

    pub fn keeps_screen_sizes(&self) -> bool {
        matches!(self, CategoryKind::Screens)
    }
}

impl Serialize for CategoryKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}
