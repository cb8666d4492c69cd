//! JSON Schema loading for app metadata.
//!
//! The canonical schema ships inside the binary so validation never depends
//! on the working directory. Sites that extend the metadata contract pass
//! their own schema file with `--schema`.

use anyhow::{Context, Result, anyhow};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

const EMBEDDED_METADATA_SCHEMA: &str = include_str!("../schema/app_metadata.schema.json");

/// Compiled metadata schema plus the raw payload it came from.
pub struct MetadataSchema {
    compiled: JSONSchema,
    raw: Value,
}

impl std::fmt::Debug for MetadataSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataSchema")
            .field("title", &self.raw.get("title"))
            .finish_non_exhaustive()
    }
}

impl MetadataSchema {
    /// Compile the schema bundled with the crate.
    pub fn embedded() -> Result<Self> {
        let raw: Value = serde_json::from_str(EMBEDDED_METADATA_SCHEMA)
            .context("parsing embedded metadata schema")?;
        Self::compile(raw)
    }

    /// Compile a schema from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw: Value = serde_json::from_reader(
            File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
        )
        .with_context(|| format!("parsing schema {}", path.display()))?;
        Self::compile(raw).with_context(|| format!("compiling schema {}", path.display()))
    }

    fn compile(raw: Value) -> Result<Self> {
        // Compile errors borrow the schema value, so flatten them to text.
        let compiled = JSONSchema::compile(&raw).map_err(|err| anyhow!("invalid schema: {err}"))?;
        Ok(Self { compiled, raw })
    }

    /// Validate `value`, returning every violation as a readable message.
    pub fn violations(&self, value: &Value) -> Vec<String> {
        match self.compiled.validate(value) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| {
                    let pointer = err.instance_path.to_string();
                    if pointer.is_empty() {
                        err.to_string()
                    } else {
                        format!("{pointer}: {err}")
                    }
                })
                .collect(),
        }
    }

    pub fn raw_schema(&self) -> &Value {
        &self.raw
    }
}
