//! Catalog - a flat index of every entity under one content root.

use caml_content::{scan_root, Entity};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{RemixError, Result};

pub const CATALOG_FILE_NAME: &str = "index.json";

/// Flat catalog of a content root, grouped by type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub root: String,
    pub count: usize,
    /// Entity count per declared type.
    pub by_type: BTreeMap<String, usize>,
    /// Every entity document, with its root-relative `_path` added.
    pub entries: Vec<Mapping>,
}

impl Catalog {
    /// Catalog every entity document under `root`, in path order.
    ///
    /// Each document is listed, including ones whose id repeats.
    pub fn build(root: &Path) -> Result<Self> {
        let mut catalog = Self {
            root: root.display().to_string(),
            count: 0,
            by_type: BTreeMap::new(),
            entries: Vec::new(),
        };

        for file in scan_root(root)? {
            let value = match file.parsed {
                Ok(value) => value,
                Err(message) => {
                    tracing::warn!(path = %file.path.display(), %message, "skipping unparsable document");
                    continue;
                }
            };
            let Some(entity) = Entity::from_document(value) else {
                continue;
            };

            *catalog
                .by_type
                .entry(entity.entity_type.to_string())
                .or_default() += 1;

            let mut entry = entity.document().clone();
            entry.insert(
                Value::from("_path"),
                Value::from(file.relative.to_string_lossy().replace('\\', "/")),
            );
            catalog.entries.push(entry);
        }

        catalog.count = catalog.entries.len();
        Ok(catalog)
    }

    /// Write the catalog as `index.json` at the root.
    pub fn write(&self, root: &Path) -> Result<PathBuf> {
        let path = root.join(CATALOG_FILE_NAME);
        let text = serde_json::to_string_pretty(self).map_err(|err| RemixError::Serialize {
            path: path.clone(),
            message: err.to_string(),
        })?;
        std::fs::write(&path, text).map_err(|err| RemixError::io(&path, err))?;
        tracing::info!(path = %path.display(), entries = self.count, "catalog written");
        Ok(path)
    }
}
