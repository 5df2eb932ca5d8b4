//! Content discovery: walks content roots and parses structured-data files.

use serde_yaml::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::entities::DocumentFormat;
use crate::error::{ContentError, Result};

/// One structured-data file found under a content root.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the content root it was found under.
    pub relative: PathBuf,
    pub format: DocumentFormat,
    /// The parsed document, or the parser's message.
    pub parsed: std::result::Result<Value, String>,
}

/// Find every structured-data file under `root`, sorted by path.
///
/// Sorting keeps load order (and so duplicate precedence and producer
/// tie-breaks) stable across platforms.
pub fn discover_documents(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(ContentError::RootNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| ContentError::Io {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if DocumentFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }

    tracing::debug!(root = %root.display(), files = files.len(), "discovered content files");
    Ok(files)
}

/// Read and parse every structured-data file under `root`.
///
/// Read failures are errors. Parse and encoding failures are reported per
/// file so callers can decide whether a broken document is fatal.
pub fn scan_root(root: &Path) -> Result<Vec<ScannedFile>> {
    let mut scanned = Vec::new();
    for path in discover_documents(root)? {
        let Some(format) = DocumentFormat::from_path(&path) else {
            continue;
        };
        let bytes = std::fs::read(&path).map_err(|err| ContentError::Io {
            path: path.clone(),
            source: err,
        })?;
        let parsed = String::from_utf8(bytes)
            .map_err(|err| format!("not valid UTF-8: {}", err.utf8_error()))
            .and_then(|contents| format.parse(&contents));
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        scanned.push(ScannedFile {
            parsed,
            path,
            relative,
            format,
        });
    }
    Ok(scanned)
}
