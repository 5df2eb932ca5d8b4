//! Errors raised by remix runs and the pack tools.

use caml_content::ContentError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RemixError>;

#[derive(Error, Debug)]
pub enum RemixError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("no Encounter entries found in sources")]
    NoEncounters,

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {}: {message}", .path.display())]
    Serialize { path: PathBuf, message: String },

    #[error("refusing to replace {}: it contains source root {}", .output.display(), .root.display())]
    OutputOverlapsSource { output: PathBuf, root: PathBuf },

    #[error("invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl RemixError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RemixError::Io {
            path: path.into(),
            source,
        }
    }
}
