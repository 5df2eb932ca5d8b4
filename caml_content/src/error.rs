//! Errors raised while loading content.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentError>;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("duplicate entity id `{id}` (first in {first}, again in {second})")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    #[error("content root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),
}
