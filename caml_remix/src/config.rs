//! Remix configuration.
//!
//! A remix can be described in a TOML file:
//!
//! ```toml
//! roots = ["adventures/minimal", "adventures/dungeon"]
//! out = "remix-output"
//! seed = 123
//! pick = 2
//! format = "yaml"
//! duplicates = "last-wins"
//! ```
//!
//! Every key is optional in the file; command-line flags override it.

use caml_content::{DocumentFormat, DuplicatePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RemixError, Result};

pub const DEFAULT_PICK: usize = 3;
pub const DEFAULT_OUTPUT: &str = "remix-output";

/// Everything one remix run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemixConfig {
    /// Content roots, loaded in order.
    pub roots: Vec<PathBuf>,

    /// Output pack directory. Replaced on every run.
    pub out: PathBuf,

    /// Seed for target selection.
    pub seed: u64,

    /// How many encounters to target.
    pub pick: usize,

    pub format: DocumentFormat,

    pub duplicates: DuplicatePolicy,
}

impl Default for RemixConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            out: PathBuf::from(DEFAULT_OUTPUT),
            seed: 0,
            pick: DEFAULT_PICK,
            format: DocumentFormat::Yaml,
            duplicates: DuplicatePolicy::LastWins,
        }
    }
}

impl RemixConfig {
    /// Create a config for the given roots and output with defaults elsewhere.
    pub fn new(roots: Vec<PathBuf>, out: impl Into<PathBuf>) -> Self {
        Self {
            roots,
            out: out.into(),
            ..Self::default()
        }
    }

    /// Load a config file.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| RemixError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let mut config: RemixConfig = toml::from_str(&content).map_err(|err| RemixError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        if let Some(base) = path.parent() {
            config.roots = config.roots.iter().map(|root| base.join(root)).collect();
            config.out = base.join(&config.out);
        }
        Ok(config)
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of targets.
    pub fn with_pick(mut self, pick: usize) -> Self {
        self.pick = pick;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the duplicate id policy.
    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }
}
