//! Structural validation of a content root.
//!
//! Every document is checked and every problem reported; validation never
//! stops at the first issue.

use caml_content::{render_value, scan_root};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::catalog::CATALOG_FILE_NAME;
use crate::error::Result;
use crate::gates::extract_outcomes;
use crate::graph::GRAPH_FILE_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A document that is not an entity. Still fails validation.
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Path relative to the validated root.
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity,
            self.path.display(),
            self.message
        )
    }
}

/// Result of validating one root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub root: PathBuf,
    pub files: usize,
    pub entities: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether validation passed. Any issue, warnings included, fails it.
    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }

    fn push(&mut self, severity: Severity, path: &Path, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity,
            path: path.to_path_buf(),
            message: message.into(),
        });
    }
}

/// Validate every document under `root`.
pub fn validate(root: &Path) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        root: root.to_path_buf(),
        ..ValidationReport::default()
    };
    let mut first_seen: HashMap<String, PathBuf> = HashMap::new();

    for file in scan_root(root)? {
        let path = file.relative;
        if is_generated(&path) {
            continue;
        }
        report.files += 1;

        let value = match file.parsed {
            Ok(value) => value,
            Err(message) => {
                report.push(Severity::Error, &path, format!("unparsable: {}", message));
                continue;
            }
        };
        let Value::Mapping(document) = value else {
            continue;
        };

        let (Some(id), Some(entity_type)) = (document.get("id"), document.get("type")) else {
            report.push(Severity::Warning, &path, "missing id/type");
            continue;
        };
        let (Some(id), Some(_)) = (id.as_str(), entity_type.as_str()) else {
            report.push(Severity::Error, &path, "id and type must be strings");
            continue;
        };
        report.entities += 1;

        if let Some(first) = first_seen.get(id) {
            report.push(
                Severity::Error,
                &path,
                format!("duplicate id `{}` (first defined in {})", id, first.display()),
            );
        } else {
            first_seen.insert(id.to_string(), path.clone());
        }

        for message in gate_problems(&document) {
            report.push(Severity::Error, &path, message);
        }
        for message in outcome_problems(&document) {
            report.push(Severity::Error, &path, message);
        }
    }

    tracing::info!(
        root = %root.display(),
        files = report.files,
        issues = report.issues.len(),
        "validated content root"
    );
    Ok(report)
}

// Catalog and graph output written into the root by `caml index`/`caml graph`.
fn is_generated(path: &Path) -> bool {
    path == Path::new(CATALOG_FILE_NAME) || path == Path::new(GRAPH_FILE_NAME)
}

fn gate_problems(document: &Mapping) -> Vec<String> {
    let gates = match document.get("gates") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Mapping(gates)) => gates,
        Some(_) => return vec!["`gates` must be a mapping".to_string()],
    };

    ["all", "any"]
        .into_iter()
        .filter(|key| {
            gates
                .get(*key)
                .is_some_and(|branch| !branch.is_null() && !branch.is_sequence())
        })
        .map(|key| format!("`gates.{}` must be a list", key))
        .collect()
}

fn outcome_problems(document: &Mapping) -> Vec<String> {
    let outcomes = match document.get("outcomes") {
        None | Some(Value::Null) => return Vec::new(),
        Some(outcomes @ Value::Mapping(_)) => outcomes,
        Some(_) => return vec!["`outcomes` must be a mapping".to_string()],
    };

    let mut problems = Vec::new();
    if let Some(branches) = outcomes.as_mapping() {
        for (branch, steps) in branches {
            if !steps.is_sequence() {
                problems.push(format!("`outcomes.{}` must be a list", render_value(branch)));
            }
        }
    }
    problems.extend(
        extract_outcomes(outcomes)
            .rejected
            .iter()
            .map(ToString::to_string),
    );
    problems
}
