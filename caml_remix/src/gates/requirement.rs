//! Requirement tokens - what a gate expression asks of the world.

use caml_content::render_value;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

static ITEM_REQUIREMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"party\.has\(\s*(item\.[a-zA-Z0-9_.-]+)\s*\)").expect("valid item pattern")
});

static BARE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.:-]+$").expect("valid tag pattern"));

/// A single normalized gate expression.
///
/// Only `Tag` and `Item` take part in closure. `Fact` and `Expr` are carried
/// for visibility and never resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Requirement {
    /// A world-state flag that must be set.
    Tag { name: String },

    /// An item the party must hold (`party.has(item.x)`).
    Item { item: String },

    /// A structured `fact`/`op`/`value` comparison.
    Fact {
        fact: String,
        op: String,
        value: String,
    },

    /// Any other expression, kept verbatim.
    Expr { raw: String },
}

impl Requirement {
    /// Create a tag requirement.
    pub fn tag(name: impl Into<String>) -> Self {
        Requirement::Tag { name: name.into() }
    }

    /// Create an item requirement.
    pub fn item(item: impl Into<String>) -> Self {
        Requirement::Item { item: item.into() }
    }

    /// Create an opaque expression requirement.
    pub fn expr(raw: impl Into<String>) -> Self {
        Requirement::Expr { raw: raw.into() }
    }

    /// Classify one raw gate expression.
    pub fn classify(expr: &Value) -> Self {
        match expr {
            Value::String(text) => Self::classify_text(text),
            Value::Mapping(map) => {
                match (map.get("fact"), map.get("op"), map.get("value")) {
                    (Some(fact), Some(op), Some(value)) => Requirement::Fact {
                        fact: render_value(fact),
                        op: render_value(op),
                        value: render_value(value),
                    },
                    _ => Requirement::expr(render_value(expr)),
                }
            }
            other => Requirement::expr(render_value(other)),
        }
    }

    fn classify_text(text: &str) -> Self {
        if let Some(captures) = ITEM_REQUIREMENT.captures(text) {
            return Requirement::item(&captures[1]);
        }
        let trimmed = text.trim();
        if BARE_TAG.is_match(trimmed) {
            return Requirement::tag(trimmed);
        }
        Requirement::expr(trimmed)
    }

    /// Whether closure must satisfy this requirement.
    pub fn is_resolvable(&self) -> bool {
        matches!(self, Requirement::Tag { .. } | Requirement::Item { .. })
    }

    /// Get the category of this requirement.
    pub fn category(&self) -> &'static str {
        match self {
            Requirement::Tag { .. } => "tag",
            Requirement::Item { .. } => "item",
            Requirement::Fact { .. } => "fact",
            Requirement::Expr { .. } => "expr",
        }
    }

    /// The requirement without its category prefix.
    pub fn label(&self) -> String {
        match self {
            Requirement::Tag { name } => name.clone(),
            Requirement::Item { item } => item.clone(),
            Requirement::Fact { fact, op, value } => format!("{} {} {}", fact, op, value),
            Requirement::Expr { raw } => raw.clone(),
        }
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category(), self.label())
    }
}
