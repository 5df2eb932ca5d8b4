//! Outcome steps - the effects an encounter branch applies to the world.

use caml_content::render_value;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Keys that identify a step's kind.
pub const STEP_KEYS: [&str; 6] = ["addTag", "removeTag", "set", "inc", "dec", "transfer"];

/// A single classified outcome step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    AddTag { tag: String },
    RemoveTag { tag: String },
    /// Opaque state assignment expression.
    SetFact { expr: String },
    IncFact { fact: String, by: f64 },
    DecFact { fact: String, by: f64 },
    /// Item transfer. Never treated as an item grant.
    TransferItem { spec: String },
}

impl Outcome {
    /// Parse one step object.
    ///
    /// A step must carry exactly one recognized key; zero or several is
    /// rejected rather than guessed at.
    pub fn parse_step(step: &Value) -> Result<Self, StepError> {
        let map = step.as_mapping().ok_or(StepError::NotAMapping)?;

        let present: Vec<&'static str> = STEP_KEYS
            .iter()
            .copied()
            .filter(|key| map.contains_key(*key))
            .collect();

        let key = match present.as_slice() {
            [] => return Err(StepError::NoRecognizedKey),
            [key] => *key,
            keys => {
                return Err(StepError::AmbiguousKeys(
                    keys.iter().map(|key| key.to_string()).collect(),
                ))
            }
        };

        let Some(value) = map.get(key) else {
            return Err(StepError::NoRecognizedKey);
        };
        match key {
            "addTag" => Ok(Outcome::AddTag {
                tag: tag_name(key, value)?,
            }),
            "removeTag" => Ok(Outcome::RemoveTag {
                tag: tag_name(key, value)?,
            }),
            "set" => Ok(Outcome::SetFact {
                expr: render_value(value),
            }),
            "inc" => Ok(Outcome::IncFact {
                fact: fact_name(key, value)?,
                by: step_amount(map)?,
            }),
            "dec" => Ok(Outcome::DecFact {
                fact: fact_name(key, value)?,
                by: step_amount(map)?,
            }),
            _ => Ok(Outcome::TransferItem {
                spec: render_value(value),
            }),
        }
    }

    /// The tag this step adds, if any.
    pub fn added_tag(&self) -> Option<&str> {
        match self {
            Outcome::AddTag { tag } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Get the category of this outcome.
    pub fn category(&self) -> &'static str {
        match self {
            Outcome::AddTag { .. } | Outcome::RemoveTag { .. } => "tag",
            Outcome::SetFact { .. } => "set",
            Outcome::IncFact { .. } => "inc",
            Outcome::DecFact { .. } => "dec",
            Outcome::TransferItem { .. } => "transfer",
        }
    }

    /// The outcome without its category prefix. Removed tags carry a `-`.
    pub fn label(&self) -> String {
        match self {
            Outcome::AddTag { tag } => tag.clone(),
            Outcome::RemoveTag { tag } => format!("-{}", tag),
            Outcome::SetFact { expr } => expr.clone(),
            Outcome::IncFact { fact, by } | Outcome::DecFact { fact, by } => {
                format!("{} by {}", fact, by)
            }
            Outcome::TransferItem { spec } => spec.clone(),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category(), self.label())
    }
}

/// Why a step could not be classified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("step is not a mapping")]
    NotAMapping,

    #[error("step has none of the keys {}", STEP_KEYS.join(", "))]
    NoRecognizedKey,

    #[error("step has more than one kind key: {}", .0.join(", "))]
    AmbiguousKeys(Vec<String>),

    #[error("`{key}` expects {expected}")]
    InvalidValue { key: String, expected: &'static str },
}

fn tag_name(key: &str, value: &Value) -> Result<String, StepError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| StepError::InvalidValue {
            key: key.to_string(),
            expected: "a tag name",
        })
}

fn fact_name(key: &str, value: &Value) -> Result<String, StepError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| StepError::InvalidValue {
            key: key.to_string(),
            expected: "a fact name",
        })
}

/// The optional `by` amount of an `inc`/`dec` step. Defaults to 1.
fn step_amount(map: &Mapping) -> Result<f64, StepError> {
    match map.get("by") {
        None => Ok(1.0),
        Some(value) => value.as_f64().ok_or(StepError::InvalidValue {
            key: "by".to_string(),
            expected: "a number",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<Outcome, StepError> {
        Outcome::parse_step(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_tag_steps() {
        assert_eq!(
            parse("{addTag: cleared}").unwrap(),
            Outcome::AddTag {
                tag: "cleared".to_string()
            }
        );
        assert_eq!(parse("{removeTag: lit}").unwrap().label(), "-lit");
        assert_eq!(parse("{addTag: cleared}").unwrap().added_tag(), Some("cleared"));
        assert_eq!(parse("{removeTag: lit}").unwrap().added_tag(), None);
    }

    #[test]
    fn test_fact_steps() {
        assert_eq!(
            parse("{inc: gold, by: 5}").unwrap(),
            Outcome::IncFact {
                fact: "gold".to_string(),
                by: 5.0
            }
        );
        assert_eq!(
            parse("{dec: torches}").unwrap(),
            Outcome::DecFact {
                fact: "torches".to_string(),
                by: 1.0
            }
        );
        assert_eq!(parse("{inc: gold, by: 5}").unwrap().to_string(), "inc:gold by 5");
        assert_eq!(parse("{set: 'door.open = true'}").unwrap().to_string(), "set:door.open = true");
    }

    #[test]
    fn test_transfer_step() {
        let outcome = parse("{transfer: {item: item.key, to: party}}").unwrap();
        assert_eq!(
            outcome,
            Outcome::TransferItem {
                spec: r#"{"item":"item.key","to":"party"}"#.to_string()
            }
        );
        assert_eq!(outcome.added_tag(), None);
    }

    #[test]
    fn test_rejects_unclassifiable_steps() {
        assert_eq!(parse("{note: flavour}"), Err(StepError::NoRecognizedKey));
        assert_eq!(parse("just text"), Err(StepError::NotAMapping));
        assert_eq!(
            parse("{addTag: a, set: b}"),
            Err(StepError::AmbiguousKeys(vec![
                "addTag".to_string(),
                "set".to_string()
            ]))
        );
        assert!(matches!(
            parse("{addTag: [a, b]}"),
            Err(StepError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse("{inc: gold, by: lots}"),
            Err(StepError::InvalidValue { .. })
        ));
    }
}
