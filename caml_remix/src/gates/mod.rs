//! Gate and outcome extraction.
//!
//! Normalizes an encounter's raw `gates` and `outcomes` structures:
//! - **Gates** are flattened across `all`, `any` and `not` into one set of
//!   [`Requirement`]s. Boolean structure is deliberately dropped: every
//!   expression is treated as something that must be possible.
//! - **Outcomes** are parsed branch by branch into [`Outcome`]s. Steps that
//!   cannot be classified are set aside as [`RejectedStep`]s.

mod outcome;
mod requirement;

pub use outcome::*;
pub use requirement::*;

use caml_content::{render_value, Entity};
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeSet;

/// Flatten the `all`, `any` and `not` branches of a gate structure.
///
/// Non-mapping gates and non-list `all`/`any` branches contribute nothing.
/// `not` may hold a single expression or a list of them.
pub fn gate_expressions(gates: &Value) -> Vec<&Value> {
    let Some(map) = gates.as_mapping() else {
        return Vec::new();
    };

    let mut exprs = Vec::new();
    for key in ["all", "any"] {
        if let Some(items) = map.get(key).and_then(Value::as_sequence) {
            exprs.extend(items.iter());
        }
    }
    match map.get("not") {
        None | Some(Value::Null) => {}
        Some(Value::Sequence(items)) => exprs.extend(items.iter()),
        Some(expr) => exprs.push(expr),
    }
    exprs
}

/// Extract the requirement set of a gate structure.
pub fn extract_requirements(gates: &Value) -> BTreeSet<Requirement> {
    gate_expressions(gates)
        .into_iter()
        .map(Requirement::classify)
        .collect()
}

/// A step that could not be classified, with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedStep {
    pub branch: String,
    pub index: usize,
    pub error: StepError,
}

impl std::fmt::Display for RejectedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "outcome `{}` step {}: {}", self.branch, self.index, self.error)
    }
}

/// Classified outcome steps of every branch, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeSet {
    pub outcomes: Vec<Outcome>,
    pub rejected: Vec<RejectedStep>,
}

/// Extract the outcome steps of an `outcomes` structure.
///
/// Non-mapping outcomes and non-list branches contribute nothing.
pub fn extract_outcomes(outcomes: &Value) -> OutcomeSet {
    let mut set = OutcomeSet::default();
    let Some(branches) = outcomes.as_mapping() else {
        return set;
    };

    for (branch, steps) in branches {
        let Some(steps) = steps.as_sequence() else {
            continue;
        };
        for (index, step) in steps.iter().enumerate() {
            match Outcome::parse_step(step) {
                Ok(outcome) => set.outcomes.push(outcome),
                Err(error) => set.rejected.push(RejectedStep {
                    branch: render_value(branch),
                    index,
                    error,
                }),
            }
        }
    }
    set
}

/// Everything closure needs to know about one encounter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncounterProfile {
    pub requirements: BTreeSet<Requirement>,
    pub outcomes: Vec<Outcome>,
    #[serde(skip)]
    pub rejected: Vec<RejectedStep>,
}

impl EncounterProfile {
    /// Extract the profile of an entity's gates and outcomes.
    pub fn of(entity: &Entity) -> Self {
        let requirements = entity
            .gates()
            .map(extract_requirements)
            .unwrap_or_default();
        let OutcomeSet { outcomes, rejected } = entity
            .outcomes()
            .map(extract_outcomes)
            .unwrap_or_default();

        for step in &rejected {
            tracing::debug!(encounter = %entity.id, %step, "dropping unclassifiable outcome step");
        }

        Self {
            requirements,
            outcomes,
            rejected,
        }
    }

    /// Tags the gates require.
    pub fn required_tags(&self) -> impl Iterator<Item = &str> {
        self.requirements.iter().filter_map(|req| match req {
            Requirement::Tag { name } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Items the gates require the party to hold.
    pub fn required_items(&self) -> impl Iterator<Item = &str> {
        self.requirements.iter().filter_map(|req| match req {
            Requirement::Item { item } => Some(item.as_str()),
            _ => None,
        })
    }

    /// Tags any outcome branch adds.
    pub fn produced_tags(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(Outcome::added_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caml_content::EntityType;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_flattens_all_any_not() {
        let gates = yaml(
            r#"
all: [cleared, "party.has(item.key)"]
any: [{fact: gold, op: ">", value: 3}, "torch_lit or moonlit"]
not: fled
"#,
        );

        let reqs = extract_requirements(&gates);
        assert_eq!(reqs.len(), 5);
        assert!(reqs.contains(&Requirement::tag("cleared")));
        assert!(reqs.contains(&Requirement::item("item.key")));
        // Negation is not modeled; `fled` must merely be possible.
        assert!(reqs.contains(&Requirement::tag("fled")));
        assert!(reqs.contains(&Requirement::expr("torch_lit or moonlit")));
    }

    #[test]
    fn test_malformed_gates_are_empty() {
        assert!(extract_requirements(&yaml("just-a-string")).is_empty());
        assert!(extract_requirements(&yaml("all: cleared")).is_empty());
        assert!(extract_requirements(&yaml("not: null")).is_empty());
        assert_eq!(extract_requirements(&yaml("not: [a, b]")).len(), 2);
    }

    #[test]
    fn test_extract_outcomes_keeps_order_and_rejects() {
        let outcomes = yaml(
            r#"
success:
  - addTag: cleared
  - inc: xp
    by: 50
  - note: "flavour only"
failure:
  - removeTag: lit
  - transfer: {item: item.key, to: npc.guard}
retreat: not-a-list
"#,
        );

        let set = extract_outcomes(&outcomes);
        assert_eq!(set.outcomes.len(), 4);
        assert_eq!(set.outcomes[0].to_string(), "tag:cleared");
        assert_eq!(set.outcomes[2].to_string(), "tag:-lit");
        assert_eq!(set.rejected.len(), 1);
        assert_eq!(set.rejected[0].branch, "success");
        assert_eq!(set.rejected[0].index, 2);
        assert_eq!(set.rejected[0].error, StepError::NoRecognizedKey);
    }

    #[test]
    fn test_encounter_profile() {
        let entity = Entity::new("enc.vault", EntityType::Encounter)
            .with_field("gates", yaml("all: [alarm_off, 'party.has(item.key)']"))
            .with_field("outcomes", yaml("win: [{addTag: vault_open}, {removeTag: alarm_off}]"));

        let profile = EncounterProfile::of(&entity);
        assert_eq!(profile.required_tags().collect::<Vec<_>>(), vec!["alarm_off"]);
        assert_eq!(profile.required_items().collect::<Vec<_>>(), vec!["item.key"]);
        assert_eq!(profile.produced_tags().collect::<Vec<_>>(), vec!["vault_open"]);
    }

    #[test]
    fn test_profile_without_gates_or_outcomes() {
        let profile = EncounterProfile::of(&Entity::new("enc.empty", EntityType::Encounter));
        assert!(profile.requirements.is_empty());
        assert!(profile.outcomes.is_empty());
    }
}
