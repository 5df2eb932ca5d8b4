//! Closure state - the sets one closure run grows to a fixed point.

use caml_content::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Why an entity ended up in the pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum InclusionReason {
    /// Picked as a remix target.
    Target,

    /// Produces a tag an included encounter requires.
    #[serde(rename_all = "camelCase")]
    Producer { tag: String, for_encounter: EntityId },

    /// The `occursAt` location of an included encounter.
    #[serde(rename_all = "camelCase")]
    Location { for_encounter: EntityId },

    /// Listed in the `participants` of an included encounter.
    #[serde(rename_all = "camelCase")]
    Participant { for_encounter: EntityId },

    /// An item the party starts with.
    StartingItem,
}

/// An entity and the first reason it was included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    pub id: EntityId,
    #[serde(flatten)]
    pub reason: InclusionReason,
}

/// Mutable state of one closure run.
///
/// Every set only grows. Owned by a single engine call and discarded once the
/// result has been taken.
#[derive(Debug, Clone, Default)]
pub struct ClosureState {
    pub included: BTreeSet<EntityId>,
    pub starting_tags: BTreeSet<String>,
    pub starting_items: BTreeSet<String>,
    inclusions: Vec<Inclusion>,
}

impl ClosureState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include an entity. Returns `true` if it was not already included.
    pub fn include(&mut self, id: EntityId, reason: InclusionReason) -> bool {
        if !self.included.insert(id.clone()) {
            return false;
        }
        self.inclusions.push(Inclusion { id, reason });
        true
    }

    /// Seed a starting tag. Returns `true` if it was new.
    pub fn seed_tag(&mut self, tag: &str) -> bool {
        if self.starting_tags.contains(tag) {
            return false;
        }
        tracing::debug!(tag, "seeding starting tag");
        self.starting_tags.insert(tag.to_string())
    }

    /// Seed a starting item. Returns `true` if it was new.
    pub fn seed_item(&mut self, item: &str) -> bool {
        if self.starting_items.contains(item) {
            return false;
        }
        tracing::debug!(item, "seeding starting item");
        self.starting_items.insert(item.to_string())
    }

    pub fn is_included(&self, id: &str) -> bool {
        self.included.contains(id)
    }

    /// Finish the run.
    pub fn into_result(self, iterations: usize) -> ClosureResult {
        ClosureResult {
            included: self.included,
            starting_tags: self.starting_tags,
            starting_items: self.starting_items,
            inclusions: self.inclusions,
            iterations,
        }
    }
}

/// The outcome of a closure run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureResult {
    pub included: BTreeSet<EntityId>,
    pub starting_tags: BTreeSet<String>,
    pub starting_items: BTreeSet<String>,
    /// Inclusion provenance, in the order entities were included.
    pub inclusions: Vec<Inclusion>,
    /// Fixed-point iterations run before the sets stopped changing.
    pub iterations: usize,
}

impl ClosureResult {
    /// Why an entity was included, if it was.
    pub fn reason_for(&self, id: &str) -> Option<&InclusionReason> {
        self.inclusions
            .iter()
            .find(|inclusion| inclusion.id.as_str() == id)
            .map(|inclusion| &inclusion.reason)
    }

    pub fn is_included(&self, id: &str) -> bool {
        self.included.contains(id)
    }
}
