//! Closure Engine - grows a target set of encounters into a self-consistent pack.
//!
//! The algorithm works as follows:
//! 1. **Seed**: The targets are included
//! 2. **Fixed point**: Until no set changes:
//!    a. Available tags = starting tags + tags added by included encounters
//!    b. Every item an included encounter requires becomes a starting item
//!    c. Every required tag that is not available pulls in its preferred
//!       producer, or becomes a starting tag when nothing produces it
//! 3. **Structure**: Locations and participants of included encounters are
//!    included, once, without examining their own requirements
//! 4. **Items**: Starting items that exist in the corpus are included
//!
//! Tag availability is optimistic: `removeTag` outcomes never retract a tag.
//! Facts and opaque expressions are never resolved and never block closure.

mod state;

pub use state::*;

use caml_content::{EntityId, EntityStore, EntityType};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::gates::EncounterProfile;
use crate::producers::ProducerIndex;

/// Closure over one loaded corpus.
///
/// Extracts every encounter's profile and the producer index up front; runs
/// themselves never touch the raw documents again.
pub struct ClosureEngine<'a> {
    store: &'a EntityStore,
    profiles: HashMap<EntityId, EncounterProfile>,
    producers: ProducerIndex,
}

impl<'a> ClosureEngine<'a> {
    /// Create an engine over a loaded store.
    pub fn new(store: &'a EntityStore) -> Self {
        // Load order matters: the producer index breaks ties by first seen.
        let extracted: Vec<(EntityId, EncounterProfile)> = store
            .encounters()
            .map(|encounter| (encounter.id.clone(), EncounterProfile::of(encounter)))
            .collect();
        let producers = ProducerIndex::build(extracted.iter().map(|(id, profile)| (id, profile)));

        Self {
            store,
            profiles: extracted.into_iter().collect(),
            producers,
        }
    }

    /// Get the extracted profile of an encounter.
    pub fn profile(&self, id: &str) -> Option<&EncounterProfile> {
        self.profiles.get(id)
    }

    /// Pick `pick` distinct encounters at random (all of them if fewer exist).
    pub fn select_targets<R: Rng + ?Sized>(&self, pick: usize, rng: &mut R) -> BTreeSet<EntityId> {
        let encounters = self.store.encounter_ids();
        encounters
            .choose_multiple(rng, pick.min(encounters.len()))
            .cloned()
            .collect()
    }

    /// Run closure from a set of targets.
    ///
    /// Targets that are not in the corpus are ignored. Non-encounter targets
    /// are included but carry no requirements.
    pub fn run<I>(&self, targets: I) -> ClosureResult
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut state = ClosureState::new();

        // Step 1: Seed with targets
        for target in targets {
            if !self.store.contains(target.as_str()) {
                tracing::warn!(id = %target, "target not found in corpus, ignoring");
                continue;
            }
            state.include(target, InclusionReason::Target);
        }

        // Step 2: Grow to a fixed point
        let mut iterations = 0;
        loop {
            iterations += 1;
            if !self.grow(&mut state) {
                break;
            }
        }

        // Step 3: Structural references
        self.include_structure(&mut state);

        // Step 4: Items the party starts with
        self.include_starting_items(&mut state);

        tracing::info!(
            included = state.included.len(),
            starting_tags = state.starting_tags.len(),
            starting_items = state.starting_items.len(),
            iterations,
            "closure reached fixed point"
        );

        state.into_result(iterations)
    }

    /// Tags that are available given the current state.
    fn available_tags(&self, state: &ClosureState) -> HashSet<String> {
        let mut available: HashSet<String> = state.starting_tags.iter().cloned().collect();
        for id in &state.included {
            if let Some(profile) = self.profiles.get(id) {
                available.extend(profile.produced_tags().map(str::to_string));
            }
        }
        available
    }

    /// One fixed-point iteration. Returns `true` if any set changed.
    fn grow(&self, state: &mut ClosureState) -> bool {
        let available = self.available_tags(state);
        let mut changed = false;

        let snapshot: Vec<EntityId> = state.included.iter().cloned().collect();
        for id in snapshot {
            let Some(profile) = self.profiles.get(&id) else {
                continue;
            };

            // Items are always satisfied by seeding; transfers are not grants.
            for item in profile.required_items() {
                changed |= state.seed_item(item);
            }

            for tag in profile.required_tags() {
                if available.contains(tag) {
                    continue;
                }
                match self.producers.preferred_producer(tag) {
                    Some(producer) => {
                        changed |= state.include(
                            producer.clone(),
                            InclusionReason::Producer {
                                tag: tag.to_string(),
                                for_encounter: id.clone(),
                            },
                        );
                    }
                    None => {
                        changed |= state.seed_tag(tag);
                    }
                }
            }
        }

        changed
    }

    /// Include `occursAt` locations and non-encounter participants of included
    /// encounters.
    fn include_structure(&self, state: &mut ClosureState) {
        let encounters: Vec<EntityId> = state
            .included
            .iter()
            .filter(|id| self.profiles.contains_key(*id))
            .cloned()
            .collect();

        for id in encounters {
            let Some(encounter) = self.store.get(id.as_str()) else {
                continue;
            };

            if let Some(location) = encounter.occurs_at() {
                let is_location = self
                    .store
                    .get(location)
                    .is_some_and(|entity| entity.entity_type == EntityType::Location);
                if is_location {
                    state.include(
                        EntityId::new(location),
                        InclusionReason::Location {
                            for_encounter: id.clone(),
                        },
                    );
                }
            }

            // Encounters pulled in here would never be closed over.
            for participant in encounter.participants() {
                let is_closed_kind = self
                    .store
                    .get(participant)
                    .is_some_and(|entity| !entity.is_encounter());
                if is_closed_kind {
                    state.include(
                        EntityId::new(participant),
                        InclusionReason::Participant {
                            for_encounter: id.clone(),
                        },
                    );
                }
            }
        }
    }

    /// Include every starting item the corpus defines.
    fn include_starting_items(&self, state: &mut ClosureState) {
        let items: Vec<String> = state
            .starting_items
            .iter()
            .filter(|item| self.store.contains(item.as_str()))
            .cloned()
            .collect();

        for item in items {
            state.include(EntityId::new(item), InclusionReason::StartingItem);
        }
    }
}
