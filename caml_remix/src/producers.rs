//! Producer index - reverse lookup from a tag to the encounters that add it.

use caml_content::EntityId;
use std::collections::HashMap;

use crate::gates::EncounterProfile;

/// Reverse index: tag -> producing encounters, in first-seen order.
///
/// Built once over every encounter in the corpus, not just the included ones.
/// The first producer of a tag is the one closure picks.
#[derive(Debug, Clone, Default)]
pub struct ProducerIndex {
    producers: HashMap<String, Vec<EntityId>>,
}

impl ProducerIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the `AddTag` outcomes of encounter profiles, given in load order.
    pub fn build<'p, I>(encounters: I) -> Self
    where
        I: IntoIterator<Item = (&'p EntityId, &'p EncounterProfile)>,
    {
        let mut index = Self::new();
        for (encounter, profile) in encounters {
            index.record(encounter, profile);
        }
        index
    }

    /// Record an encounter as a producer of every tag its outcomes add.
    fn record(&mut self, encounter: &EntityId, profile: &EncounterProfile) {
        for tag in profile.produced_tags() {
            let producers = self.producers.entry(tag.to_string()).or_default();
            if !producers.contains(encounter) {
                producers.push(encounter.clone());
            }
        }
    }

    /// All producers of a tag, in first-seen order.
    pub fn producers_of(&self, tag: &str) -> &[EntityId] {
        self.producers
            .get(tag)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// The producer closure should pick for a tag: the earliest indexed.
    pub fn preferred_producer(&self, tag: &str) -> Option<&EntityId> {
        self.producers_of(tag).first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caml_content::{Entity, EntityStore, EntityType};

    fn index_of(store: &EntityStore) -> ProducerIndex {
        let profiles: Vec<(EntityId, EncounterProfile)> = store
            .encounters()
            .map(|encounter| (encounter.id.clone(), EncounterProfile::of(encounter)))
            .collect();
        ProducerIndex::build(profiles.iter().map(|(id, profile)| (id, profile)))
    }

    fn encounter(id: &str, outcomes: &str) -> Entity {
        Entity::new(id, EntityType::Encounter)
            .with_field("outcomes", serde_yaml::from_str::<serde_yaml::Value>(outcomes).unwrap())
    }

    #[test]
    fn test_first_seen_producer_wins() {
        let store: EntityStore = vec![
            encounter("enc.b", "win: [{addTag: cleared}]"),
            encounter("enc.a", "win: [{addTag: cleared}, {addTag: looted}]"),
        ]
        .into_iter()
        .collect();

        let index = index_of(&store);

        assert_eq!(
            index.producers_of("cleared"),
            &[EntityId::new("enc.b"), EntityId::new("enc.a")]
        );
        assert_eq!(index.preferred_producer("cleared"), Some(&EntityId::new("enc.b")));
        assert_eq!(index.preferred_producer("looted"), Some(&EntityId::new("enc.a")));
        assert!(index.producers_of("missing").is_empty());
    }

    #[test]
    fn test_removed_tags_are_not_produced() {
        let store: EntityStore = vec![encounter("enc.a", "win: [{removeTag: cleared}]")]
            .into_iter()
            .collect();

        let index = index_of(&store);
        assert!(index.producers_of("cleared").is_empty());
    }

    #[test]
    fn test_repeated_tag_records_producer_once() {
        let store: EntityStore = vec![encounter(
            "enc.a",
            "win: [{addTag: cleared}]\nlose: [{addTag: cleared}]",
        )]
        .into_iter()
        .collect();

        let index = index_of(&store);
        assert_eq!(index.producers_of("cleared").len(), 1);
    }

    #[test]
    fn test_non_encounters_are_ignored() {
        let store: EntityStore = vec![Entity::new("loc.hall", EntityType::Location)
            .with_field("outcomes", serde_yaml::from_str::<serde_yaml::Value>("x: [{addTag: lit}]").unwrap())]
        .into_iter()
        .collect();

        assert!(index_of(&store).producers_of("lit").is_empty());
    }
}
