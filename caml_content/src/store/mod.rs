//! Entity store - every entity of a corpus, keyed by id and grouped by type.

mod loader;

pub use loader::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::entities::{Entity, EntityId, EntityType};
use crate::error::{ContentError, Result};

/// How the store treats a second entity with an id it already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later entity replaces the earlier one. Unparsable files are skipped.
    #[default]
    LastWins,
    /// Duplicate ids and unparsable files are load errors.
    Reject,
}

/// The loaded corpus.
///
/// Populated once per run and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: HashMap<EntityId, Entity>,

    /// Index: type -> ids in load order.
    by_type: HashMap<EntityType, Vec<EntityId>>,

    /// All ids in load order.
    order: Vec<EntityId>,

    policy: DuplicatePolicy,
}

impl EntityStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Load every entity found under `roots`, in order, with last-wins
    /// duplicate handling.
    pub fn load<P: AsRef<Path>>(roots: &[P]) -> Result<Self> {
        Self::load_with_policy(roots, DuplicatePolicy::LastWins)
    }

    /// Load every entity found under `roots`, in order.
    ///
    /// Documents without both `id` and `type` are not entities and are
    /// skipped.
    pub fn load_with_policy<P: AsRef<Path>>(roots: &[P], policy: DuplicatePolicy) -> Result<Self> {
        let mut store = Self::with_policy(policy);

        for root in roots {
            let root = root.as_ref();
            let mut skipped = 0usize;

            for file in scan_root(root)? {
                let value = match file.parsed {
                    Ok(value) => value,
                    Err(message) => {
                        if policy == DuplicatePolicy::Reject {
                            return Err(ContentError::Parse {
                                path: file.path,
                                message,
                            });
                        }
                        tracing::warn!(path = %file.path.display(), %message, "skipping unparsable document");
                        skipped += 1;
                        continue;
                    }
                };

                match Entity::from_document(value) {
                    Some(entity) => {
                        store.insert(entity.with_source(&file.path))?;
                    }
                    None => {
                        tracing::debug!(path = %file.path.display(), "not an entity, skipping");
                        skipped += 1;
                    }
                }
            }

            tracing::info!(
                root = %root.display(),
                entities = store.len(),
                skipped,
                "loaded content root"
            );
        }

        Ok(store)
    }

    /// Add an entity to the store.
    ///
    /// Returns the entity it replaced, if any. Under [`DuplicatePolicy::Reject`]
    /// a duplicate id is an error instead. A replaced id keeps its original
    /// load position.
    pub fn insert(&mut self, entity: Entity) -> Result<Option<Entity>> {
        let id = entity.id.clone();

        let Some(previous) = self.entities.get(&id) else {
            self.by_type
                .entry(entity.entity_type.clone())
                .or_default()
                .push(id.clone());
            self.order.push(id.clone());
            self.entities.insert(id, entity);
            return Ok(None);
        };

        if self.policy == DuplicatePolicy::Reject {
            return Err(ContentError::DuplicateId {
                id: id.to_string(),
                first: previous.origin(),
                second: entity.origin(),
            });
        }

        tracing::warn!(
            id = %id,
            shadowed = %previous.origin(),
            by = %entity.origin(),
            "duplicate entity id, last loaded wins"
        );

        if previous.entity_type != entity.entity_type {
            if let Some(ids) = self.by_type.get_mut(&previous.entity_type) {
                ids.retain(|existing| existing != &id);
            }
            self.by_type
                .entry(entity.entity_type.clone())
                .or_default()
                .push(id.clone());
        }

        Ok(self.entities.insert(id, entity))
    }

    /// Get an entity by id.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Check if an entity exists.
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Ids of every entity of the given type, in load order.
    pub fn ids_of_type(&self, entity_type: &EntityType) -> &[EntityId] {
        self.by_type
            .get(entity_type)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of every Encounter, in load order.
    pub fn encounter_ids(&self) -> &[EntityId] {
        self.ids_of_type(&EntityType::Encounter)
    }

    /// Iterate over every Encounter, in load order.
    pub fn encounters(&self) -> impl Iterator<Item = &Entity> {
        self.encounter_ids()
            .iter()
            .filter_map(|id| self.entities.get(id))
    }

    /// Iterate over all entities, in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Entity count per declared type name, sorted by name.
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        self.by_type
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(entity_type, ids)| (entity_type.to_string(), ids.len()))
            .collect()
    }

    /// Get the total number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<Entity> for EntityStore {
    /// Collect entities with last-wins duplicate handling.
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut store = Self::new();
        for entity in iter {
            store.insert(entity).ok();
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_load_groups_by_type() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "encounters/a.yaml", "id: enc.a\ntype: Encounter\n");
        write(temp.path(), "encounters/b.yaml", "id: enc.b\ntype: Encounter\n");
        write(temp.path(), "items/key.yaml", "id: item.key\ntype: Item\n");
        write(temp.path(), "shared/fragment.yaml", "description: shared text\n");

        let store = EntityStore::load(&[temp.path()]).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(
            store.encounter_ids(),
            &[EntityId::new("enc.a"), EntityId::new("enc.b")]
        );
        assert_eq!(store.ids_of_type(&EntityType::Item), &[EntityId::new("item.key")]);
        assert!(store.ids_of_type(&EntityType::Quest).is_empty());
        assert_eq!(store.type_counts().get("Encounter"), Some(&2));
    }

    #[test]
    fn test_duplicate_last_wins_across_roots() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(first.path(), "a.yaml", "id: enc.a\ntype: Encounter\nname: First\n");
        write(second.path(), "a.yaml", "id: enc.a\ntype: Encounter\nname: Second\n");

        let store = EntityStore::load(&[first.path(), second.path()]).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("enc.a").unwrap().name(), Some("Second"));
        assert_eq!(store.encounter_ids().len(), 1);
    }

    #[test]
    fn test_duplicate_rejected_in_strict_mode() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(first.path(), "a.yaml", "id: enc.a\ntype: Encounter\n");
        write(second.path(), "a.yaml", "id: enc.a\ntype: Encounter\n");

        let err = EntityStore::load_with_policy(&[first.path(), second.path()], DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, ContentError::DuplicateId { ref id, .. } if id == "enc.a"));
    }

    #[test]
    fn test_unparsable_file_policy() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "bad.yaml", "id: [oops\n");
        write(temp.path(), "good.yaml", "id: item.key\ntype: Item\n");

        let store = EntityStore::load(&[temp.path()]).unwrap();
        assert_eq!(store.len(), 1);

        let err = EntityStore::load_with_policy(&[temp.path()], DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, ContentError::Parse { .. }));
    }

    #[test]
    fn test_badly_encoded_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("latin1.yaml"), b"id: npc.cafe\ntype: NPC\nname: caf\xe9\n").unwrap();
        write(temp.path(), "encounters/meet.yaml", "id: enc.meet\ntype: Encounter\n");

        let store = EntityStore::load(&[temp.path()]).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains("enc.meet"));

        let err = EntityStore::load_with_policy(&[temp.path()], DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, ContentError::Parse { .. }));
    }

    #[test]
    fn test_replacement_with_new_type_moves_index() {
        let mut store = EntityStore::new();
        store.insert(Entity::new("x.thing", EntityType::Item)).unwrap();
        let replaced = store
            .insert(Entity::new("x.thing", EntityType::Location))
            .unwrap();

        assert!(replaced.is_some());
        assert!(store.ids_of_type(&EntityType::Item).is_empty());
        assert_eq!(store.ids_of_type(&EntityType::Location).len(), 1);
        assert_eq!(store.iter().count(), 1);
    }

    #[test]
    fn test_from_iterator() {
        let store: EntityStore = vec![
            Entity::new("enc.a", EntityType::Encounter),
            Entity::new("loc.hall", EntityType::Location),
        ]
        .into_iter()
        .collect();

        assert!(store.contains("enc.a"));
        assert!(store.get("loc.hall").is_some());
        assert_eq!(store.encounters().count(), 1);
    }
}
