//! Pack Emitter - writes a closed remix out as a content pack.
//!
//! Layout:
//! - `module.<ext>`: the synthesized `AdventureModule` descriptor
//! - `locations/`, `npcs/`, `items/`, `encounters/`, `rules/`: always created
//! - `quests/`, `factions/`, `handouts/`: created when populated
//!
//! Each entity is written to `<folder>/<id without namespace>.<ext>`.

use caml_content::{DocumentFormat, EntityId, EntityStore, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::closure::ClosureResult;
use crate::error::{RemixError, Result};

/// Folders every pack has, populated or not.
pub const BASE_FOLDERS: [&str; 5] = ["locations", "npcs", "items", "encounters", "rules"];

const REMIX_DESCRIPTION: &str = "Procedurally remixed CAML adventure pack. Gates were made \
satisfiable via starting tags/items and prerequisite encounters.";

/// The pack folder an entity type is written to. Unrouted types are skipped.
pub fn folder_for(entity_type: &EntityType) -> Option<&'static str> {
    match entity_type {
        EntityType::Location => Some("locations"),
        EntityType::Npc | EntityType::Pc => Some("npcs"),
        EntityType::Item => Some("items"),
        EntityType::Encounter => Some("encounters"),
        EntityType::StateFact => Some("rules"),
        EntityType::Quest => Some("quests"),
        EntityType::Faction => Some("factions"),
        EntityType::Handout => Some("handouts"),
        EntityType::AdventureModule | EntityType::Other(_) => None,
    }
}

/// The synthesized `AdventureModule` entity describing a remix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub starting_tags: Vec<String>,
    pub starting_items: Vec<String>,
}

impl ModuleDescriptor {
    /// Describe the result of a remix run with the given seed.
    pub fn for_remix(seed: u64, result: &ClosureResult) -> Self {
        Self {
            id: format!("module.remix_{}", seed),
            entity_type: EntityType::AdventureModule,
            name: format!("Remix Pack (seed {})", seed),
            description: REMIX_DESCRIPTION.to_string(),
            tags: vec!["remix".to_string(), "generated".to_string()],
            // BTreeSet iteration is already sorted.
            starting_tags: result.starting_tags.iter().cloned().collect(),
            starting_items: result.starting_items.iter().cloned().collect(),
        }
    }
}

/// What an emission wrote.
#[derive(Debug, Clone, Default)]
pub struct EmitReport {
    pub descriptor: PathBuf,
    pub written: Vec<PathBuf>,
    /// Included ids that were not written (unrouted type or not in the store).
    pub skipped: Vec<EntityId>,
}

/// The file stem an entity is written under: its id without the namespace.
///
/// `None` when that would leave the entity's folder, e.g. `enc.../../x`.
pub fn file_stem(id: &EntityId) -> Option<&str> {
    let stem = id.local_name();
    let unusable = stem.is_empty()
        || stem == "."
        || stem == ".."
        || stem.contains(['/', '\\', '\0']);
    (!unusable).then_some(stem)
}

/// Refuse to emit into a directory that holds any source root.
///
/// Emission deletes the output directory first.
pub fn check_output_safety<P: AsRef<Path>>(output: &Path, roots: &[P]) -> Result<()> {
    let Ok(output_canonical) = output.canonicalize() else {
        // Nothing exists there yet, so nothing can be lost.
        return Ok(());
    };
    for root in roots {
        let root = root.as_ref();
        let root_canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        if root_canonical.starts_with(&output_canonical) {
            return Err(RemixError::OutputOverlapsSource {
                output: output.to_path_buf(),
                root: root.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Writes packs in one document format.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackEmitter {
    format: DocumentFormat,
}

impl PackEmitter {
    /// Create a new emitter for the given format.
    pub fn new(format: DocumentFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Replace `output` with the pack for `result`.
    ///
    /// Any previous contents of `output` are deleted.
    pub fn emit(
        &self,
        result: &ClosureResult,
        descriptor: &ModuleDescriptor,
        store: &EntityStore,
        output: &Path,
    ) -> Result<EmitReport> {
        if output.exists() {
            std::fs::remove_dir_all(output).map_err(|err| RemixError::io(output, err))?;
        }
        for folder in BASE_FOLDERS {
            let dir = output.join(folder);
            std::fs::create_dir_all(&dir).map_err(|err| RemixError::io(&dir, err))?;
        }

        let mut report = EmitReport {
            descriptor: output.join(format!("module.{}", self.format.extension())),
            ..EmitReport::default()
        };
        self.write_document(&report.descriptor, descriptor)?;

        let mut claimed: HashSet<PathBuf> = HashSet::new();
        for id in &result.included {
            let Some(entity) = store.get(id.as_str()) else {
                report.skipped.push(id.clone());
                continue;
            };
            let Some(folder) = folder_for(&entity.entity_type) else {
                tracing::debug!(id = %id, entity_type = %entity.entity_type, "no pack folder for type, skipping");
                report.skipped.push(id.clone());
                continue;
            };

            let Some(stem) = file_stem(id) else {
                tracing::warn!(id = %id, "id is not a usable file name, skipping");
                report.skipped.push(id.clone());
                continue;
            };

            let dir = output.join(folder);
            std::fs::create_dir_all(&dir).map_err(|err| RemixError::io(&dir, err))?;

            let path = dir.join(format!("{}.{}", stem, self.format.extension()));
            if !claimed.insert(path.clone()) {
                tracing::warn!(id = %id, path = %path.display(), "file name collision, overwriting");
            }
            self.write_document(&path, entity)?;
            report.written.push(path);
        }

        tracing::info!(
            output = %output.display(),
            written = report.written.len(),
            skipped = report.skipped.len(),
            "pack written"
        );
        Ok(report)
    }

    fn write_document<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let text = self
            .format
            .render(value)
            .map_err(|message| RemixError::Serialize {
                path: path.to_path_buf(),
                message,
            })?;
        std::fs::write(path, text).map_err(|err| RemixError::io(path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::ClosureEngine;
    use caml_content::Entity;
    use tempfile::TempDir;

    fn sample_store() -> EntityStore {
        vec![
            Entity::new("enc.crypt", EntityType::Encounter)
                .with_field("occursAt", "loc.crypt")
                .with_field(
                    "gates",
                    serde_yaml::from_str::<serde_yaml::Value>("all: [moonrise, 'party.has(item.key)']")
                        .unwrap(),
                ),
            Entity::new("loc.crypt", EntityType::Location),
            Entity::new("item.key", EntityType::Item),
            Entity::new("quest.relic", EntityType::Quest),
            Entity::new("ruleset.5e", EntityType::Other("Ruleset".to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_folder_table() {
        assert_eq!(folder_for(&EntityType::Pc), Some("npcs"));
        assert_eq!(folder_for(&EntityType::StateFact), Some("rules"));
        assert_eq!(folder_for(&EntityType::Other("Ruleset".to_string())), None);
        assert_eq!(folder_for(&EntityType::AdventureModule), None);
    }

    #[test]
    fn test_descriptor_fields() {
        let store = sample_store();
        let result = ClosureEngine::new(&store).run(vec![EntityId::new("enc.crypt")]);
        let descriptor = ModuleDescriptor::for_remix(123, &result);

        assert_eq!(descriptor.id, "module.remix_123");
        assert_eq!(descriptor.entity_type, EntityType::AdventureModule);
        assert_eq!(descriptor.tags, vec!["remix", "generated"]);
        assert_eq!(descriptor.starting_tags, vec!["moonrise"]);
        assert_eq!(descriptor.starting_items, vec!["item.key"]);

        let yaml = serde_yaml::to_string(&descriptor).unwrap();
        assert!(yaml.contains("type: AdventureModule"));
        assert!(yaml.contains("startingTags:"));
    }

    #[test]
    fn test_emit_layout() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("pack");
        let store = sample_store();
        let result = ClosureEngine::new(&store).run(vec![
            EntityId::new("enc.crypt"),
            EntityId::new("quest.relic"),
            EntityId::new("ruleset.5e"),
        ]);
        let descriptor = ModuleDescriptor::for_remix(1, &result);

        let report = PackEmitter::default()
            .emit(&result, &descriptor, &store, &out)
            .unwrap();

        assert!(out.join("module.yaml").is_file());
        for folder in BASE_FOLDERS {
            assert!(out.join(folder).is_dir(), "missing {folder}");
        }
        assert!(out.join("encounters/crypt.yaml").is_file());
        assert!(out.join("locations/crypt.yaml").is_file());
        assert!(out.join("items/key.yaml").is_file());
        assert!(out.join("quests/relic.yaml").is_file());
        assert!(!out.join("factions").exists());
        assert_eq!(report.skipped, vec![EntityId::new("ruleset.5e")]);
        assert_eq!(report.written.len(), 4);

        let written = std::fs::read_to_string(out.join("items/key.yaml")).unwrap();
        assert!(written.starts_with("id: item.key\ntype: Item"));
    }

    #[test]
    fn test_emit_replaces_previous_output() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("pack");
        std::fs::create_dir_all(out.join("encounters")).unwrap();
        std::fs::write(out.join("encounters/stale.yaml"), "id: enc.stale\n").unwrap();

        let store = sample_store();
        let result = ClosureEngine::new(&store).run(Vec::new());
        let descriptor = ModuleDescriptor::for_remix(0, &result);
        PackEmitter::new(DocumentFormat::Json)
            .emit(&result, &descriptor, &store, &out)
            .unwrap();

        assert!(!out.join("encounters/stale.yaml").exists());
        let module: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("module.json")).unwrap()).unwrap();
        assert_eq!(module["type"], "AdventureModule");
        assert_eq!(module["startingTags"], serde_json::json!([]));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(&EntityId::new("item.key")), Some("key"));
        assert_eq!(file_stem(&EntityId::new("enc.crypt.door")), Some("crypt.door"));
        assert_eq!(file_stem(&EntityId::new("enc.../../escaped")), None);
        assert_eq!(file_stem(&EntityId::new("enc.crypt/lower")), None);
        assert_eq!(file_stem(&EntityId::new("enc..")), None);
        assert_eq!(file_stem(&EntityId::new("enc.")), None);
    }

    #[test]
    fn test_emit_skips_ids_that_leave_the_pack() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("pack");
        let store: EntityStore = vec![
            Entity::new("enc.../../escaped", EntityType::Encounter),
            Entity::new("enc.crypt/lower", EntityType::Encounter),
            Entity::new("enc.crypt", EntityType::Encounter),
        ]
        .into_iter()
        .collect();
        let result = ClosureEngine::new(&store).run(vec![
            EntityId::new("enc.../../escaped"),
            EntityId::new("enc.crypt/lower"),
            EntityId::new("enc.crypt"),
        ]);
        let descriptor = ModuleDescriptor::for_remix(0, &result);

        let report = PackEmitter::default()
            .emit(&result, &descriptor, &store, &out)
            .unwrap();

        assert!(!temp.path().join("escaped.yaml").exists());
        assert!(!out.join("escaped.yaml").exists());
        assert!(out.join("encounters/crypt.yaml").is_file());
        assert_eq!(report.written.len(), 1);
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn test_output_safety() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("content");
        std::fs::create_dir_all(&root).unwrap();

        assert!(matches!(
            check_output_safety(temp.path(), &[&root]),
            Err(RemixError::OutputOverlapsSource { .. })
        ));
        assert!(matches!(
            check_output_safety(&root, &[&root]),
            Err(RemixError::OutputOverlapsSource { .. })
        ));
        assert!(check_output_safety(&temp.path().join("out"), &[&root]).is_ok());
        assert!(check_output_safety(&root.join("remix"), &[&root]).is_ok());
    }
}
