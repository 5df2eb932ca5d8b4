//! Entity definitions for adventure content.

mod document;

pub use document::*;

use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use std::borrow::Borrow;
use std::path::{Path, PathBuf};

/// Globally unique, namespaced identifier for entities (e.g. `item.sword`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Create an entity ID from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leading namespace segment (`item` for `item.sword`), if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once('.').map(|(namespace, _)| namespace)
    }

    /// The id with its leading namespace segment stripped.
    ///
    /// Ids without a namespace are returned whole.
    pub fn local_name(&self) -> &str {
        self.0
            .split_once('.')
            .map(|(_, rest)| rest)
            .unwrap_or(self.0.as_str())
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared types of entities.
///
/// Unknown type names are kept as [`EntityType::Other`] so newer content
/// still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    Location,
    Npc,
    Pc,
    Item,
    Encounter,
    StateFact,
    Quest,
    Faction,
    Handout,
    AdventureModule,
    Other(String),
}

impl EntityType {
    /// Parse a declared type name. Matching is exact.
    pub fn parse(name: &str) -> Self {
        match name {
            "Location" => EntityType::Location,
            "NPC" => EntityType::Npc,
            "PC" => EntityType::Pc,
            "Item" => EntityType::Item,
            "Encounter" => EntityType::Encounter,
            "StateFact" => EntityType::StateFact,
            "Quest" => EntityType::Quest,
            "Faction" => EntityType::Faction,
            "Handout" => EntityType::Handout,
            "AdventureModule" => EntityType::AdventureModule,
            other => EntityType::Other(other.to_string()),
        }
    }

    /// The type name as written in content documents.
    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Location => "Location",
            EntityType::Npc => "NPC",
            EntityType::Pc => "PC",
            EntityType::Item => "Item",
            EntityType::Encounter => "Encounter",
            EntityType::StateFact => "StateFact",
            EntityType::Quest => "Quest",
            EntityType::Faction => "Faction",
            EntityType::Handout => "Handout",
            EntityType::AdventureModule => "AdventureModule",
            EntityType::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        EntityType::parse(&name)
    }
}

impl From<EntityType> for String {
    fn from(entity_type: EntityType) -> Self {
        entity_type.as_str().to_string()
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed content object loaded from a document.
///
/// The entity keeps its whole source document so it can be written back out
/// unchanged. Entities are read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: EntityType,
    document: Mapping,
    /// File the entity was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl Entity {
    /// Create a new in-memory entity with only `id` and `type` set.
    pub fn new(id: impl Into<String>, entity_type: EntityType) -> Self {
        let id = EntityId::new(id);
        let mut document = Mapping::new();
        document.insert(Value::from("id"), Value::from(id.as_str()));
        document.insert(Value::from("type"), Value::from(entity_type.as_str()));
        Self {
            id,
            entity_type,
            document,
            source: None,
        }
    }

    /// Recognize an entity in a parsed document.
    ///
    /// Returns `None` unless the document is a mapping with string `id` and
    /// `type` fields. Anything else is not an entity.
    pub fn from_document(value: Value) -> Option<Self> {
        match value {
            Value::Mapping(document) => Self::from_mapping(document),
            _ => None,
        }
    }

    /// Recognize an entity in a mapping. See [`Entity::from_document`].
    pub fn from_mapping(document: Mapping) -> Option<Self> {
        let id = EntityId::new(document.get("id").and_then(Value::as_str)?);
        let entity_type = EntityType::parse(document.get("type").and_then(Value::as_str)?);
        Some(Self {
            id,
            entity_type,
            document,
            source: None,
        })
    }

    /// Set an attribute on the document.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.document.insert(Value::from(key), value.into());
        self
    }

    /// Set the source file.
    pub fn with_source(mut self, path: impl AsRef<Path>) -> Self {
        self.source = Some(path.as_ref().to_path_buf());
        self
    }

    /// Get a raw attribute by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// The full document, including `id` and `type`.
    pub fn document(&self) -> &Mapping {
        &self.document
    }

    /// Display name, if the document declares one.
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    /// The `gates` structure guarding this entity.
    pub fn gates(&self) -> Option<&Value> {
        self.get("gates")
    }

    /// The `outcomes` branches of this entity.
    pub fn outcomes(&self) -> Option<&Value> {
        self.get("outcomes")
    }

    /// Location id named by `occursAt`.
    pub fn occurs_at(&self) -> Option<&str> {
        self.get("occursAt").and_then(Value::as_str)
    }

    /// String ids listed under `participants`. Non-string entries are skipped.
    pub fn participants(&self) -> Vec<&str> {
        self.get("participants")
            .and_then(Value::as_sequence)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_encounter(&self) -> bool {
        self.entity_type == EntityType::Encounter
    }

    /// Human-readable origin for diagnostics.
    pub fn origin(&self) -> String {
        self.source
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}
