//! Gate Graph - encounters linked to what they require and what they produce.
//!
//! Requirement nodes point at the encounters that need them (`requires`);
//! encounters point at the tags and effects their outcomes apply (`produces`).
//! A tag required by one encounter and added by another is a single node,
//! which makes producer chains visible.

use caml_content::EntityStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{RemixError, Result};
use crate::gates::{gate_expressions, EncounterProfile, Outcome, Requirement};

pub const GRAPH_FILE_NAME: &str = "graph.json";

/// Kinds of graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Encounter,
    Requirement,
    Tag,
    Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Requires,
    Produces,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

/// Node/link graph of every encounter in a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateGraph {
    pub root: String,
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,

    #[serde(skip)]
    seen: HashSet<String>,
}

impl GateGraph {
    /// Load `root` and graph its encounters.
    pub fn build(root: &Path) -> Result<Self> {
        let store = EntityStore::load(&[root])?;
        Ok(Self::from_store(&store, root))
    }

    /// Graph the encounters of a store, in load order.
    ///
    /// Encounter paths are reported relative to `root` when they lie under it.
    pub fn from_store(store: &EntityStore, root: &Path) -> Self {
        let mut graph = Self {
            root: root.display().to_string(),
            ..Self::default()
        };

        for encounter in store.encounters() {
            let id = encounter.id.to_string();
            let path = encounter
                .source
                .as_deref()
                .map(|source| {
                    source
                        .strip_prefix(root)
                        .unwrap_or(source)
                        .to_string_lossy()
                        .replace('\\', "/")
                })
                .unwrap_or_default();
            let label = encounter.name().unwrap_or(id.as_str()).to_string();
            graph.add_node(
                id.clone(),
                NodeKind::Encounter,
                label,
                BTreeMap::from([("path".to_string(), path)]),
            );

            // Gate expressions in document order, each linked once.
            let mut linked = HashSet::new();
            let expressions = encounter.gates().map(gate_expressions).unwrap_or_default();
            for requirement in expressions.into_iter().map(Requirement::classify) {
                let node = requirement.to_string();
                if !linked.insert(node.clone()) {
                    continue;
                }
                graph.add_node(
                    node.clone(),
                    NodeKind::Requirement,
                    requirement.label(),
                    BTreeMap::new(),
                );
                graph.link(node, id.clone(), LinkKind::Requires);
            }

            for outcome in &EncounterProfile::of(encounter).outcomes {
                let kind = match outcome {
                    Outcome::AddTag { .. } | Outcome::RemoveTag { .. } => NodeKind::Tag,
                    _ => NodeKind::Outcome,
                };
                let node = outcome.to_string();
                graph.add_node(node.clone(), kind, outcome.label(), BTreeMap::new());
                graph.link(id.clone(), node, LinkKind::Produces);
            }
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "gate graph built"
        );
        graph
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Links ending at `id`.
    pub fn links_into<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphLink> + 'a {
        self.links.iter().filter(move |link| link.target == id)
    }

    /// Links starting at `id`.
    pub fn links_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphLink> + 'a {
        self.links.iter().filter(move |link| link.source == id)
    }

    /// Write the graph as `graph.json` at the root.
    pub fn write(&self, root: &Path) -> Result<PathBuf> {
        let path = root.join(GRAPH_FILE_NAME);
        let text = serde_json::to_string_pretty(self).map_err(|err| RemixError::Serialize {
            path: path.clone(),
            message: err.to_string(),
        })?;
        std::fs::write(&path, text).map_err(|err| RemixError::io(&path, err))?;
        tracing::info!(
            path = %path.display(),
            nodes = self.nodes.len(),
            links = self.links.len(),
            "gate graph written"
        );
        Ok(path)
    }

    // First definition of a node id wins.
    fn add_node(&mut self, id: String, kind: NodeKind, label: String, meta: BTreeMap<String, String>) {
        if self.seen.insert(id.clone()) {
            self.nodes.push(GraphNode {
                id,
                kind,
                label,
                meta,
            });
        }
    }

    fn link(&mut self, source: String, target: String, kind: LinkKind) {
        self.links.push(GraphLink {
            source,
            target,
            kind,
        });
    }
}
