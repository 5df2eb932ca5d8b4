//! Remix runs: load, pick targets, close, emit.

use caml_content::{EntityId, EntityStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

use crate::closure::{ClosureEngine, ClosureResult};
use crate::config::RemixConfig;
use crate::emitter::{check_output_safety, EmitReport, ModuleDescriptor, PackEmitter};
use crate::error::{RemixError, Result};

/// A closed remix that has not been written anywhere.
#[derive(Debug, Clone)]
pub struct RemixPlan {
    pub targets: BTreeSet<EntityId>,
    pub result: ClosureResult,
    pub descriptor: ModuleDescriptor,
}

/// Everything a completed remix run produced.
#[derive(Debug, Clone)]
pub struct RemixReport {
    pub plan: RemixPlan,
    pub emitted: EmitReport,
}

/// Runs remixes for one configuration.
pub struct Remixer {
    config: RemixConfig,
}

impl Remixer {
    /// Create a new remixer.
    pub fn new(config: RemixConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RemixConfig {
        &self.config
    }

    /// Load the configured roots, then plan and emit.
    pub fn run(&self) -> Result<RemixReport> {
        let store = EntityStore::load_with_policy(&self.config.roots, self.config.duplicates)?;
        self.run_with_store(&store)
    }

    /// Plan against an already loaded store and emit the pack.
    ///
    /// Nothing is written unless planning succeeds.
    pub fn run_with_store(&self, store: &EntityStore) -> Result<RemixReport> {
        let plan = self.plan(store)?;

        check_output_safety(&self.config.out, &self.config.roots)?;
        let emitted = PackEmitter::new(self.config.format).emit(
            &plan.result,
            &plan.descriptor,
            store,
            &self.config.out,
        )?;

        Ok(RemixReport { plan, emitted })
    }

    /// Pick targets and close over them without touching the filesystem.
    ///
    /// Fails only when the corpus has no encounters at all.
    pub fn plan(&self, store: &EntityStore) -> Result<RemixPlan> {
        if store.encounter_ids().is_empty() {
            return Err(RemixError::NoEncounters);
        }

        let engine = ClosureEngine::new(store);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let targets = engine.select_targets(self.config.pick, &mut rng);
        tracing::info!(
            seed = self.config.seed,
            targets = ?targets.iter().map(EntityId::as_str).collect::<Vec<_>>(),
            "selected remix targets"
        );

        let result = engine.run(targets.iter().cloned());
        let descriptor = ModuleDescriptor::for_remix(self.config.seed, &result);

        Ok(RemixPlan {
            targets,
            result,
            descriptor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caml_content::{Entity, EntityType};
    use tempfile::TempDir;

    #[test]
    fn test_plan_without_encounters_fails() {
        let store: EntityStore = vec![Entity::new("loc.hall", EntityType::Location)]
            .into_iter()
            .collect();
        let remixer = Remixer::new(RemixConfig::default());

        assert!(matches!(remixer.plan(&store), Err(RemixError::NoEncounters)));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let store: EntityStore = (0..10)
            .map(|n| Entity::new(format!("enc.e{n}"), EntityType::Encounter))
            .collect();
        let remixer = Remixer::new(RemixConfig::default().with_seed(42).with_pick(3));

        let first = remixer.plan(&store).unwrap();
        let second = remixer.plan(&store).unwrap();

        assert_eq!(first.targets, second.targets);
        assert_eq!(first.result, second.result);
        assert_eq!(first.descriptor.id, "module.remix_42");
    }

    #[test]
    fn test_run_with_store_writes_nothing_on_failure() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let remixer = Remixer::new(RemixConfig::new(Vec::new(), &out));

        let result = remixer.run_with_store(&EntityStore::new());

        assert!(matches!(result, Err(RemixError::NoEncounters)));
        assert!(!out.exists());
    }
}
