//! Scenario loader.

use std::collections::BTreeSet;
use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::scenario::Scenario;

/// Loader for scenarios from RON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load a scenario from a RON file.
    ///
    /// Explicit agent ids must be unique; template names are resolved later,
    /// when the scenario is spawned.
    pub fn load(path: &Path) -> LoadResult<Scenario> {
        let content = read_file(path)?;
        let scenario: Scenario = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario RON at {:?}: {}", path, e))?;

        let mut seen = BTreeSet::new();
        for id in scenario.agents.iter().filter_map(|spawn| spawn.id) {
            if !seen.insert(id) {
                anyhow::bail!("Scenario {:?} spawns agent {} twice", path, id);
            }
        }

        Ok(scenario)
    }
}
