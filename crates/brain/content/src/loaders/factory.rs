//! Content factory for loading behavior data from a data directory.

use std::path::{Path, PathBuf};

use crate::loaders::{ContentSet, LoadResult, ScenarioLoader, SettingsLoader, TemplateLoader};
use crate::registry::TaskConfigRegistry;
use crate::scenario::Scenario;
use crate::settings::EngineSettings;

/// Content factory that loads all behavior content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── settings.toml
/// ├── scenario.ron
/// └── templates/
///     ├── mareep.json
///     └── bee.json
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine settings from `settings.toml`, or defaults if the file is absent.
    pub fn load_settings(&self) -> LoadResult<EngineSettings> {
        let path = self.data_dir.join("settings.toml");
        if !path.exists() {
            return Ok(EngineSettings::default());
        }
        SettingsLoader::load(&path)
    }

    /// Load every template under `templates/`.
    pub fn load_templates(&self, registry: &TaskConfigRegistry) -> LoadResult<ContentSet> {
        TemplateLoader::load(&self.data_dir.join("templates"), registry)
    }

    /// Load the default scenario from `scenario.ron`.
    pub fn load_scenario(&self) -> LoadResult<Scenario> {
        self.load_named_scenario("scenario")
    }

    /// Load a scenario from `{name}.ron`.
    pub fn load_named_scenario(&self, name: &str) -> LoadResult<Scenario> {
        let path = self.data_dir.join(format!("{}.ron", name));
        ScenarioLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn missing_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_settings().unwrap(), EngineSettings::default());
    }

    #[test]
    fn scenario_with_duplicate_ids_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scenario.ron"),
            r#"(agents: [
                (id: Some(1), template: "bee", position: (x: 0.0, y: 64.0, z: 0.0)),
                (id: Some(1), template: "bee", position: (x: 1.0, y: 64.0, z: 0.0)),
            ])"#,
        )
        .unwrap();
        let err = ContentFactory::new(dir.path()).load_scenario().unwrap_err();
        assert!(err.to_string().contains("twice"));
    }
}
