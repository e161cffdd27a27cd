//! Engine settings loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::settings::EngineSettings;

/// Loader for engine settings from TOML files.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a TOML file. Omitted keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<EngineSettings> {
        let content = read_file(path)?;
        let settings: EngineSettings = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse settings TOML: {}", e))?;

        Ok(settings)
    }
}
