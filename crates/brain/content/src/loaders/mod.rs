//! Content loaders for reading behavior data from files.
//!
//! Templates are JSON so the tag registry can dispatch on raw nodes,
//! engine settings are TOML and scenarios are RON.

pub mod factory;
pub mod scenario;
pub mod settings;
pub mod templates;

pub use factory::ContentFactory;
pub use scenario::ScenarioLoader;
pub use settings::SettingsLoader;
pub use templates::{ContentSet, DisabledTemplate, TemplateLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
