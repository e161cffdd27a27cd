//! Agent template loader.
//!
//! Each `*.json` file holds one template. A template that fails to parse or
//! validate is disabled on its own; the rest of the directory still loads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use brain_core::{ConfigError, ConfigPath};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::loaders::{LoadResult, read_file};
use crate::registry::TaskConfigRegistry;
use crate::template::AgentTemplate;

/// A template rejected at load time, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct DisabledTemplate {
    /// Template name, or the file stem when the name could not be read.
    pub name: String,
    pub origin: String,
    pub error: ConfigError,
}

/// Every template of a content directory, loaded or disabled.
#[derive(Clone, Debug, Default)]
pub struct ContentSet {
    pub templates: BTreeMap<String, AgentTemplate>,
    pub disabled: Vec<DisabledTemplate>,
}

impl ContentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AgentTemplate> {
        self.templates.get(name)
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d.name == name)
    }

    /// Parses and validates one template document.
    ///
    /// Failures are recorded in [`ContentSet::disabled`] and logged; they
    /// never affect other templates.
    pub fn ingest(&mut self, registry: &TaskConfigRegistry, origin: &str, document: &Value) {
        let outcome = AgentTemplate::from_json(registry, document, origin).and_then(|template| {
            template.validate()?;
            Ok(template)
        });

        match outcome {
            Ok(template) if !template.enabled => {
                debug!(target: "brain::content", template = %template.name, "template switched off");
            }
            Ok(template) if self.templates.contains_key(&template.name) => {
                let error = ConfigError::malformed(
                    &template.path(),
                    format!("template `{}` is defined more than once", template.name),
                );
                self.disable(template.name, origin, error);
            }
            Ok(template) => {
                debug!(
                    target: "brain::content",
                    template = %template.name,
                    activities = template.activities.len(),
                    "loaded template"
                );
                self.templates.insert(template.name.clone(), template);
            }
            Err(error) => {
                let name = document
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(origin)
                    .to_owned();
                self.disable(name, origin, error);
            }
        }
    }

    fn disable(&mut self, name: String, origin: &str, error: ConfigError) {
        warn!(target: "brain::content", template = %name, origin, %error, "template disabled");
        self.disabled.push(DisabledTemplate {
            name,
            origin: origin.to_owned(),
            error,
        });
    }
}

/// Loader for a directory of JSON templates.
pub struct TemplateLoader;

impl TemplateLoader {
    /// Load every `*.json` file in `dir`, in file name order.
    ///
    /// Only I/O failures are returned as errors; bad content ends up in
    /// [`ContentSet::disabled`].
    pub fn load(dir: &Path, registry: &TaskConfigRegistry) -> LoadResult<ContentSet> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut content = ContentSet::new();
        for path in files {
            let origin = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("template")
                .to_owned();
            let text = read_file(&path)?;
            match serde_json::from_str::<Value>(&text) {
                Ok(document) => content.ingest(registry, &origin, &document),
                Err(e) => {
                    let error =
                        ConfigError::malformed(&ConfigPath::root(origin.as_str()), e.to_string());
                    content.disable(origin.clone(), &origin, error);
                }
            }
        }

        info!(
            target: "brain::content",
            dir = %dir.display(),
            loaded = content.templates.len(),
            disabled = content.disabled.len(),
            "templates loaded"
        );
        Ok(content)
    }
}
