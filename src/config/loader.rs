//! Configuration loading and management

use crate::config::types::{ControllerConfig, ExceptionTemplate};
use crate::constants::{
    APP_RESOURCES_DIR, CONFIG_FILENAMES, DEFAULT_APP_PATH, DEFAULT_CONTENT_TYPE,
    DEFAULT_ENGINE,
};
use crate::error::{Error, Result};
use crate::namespace::Namespace;
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// The view manifest of a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// Engine used by templates that do not name one.
    #[serde(rename = "default.engine", default = "get_default_engine")]
    pub default_engine: String,
    #[serde(default = "get_default_content_type")]
    pub content_type: String,
    /// Application directory; overrides live under `<app_path>/resources`.
    #[serde(default = "get_default_app_path")]
    pub app_path: PathBuf,
    /// Bundle name → bundle root.
    #[serde(default)]
    pub bundles: IndexMap<String, PathBuf>,
    /// Exposed to templates as `conga.parameters`.
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
    /// Client-side configuration groups for `conga_init`.
    #[serde(default)]
    pub client: IndexMap<String, Value>,
    /// Route name → URL pattern for `url_for`.
    #[serde(default)]
    pub routes: IndexMap<String, String>,
    /// Controller service id → templated actions.
    #[serde(default)]
    pub controllers: IndexMap<String, ControllerConfig>,
    /// HTTP status → error template.
    #[serde(default)]
    pub exceptions: IndexMap<u16, ExceptionTemplate>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_engine: get_default_engine(),
            content_type: get_default_content_type(),
            app_path: get_default_app_path(),
            bundles: IndexMap::new(),
            parameters: IndexMap::new(),
            client: IndexMap::new(),
            routes: IndexMap::new(),
            controllers: IndexMap::new(),
            exceptions: IndexMap::new(),
        }
    }
}

impl ViewConfig {
    /// Loads the first manifest found in `project_dir` and resolves its
    /// relative paths against that directory.
    pub fn load<P: AsRef<Path>>(project_dir: P) -> Result<Self> {
        let project_dir = project_dir.as_ref();

        for config_file_name in CONFIG_FILENAMES.iter() {
            let config_file_path = project_dir.join(config_file_name);

            if config_file_path.exists() {
                debug!("Loading view configuration from {}", config_file_path.display());
                let content = std::fs::read_to_string(&config_file_path)?;
                let config: ViewConfig = match *config_file_name {
                    "views.json" => serde_json::from_str(&content)?,
                    _ => serde_yaml::from_str(&content)?,
                };

                let config = config.rooted_at(project_dir);
                config.validate()?;
                return Ok(config);
            }
        }

        Err(Error::ConfigNotFound {
            project_dir: project_dir.display().to_string(),
            config_files: CONFIG_FILENAMES.join(", "),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_engine.trim().is_empty() {
            return Err(Error::ConfigValidation("default.engine must not be empty".into()));
        }
        if self.content_type.trim().is_empty() {
            return Err(Error::ConfigValidation("content_type must not be empty".into()));
        }
        for (id, controller) in &self.controllers {
            let source = controller.source(id);
            for annotation in controller.annotations() {
                let namespace = annotation
                    .path
                    .unwrap_or_else(|| source.default_namespace(&annotation.target));
                Namespace::parse(&namespace)?;
            }
        }
        for exception in self.exceptions.values() {
            Namespace::parse(&exception.template)?;
        }
        Ok(())
    }

    /// Directory holding application overrides.
    pub fn app_resources(&self) -> PathBuf {
        self.app_path.join(APP_RESOURCES_DIR)
    }

    fn rooted_at(mut self, project_dir: &Path) -> Self {
        self.app_path = project_dir.join(&self.app_path);
        for root in self.bundles.values_mut() {
            *root = project_dir.join(&*root);
        }
        self
    }
}

fn get_default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

fn get_default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

fn get_default_app_path() -> PathBuf {
    PathBuf::from(DEFAULT_APP_PATH)
}
