//! Template entries declared in the view manifest

use crate::descriptor::{ControllerSource, TemplateAnnotation, TemplateDescriptor};
use indexmap::IndexMap;
use serde::Deserialize;

/// The `@Template` of a single action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionTemplate {
    /// Explicit namespace. Defaults to `<bundle>:<controller name>/<action>`.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
}

/// A controller and its templated actions.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    pub bundle: String,
    /// Short name used in generated namespaces.
    #[serde(default)]
    pub name: Option<String>,
    /// Controller source file, used to derive `name` when it is absent.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub actions: IndexMap<String, ActionTemplate>,
}

impl ControllerConfig {
    /// The controller as registered under `service_id`.
    ///
    /// Without `name` or `file` the last dotted segment of the id is used,
    /// so `demo.controller.default` becomes `default`.
    pub fn source(&self, service_id: &str) -> ControllerSource {
        match (&self.name, &self.file) {
            (Some(name), _) => ControllerSource::new(service_id, &self.bundle, name),
            (None, Some(file)) => ControllerSource::from_file(service_id, &self.bundle, file),
            (None, None) => {
                let name = service_id.rsplit('.').next().unwrap_or(service_id);
                ControllerSource::new(service_id, &self.bundle, name.to_lowercase())
            }
        }
    }

    pub fn annotations(&self) -> Vec<TemplateAnnotation> {
        self.actions
            .iter()
            .map(|(action, entry)| TemplateAnnotation {
                target: action.clone(),
                path: entry.template.clone(),
                engine: entry.engine.clone(),
            })
            .collect()
    }
}

/// Template rendered for a given HTTP status.
#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionTemplate {
    pub template: String,
    #[serde(default)]
    pub engine: Option<String>,
}

impl ExceptionTemplate {
    pub fn descriptor(&self) -> TemplateDescriptor {
        TemplateDescriptor { namespace: self.template.clone(), engine: self.engine.clone() }
    }
}
