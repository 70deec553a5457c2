//! Template descriptors and the registry mapping controller actions to them.

use crate::constants::{EXCEPTION_KEY_PREFIX, NAMESPACE_SEPARATOR};
use crate::context::Route;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to render and, optionally, with which engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub namespace: String,
    /// Overrides the configured default engine when set.
    #[serde(default)]
    pub engine: Option<String>,
}

impl TemplateDescriptor {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), engine: None }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}

/// A `@Template` marker found on a controller method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateAnnotation {
    /// Name of the annotated method.
    pub target: String,
    /// Explicit template namespace.
    pub path: Option<String>,
    pub engine: Option<String>,
}

impl TemplateAnnotation {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), ..Default::default() }
    }
}

/// The controller an annotation list was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSource {
    pub service_id: String,
    pub bundle: String,
    /// Short controller name used in generated namespaces (`default`).
    pub name: String,
}

impl ControllerSource {
    pub fn new(
        service_id: impl Into<String>,
        bundle: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self { service_id: service_id.into(), bundle: bundle.into(), name: name.into() }
    }

    /// Derives the short name from a controller source file:
    /// `src/controller/DefaultController.rs` → `default`.
    pub fn from_file(
        service_id: impl Into<String>,
        bundle: impl Into<String>,
        file_path: impl AsRef<Path>,
    ) -> Self {
        let stem = file_path
            .as_ref()
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = stem.strip_suffix("Controller").unwrap_or(&stem).to_lowercase();
        Self::new(service_id, bundle, name)
    }

    /// `<bundle>:<name>/<target>`
    pub fn default_namespace(&self, target: &str) -> String {
        format!("{}{}{}/{}", self.bundle, NAMESPACE_SEPARATOR, self.name, target)
    }
}

/// Descriptors registered at startup, keyed by controller id and action, plus
/// the exception templates keyed `error<status>`.
#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    routes: IndexMap<String, IndexMap<String, TemplateDescriptor>>,
    exceptions: IndexMap<String, TemplateDescriptor>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the template for one action, replacing any earlier one.
    pub fn register(
        &mut self,
        controller: impl Into<String>,
        action: impl Into<String>,
        descriptor: TemplateDescriptor,
    ) {
        let controller = controller.into();
        let action = action.into();
        debug!("Registering template '{}' for {controller}::{action}", descriptor.namespace);
        self.routes.entry(controller).or_default().insert(action, descriptor);
    }

    pub fn register_exception(&mut self, status: u16, descriptor: TemplateDescriptor) {
        debug!("Registering '{}' for status {status}", descriptor.namespace);
        self.exceptions.insert(exception_key(status), descriptor);
    }

    /// Registers every annotated action of `controller`.
    pub fn register_annotations(
        &mut self,
        controller: &ControllerSource,
        annotations: &[TemplateAnnotation],
    ) {
        for annotation in annotations {
            let namespace = annotation
                .path
                .clone()
                .unwrap_or_else(|| controller.default_namespace(&annotation.target));
            let descriptor =
                TemplateDescriptor { namespace, engine: annotation.engine.clone() };
            self.register(&controller.service_id, &annotation.target, descriptor);
        }
    }

    pub fn find_route(&self, route: &Route) -> Option<&TemplateDescriptor> {
        self.routes.get(&route.controller).and_then(|actions| actions.get(&route.action))
    }

    pub fn find_exception(&self, status: u16) -> Option<&TemplateDescriptor> {
        self.exceptions.get(&exception_key(status))
    }

    /// All descriptors in registration order, route templates first.
    pub fn descriptors(&self) -> impl Iterator<Item = &TemplateDescriptor> {
        self.routes.values().flat_map(IndexMap::values).chain(self.exceptions.values())
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(IndexMap::len).sum::<usize>() + self.exceptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn exception_key(status: u16) -> String {
    format!("{EXCEPTION_KEY_PREFIX}{status}")
}
