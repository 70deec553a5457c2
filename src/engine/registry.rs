use super::{ErrorEngine, TemplateEngine};
use crate::constants::ERROR_ENGINE;
use crate::descriptor::TemplateDescriptor;
use crate::error::{Error, Result};
use crate::lookup::Lookup;
use indexmap::IndexMap;
use log::{debug, warn};
use std::sync::Arc;

/// Engines registered at startup, keyed by name.
///
/// Selection is total: an unknown or missing engine resolves to the `_error`
/// engine, which is always registered.
pub struct EngineRegistry {
    engines: IndexMap<String, Arc<dyn TemplateEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    pub fn new(default_engine: impl Into<String>) -> Self {
        let mut engines: IndexMap<String, Arc<dyn TemplateEngine>> = IndexMap::new();
        engines.insert(ERROR_ENGINE.to_string(), Arc::new(ErrorEngine));
        Self { engines, default_engine: default_engine.into() }
    }

    /// Registers `engine` under its own name, replacing any earlier one.
    pub fn register(&mut self, engine: Arc<dyn TemplateEngine>) {
        debug!("Registering template engine '{}'", engine.name());
        self.engines.insert(engine.name().to_string(), engine);
    }

    pub fn default_engine(&self) -> &str {
        &self.default_engine
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn error_engine(&self) -> Arc<dyn TemplateEngine> {
        match self.engines.get(ERROR_ENGINE) {
            Some(engine) => Arc::clone(engine),
            None => Arc::new(ErrorEngine),
        }
    }

    /// The engine registered as `name`, or the error engine.
    pub fn resolve(&self, name: &str) -> Arc<dyn TemplateEngine> {
        match self.lookup(name) {
            Ok(engine) => engine,
            Err(_) => {
                warn!("Template engine '{name}' is not registered, using '{ERROR_ENGINE}'");
                self.error_engine()
            }
        }
    }

    /// Picks the engine for `descriptor`: its own engine, else the default.
    pub fn select(&self, descriptor: Option<&TemplateDescriptor>) -> Arc<dyn TemplateEngine> {
        match descriptor {
            Some(descriptor) => {
                self.resolve(descriptor.engine.as_deref().unwrap_or(&self.default_engine))
            }
            None => self.error_engine(),
        }
    }
}

impl Lookup<Arc<dyn TemplateEngine>> for EngineRegistry {
    fn lookup(&self, id: &str) -> Result<Arc<dyn TemplateEngine>> {
        self.engines
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotRegistered { kind: "template engine", id: id.to_string() })
    }
}
