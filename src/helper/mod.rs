//! Template helpers: named functions bound into every render context.
//!
//! Each helper declares the names it exposes. At startup the registry turns
//! those into [`HelperDescriptor`]s; per request they are bound with the
//! request captured as the first argument.

pub mod conga;
pub mod path;
pub mod url;

pub use conga::CongaHelper;
pub use path::PathHelper;
pub use url::{RouteTable, UrlGenerator, UrlHelper};

use crate::context::{RenderContext, Request};
use crate::error::{Error, Result};
use crate::lookup::Lookup;
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A service exposing functions to templates.
pub trait TemplateHelper: Send + Sync {
    /// Public function name → the helper's own method name.
    fn methods(&self) -> &[(&'static str, &'static str)];

    /// Invokes `method` with the current request and the template's arguments.
    fn call(&self, method: &str, request: &Request, args: &[Value]) -> Result<Value>;
}

type Invoke = Arc<dyn Fn(&Request, &[Value]) -> Result<Value> + Send + Sync>;

/// One exposed helper function.
#[derive(Clone)]
pub struct HelperDescriptor {
    pub exposed_name: String,
    /// Service id of the helper that provides it.
    pub helper_id: String,
    invoke: Invoke,
}

impl HelperDescriptor {
    pub fn invoke(&self, request: &Request, args: &[Value]) -> Result<Value> {
        (self.invoke)(request, args)
    }
}

impl fmt::Debug for HelperDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperDescriptor")
            .field("exposed_name", &self.exposed_name)
            .field("helper_id", &self.helper_id)
            .finish()
    }
}

/// Helpers in registration order.
#[derive(Default)]
pub struct HelperRegistry {
    helpers: IndexMap<String, Arc<dyn TemplateHelper>>,
    descriptors: Vec<HelperDescriptor>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `helper` under `id` and records one descriptor per exposed
    /// method.
    pub fn register(&mut self, id: impl Into<String>, helper: Arc<dyn TemplateHelper>) {
        let id = id.into();
        for &(exposed, method) in helper.methods() {
            debug!("Exposing template helper '{exposed}' from '{id}'");
            let target = Arc::clone(&helper);
            let invoke: Invoke = Arc::new(move |request: &Request, args: &[Value]| {
                target.call(method, request, args)
            });
            self.descriptors.push(HelperDescriptor {
                exposed_name: exposed.to_string(),
                helper_id: id.clone(),
                invoke,
            });
        }
        self.helpers.insert(id, helper);
    }

    pub fn descriptors(&self) -> &[HelperDescriptor] {
        &self.descriptors
    }

    /// Binds every descriptor into `context` with `request` prepended to the
    /// caller's arguments. A later helper exposing the same name replaces an
    /// earlier one.
    pub fn bind(&self, request: &Arc<Request>, context: &mut RenderContext) {
        for descriptor in &self.descriptors {
            let descriptor = descriptor.clone();
            let request = Arc::clone(request);
            context.bind_function(
                descriptor.exposed_name.clone(),
                Arc::new(move |args: &[Value]| descriptor.invoke(&request, args)),
            );
        }
    }
}

impl Lookup<Arc<dyn TemplateHelper>> for HelperRegistry {
    fn lookup(&self, id: &str) -> Result<Arc<dyn TemplateHelper>> {
        self.helpers
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotRegistered { kind: "template helper", id: id.to_string() })
    }
}

/// Positional string argument `index`, named `name` in error messages.
pub(crate) fn string_arg<'a>(
    helper: &str,
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| Error::HelperError {
        helper: helper.to_string(),
        message: format!("argument {} ('{name}') must be a string", index + 1),
    })
}

pub(crate) fn unknown_method(helper: &str, method: &str) -> Error {
    Error::HelperError { helper: helper.to_string(), message: format!("no method '{method}'") }
}
