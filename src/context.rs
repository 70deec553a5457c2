//! Request data handed to the view layer and the context templates render with.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// The controller action a request was routed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub controller: String,
    pub action: String,
}

impl Route {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self { controller: controller.into(), action: action.into() }
    }

    /// Parses `controller::action`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.rsplit_once("::") {
            Some((controller, action)) if !controller.is_empty() && !action.is_empty() => {
                Ok(Self::new(controller, action))
            }
            _ => Err(Error::ConfigValidation(format!(
                "route '{s}' must have the form <controller>::<action>"
            ))),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.controller, self.action)
    }
}

/// The parts of an inbound HTTP request the view layer reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub method: String,
    pub original_url: String,
    pub protocol: String,
    pub host: String,
    pub route: Option<Route>,
    /// Security context attached by an upstream firewall.
    pub security: Option<Value>,
}

impl Request {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            original_url: original_url.into(),
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            route: None,
            security: None,
        }
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_host(mut self, protocol: impl Into<String>, host: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self.host = host.into();
        self
    }

    pub fn with_security(mut self, security: Value) -> Self {
        self.security = Some(security);
        self
    }

    /// The resolved route, or an error naming the unrouted URL.
    pub fn route(&self) -> Result<&Route> {
        self.route
            .as_ref()
            .ok_or_else(|| Error::UnroutedRequest { url: self.original_url.clone() })
    }
}

/// A helper bound into a render context. The request is already captured.
pub type HelperFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Data passed to an engine: plain values plus callable helpers sharing one
/// top-level namespace. Inserting either kind replaces the other under the
/// same key.
#[derive(Clone, Default)]
pub struct RenderContext {
    data: Map<String, Value>,
    functions: IndexMap<String, HelperFn>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: Map<String, Value>) -> Self {
        Self { data, functions: IndexMap::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.functions.shift_remove(&key);
        self.data.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn bind_function(&mut self, name: impl Into<String>, function: HelperFn) {
        let name = name.into();
        self.data.shift_remove(&name);
        self.functions.insert(name, function);
    }

    pub fn function(&self, name: &str) -> Option<&HelperFn> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = (&str, &HelperFn)> {
        self.functions.iter().map(|(name, function)| (name.as_str(), function))
    }

    /// Calls a bound helper by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let function = self.function(name).ok_or_else(|| Error::NotRegistered {
            kind: "template function",
            id: name.to_string(),
        })?;
        function(args)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key) || self.functions.contains_key(key)
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("data", &self.data)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<Map<String, Value>> for RenderContext {
    fn from(data: Map<String, Value>) -> Self {
        Self::from_data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_controller_action_pairs() {
        let route = Route::parse("demo.controller.default::index").unwrap();
        assert_eq!(route, Route::new("demo.controller.default", "index"));
        assert_eq!(route.to_string(), "demo.controller.default::index");

        assert!(Route::parse("index").is_err());
        assert!(Route::parse("::index").is_err());
    }

    #[test]
    fn unrouted_request_reports_its_url() {
        let request = Request::new("/nowhere");
        assert!(matches!(
            request.route(),
            Err(Error::UnroutedRequest { url }) if url == "/nowhere"
        ));
    }

    #[test]
    fn data_and_functions_share_one_namespace() {
        let mut context = RenderContext::new();
        context.insert("greet", json!("plain"));
        context.bind_function(
            "greet",
            Arc::new(|_args: &[Value]| -> Result<Value> { Ok(json!("called")) }),
        );

        assert!(context.get("greet").is_none());
        assert_eq!(context.call("greet", &[]).unwrap(), json!("called"));

        context.insert("greet", json!("plain again"));
        assert!(context.function("greet").is_none());
        assert!(context.contains_key("greet"));
    }

    #[test]
    fn calling_an_unbound_function_fails() {
        let context = RenderContext::new();
        assert!(matches!(context.call("nope", &[]), Err(Error::NotRegistered { .. })));
    }
}
