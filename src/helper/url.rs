use super::{string_arg, unknown_method, TemplateHelper};
use crate::context::Request;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use url::{Position, Url};

/// Base for relative URLs; only the path and query are kept.
const RELATIVE_BASE: &str = "http://localhost";

/// Builds URLs for named routes.
pub trait UrlGenerator: Send + Sync {
    fn generate_url(
        &self,
        request: &Request,
        route: &str,
        params: &Map<String, Value>,
        absolute: bool,
    ) -> Result<String>;
}

/// Named route patterns such as `/posts/:id`.
///
/// `:name` segments are filled from the parameters; parameters left over
/// become the query string in the order given.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: IndexMap<String, String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, pattern: impl Into<String>) {
        self.routes.insert(name.into(), pattern.into());
    }

    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }
}

impl From<IndexMap<String, String>> for RouteTable {
    fn from(routes: IndexMap<String, String>) -> Self {
        Self { routes }
    }
}

impl UrlGenerator for RouteTable {
    fn generate_url(
        &self,
        request: &Request,
        route: &str,
        params: &Map<String, Value>,
        absolute: bool,
    ) -> Result<String> {
        let pattern = self.pattern(route).ok_or_else(|| Error::HelperError {
            helper: "url_for".to_string(),
            message: format!("unknown route '{route}'"),
        })?;

        let mut url = if absolute {
            Url::parse(&format!("{}://{}", request.protocol, request.host))?
        } else {
            Url::parse(RELATIVE_BASE)?
        };

        let mut remaining = params.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| Error::HelperError {
                helper: "url_for".to_string(),
                message: format!("cannot build a path for route '{route}'"),
            })?;
            path.clear();
            let pattern = pattern.trim_start_matches('/');
            for segment in pattern.split('/').filter(|_| !pattern.is_empty()) {
                match segment.strip_prefix(':') {
                    Some(name) => {
                        let value =
                            remaining.shift_remove(name).ok_or_else(|| Error::HelperError {
                                helper: "url_for".to_string(),
                                message: format!("route '{route}' requires parameter '{name}'"),
                            })?;
                        // pushed segments are percent-encoded, `/` included
                        path.push(&param_to_string(&value));
                    }
                    None => {
                        path.push(segment);
                    }
                }
            }
        }

        if !remaining.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &remaining {
                query.append_pair(key, &param_to_string(value));
            }
        }

        if absolute {
            Ok(url.to_string())
        } else {
            Ok(url[Position::BeforePath..].to_string())
        }
    }
}

fn param_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Exposes `url_for(route, params?, absolute?)`.
pub struct UrlHelper<G: UrlGenerator> {
    generator: G,
}

impl<G: UrlGenerator> UrlHelper<G> {
    const METHODS: &'static [(&'static str, &'static str)] = &[("url_for", "url_for")];

    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn url_for(
        &self,
        request: &Request,
        route: &str,
        params: &Map<String, Value>,
        absolute: bool,
    ) -> Result<String> {
        self.generator.generate_url(request, route, params, absolute)
    }
}

impl<G: UrlGenerator> TemplateHelper for UrlHelper<G> {
    fn methods(&self) -> &[(&'static str, &'static str)] {
        Self::METHODS
    }

    fn call(&self, method: &str, request: &Request, args: &[Value]) -> Result<Value> {
        if method != "url_for" {
            return Err(unknown_method("url_for", method));
        }
        let route = string_arg("url_for", args, 0, "route")?;
        let params = match args.get(1) {
            Some(Value::Object(params)) => params.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(Error::HelperError {
                    helper: "url_for".to_string(),
                    message: "argument 2 ('params') must be a map".to_string(),
                })
            }
        };
        let absolute = args.get(2).and_then(Value::as_bool).unwrap_or(false);

        Ok(Value::String(self.url_for(request, route, &params, absolute)?))
    }
}
