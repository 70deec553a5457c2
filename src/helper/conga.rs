use super::{unknown_method, TemplateHelper};
use crate::context::Request;
use crate::error::Result;
use indexmap::IndexMap;
use serde_json::Value;

/// Exposes `conga_init(group?)`, a script tag bootstrapping the browser-side
/// `Conga` object with one group of the `client` configuration.
#[derive(Debug, Clone, Default)]
pub struct CongaHelper {
    client: IndexMap<String, Value>,
}

impl CongaHelper {
    const METHODS: &'static [(&'static str, &'static str)] = &[("conga_init", "init")];

    pub fn new(client: IndexMap<String, Value>) -> Self {
        Self { client }
    }

    /// Unknown or absent groups bootstrap with an empty object.
    pub fn init(&self, group: Option<&str>) -> String {
        let config = group
            .and_then(|group| self.client.get(group))
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        format!(
            concat!(
                "<script type=\"text/javascript\">",
                "var conga = (function(Conga) {{ ",
                "try {{ return new Conga({}); }} ",
                "catch (e) {{ console.error(e.stack || e); return new Conga({{}}); }} ",
                "}}(Conga));",
                "</script>"
            ),
            script_safe(&config)
        )
    }
}

/// JSON with `</` broken up so the payload cannot close the script element.
fn script_safe(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

impl TemplateHelper for CongaHelper {
    fn methods(&self) -> &[(&'static str, &'static str)] {
        Self::METHODS
    }

    fn call(&self, method: &str, _request: &Request, args: &[Value]) -> Result<Value> {
        match method {
            "init" => Ok(Value::String(self.init(args.first().and_then(Value::as_str)))),
            other => Err(unknown_method("conga_init", other)),
        }
    }
}
