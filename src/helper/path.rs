use super::{string_arg, unknown_method, TemplateHelper};
use crate::context::Request;
use crate::error::Result;
use serde_json::Value;

/// Web paths for static assets: `path('css/site.css')` → `/css/site.css`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathHelper;

impl PathHelper {
    const METHODS: &'static [(&'static str, &'static str)] = &[("path", "path")];

    /// Absolute web path for `name`, with `.` and `..` segments collapsed.
    pub fn path(&self, name: &str) -> String {
        let mut segments: Vec<&str> = Vec::new();
        for segment in name.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                segment => segments.push(segment),
            }
        }
        format!("/{}", segments.join("/"))
    }
}

impl TemplateHelper for PathHelper {
    fn methods(&self) -> &[(&'static str, &'static str)] {
        Self::METHODS
    }

    fn call(&self, method: &str, _request: &Request, args: &[Value]) -> Result<Value> {
        match method {
            "path" => Ok(Value::String(self.path(string_arg("path", args, 0, "name")?))),
            other => Err(unknown_method("path", other)),
        }
    }
}
