use super::filters::register_filters;
use super::TemplateEngine;
use crate::constants::ERROR_TEMPLATE_NAME;
use crate::context::{HelperFn, RenderContext, Request};
use crate::descriptor::TemplateDescriptor;
use crate::error::{Error, Result};
use crate::namespace::Namespace;
use crate::resolver::TemplatePathResolver;
use crate::response::ErrorResponse;
use async_trait::async_trait;
use log::{debug, error};
use minijinja::value::{Rest, Value};
use minijinja::{AutoEscape, Environment, ErrorKind};
use std::sync::Arc;

/// Name the engine registers under.
pub const NAME: &str = "jinja";

/// File extension of MiniJinja view templates.
pub const EXTENSION: &str = "jinja";

/// MiniJinja engine whose template names are namespaces.
///
/// The top-level template is resolved and read asynchronously; templates it
/// pulls in with `extends`, `include` or `import` go through the same
/// override rules via the environment loader.
pub struct MiniJinjaEngine {
    /// Shared environment with filters and the namespace loader installed
    env: Environment<'static>,
    resolver: Arc<TemplatePathResolver>,
}

impl MiniJinjaEngine {
    pub fn new(resolver: Arc<TemplatePathResolver>) -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        register_filters(&mut env);

        let loader_resolver = Arc::clone(&resolver);
        env.set_loader(move |name| load_namespace(&loader_resolver, name));

        Self { env, resolver }
    }

    /// Copy of the shared environment with the context's helpers installed
    /// as template functions.
    fn environment_for(&self, context: &RenderContext) -> Environment<'static> {
        let mut env = self.env.clone();
        for (name, function) in context.functions() {
            let function = Arc::clone(function);
            env.add_function(name.to_string(), move |args: Rest<Value>| {
                call_helper(&function, &args)
            });
        }
        env
    }
}

#[async_trait]
impl TemplateEngine for MiniJinjaEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn extension(&self) -> &str {
        EXTENSION
    }

    async fn render(&self, namespace: &str, context: &RenderContext) -> Result<String> {
        let path = self.resolver.resolve_path(namespace, EXTENSION).await?;
        debug!("Rendering '{namespace}' from '{}'", path.display());
        let source = tokio::fs::read_to_string(&path).await?;

        let env = self.environment_for(context);
        let data = context.data().clone();
        let name = namespace.to_string();

        // evaluation and the loader touch the filesystem synchronously
        tokio::task::spawn_blocking(move || render_source(env, name, source, &data))
            .await
            .map_err(|e| Error::RenderError {
                namespace: namespace.to_string(),
                message: format!("render task failed: {e}"),
            })?
    }

    /// The `error` template next to the route's own template.
    async fn find_template_for_error(
        &self,
        request: &Request,
        error: &ErrorResponse,
        template: &TemplateDescriptor,
    ) -> Result<TemplateDescriptor> {
        let sibling = Namespace::parse(&template.namespace)?.sibling(ERROR_TEMPLATE_NAME);
        debug!(
            "Using '{sibling}' for status {} on '{}'",
            error.status, request.original_url
        );
        Ok(TemplateDescriptor { namespace: sibling.to_string(), engine: template.engine.clone() })
    }
}

fn render_source(
    mut env: Environment<'static>,
    name: String,
    source: String,
    data: &serde_json::Map<String, serde_json::Value>,
) -> Result<String> {
    env.add_template_owned(name.clone(), source).map_err(|e| render_error(&name, e))?;
    let template = env.get_template(&name).map_err(|e| render_error(&name, e))?;
    template.render(data).map_err(|e| render_error(&name, e))
}

fn load_namespace(
    resolver: &TemplatePathResolver,
    name: &str,
) -> Result<Option<String>, minijinja::Error> {
    let path = resolver.resolve_path_blocking(name, EXTENSION).map_err(|e| {
        minijinja::Error::new(ErrorKind::TemplateNotFound, e.to_string())
    })?;
    std::fs::read_to_string(&path).map(Some).map_err(|e| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read '{}'", path.display()),
        )
        .with_source(e)
    })
}

fn call_helper(function: &HelperFn, args: &[Value]) -> Result<Value, minijinja::Error> {
    let args = args
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    match function(&args) {
        // helpers emit markup and URLs, which must not be escaped again
        Ok(serde_json::Value::String(s)) => Ok(Value::from_safe_string(s)),
        Ok(other) => Ok(Value::from_serialize(&other)),
        Err(e) => Err(minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string())),
    }
}

fn render_error(namespace: &str, err: minijinja::Error) -> Error {
    error!("Failed to render '{namespace}': {err:#}");
    Error::RenderError { namespace: namespace.to_string(), message: err.to_string() }
}
