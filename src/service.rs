//! The facade that finds templates, enriches render data and dispatches to
//! engines.

use crate::constants::CONGA_CONTEXT_KEY;
use crate::context::{RenderContext, Request, Route};
use crate::descriptor::{DescriptorRegistry, TemplateDescriptor};
use crate::engine::{EngineRegistry, TemplateEngine};
use crate::error::{Error, Result};
use crate::helper::HelperRegistry;
use crate::resolver::TemplatePathResolver;
use crate::response::ErrorResponse;
use indexmap::IndexMap;
use log::{debug, error};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// A template given either as a resolved descriptor or by namespace.
#[derive(Debug, Clone, Copy)]
pub enum TemplateRef<'a> {
    Descriptor(&'a TemplateDescriptor),
    Namespace(&'a str),
}

impl<'a> From<&'a TemplateDescriptor> for TemplateRef<'a> {
    fn from(descriptor: &'a TemplateDescriptor) -> Self {
        TemplateRef::Descriptor(descriptor)
    }
}

impl<'a> From<&'a str> for TemplateRef<'a> {
    fn from(namespace: &'a str) -> Self {
        TemplateRef::Namespace(namespace)
    }
}

impl<'a> From<&'a String> for TemplateRef<'a> {
    fn from(namespace: &'a String) -> Self {
        TemplateRef::Namespace(namespace)
    }
}

pub struct TemplateService {
    registry: DescriptorRegistry,
    engines: EngineRegistry,
    helpers: HelperRegistry,
    resolver: Arc<TemplatePathResolver>,
    /// Container-wide parameters exposed as `conga.parameters`
    parameters: IndexMap<String, Value>,
    /// namespace → descriptor, filled on first lookup
    namespace_index: Mutex<HashMap<String, TemplateDescriptor>>,
}

impl TemplateService {
    pub fn new(
        registry: DescriptorRegistry,
        engines: EngineRegistry,
        helpers: HelperRegistry,
        resolver: Arc<TemplatePathResolver>,
        parameters: IndexMap<String, Value>,
    ) -> Self {
        Self {
            registry,
            engines,
            helpers,
            resolver,
            parameters,
            namespace_index: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    /// The descriptor registered for `route`.
    pub fn find_template_for_route(&self, route: &Route) -> Result<TemplateDescriptor> {
        match self.registry.find_route(route) {
            Some(descriptor) => Ok(descriptor.clone()),
            None => {
                error!("template not found for: {}::{}", route.controller, route.action);
                Err(Error::DescriptorNotFound {
                    controller: route.controller.clone(),
                    action: route.action.clone(),
                })
            }
        }
    }

    /// The first registered descriptor with `namespace`, memoized.
    pub fn find_template_for_namespace(&self, namespace: &str) -> Result<TemplateDescriptor> {
        if let Some(descriptor) = self.lock_index().get(namespace) {
            return Ok(descriptor.clone());
        }

        let descriptor = self
            .registry
            .descriptors()
            .find(|descriptor| descriptor.namespace == namespace)
            .cloned()
            .ok_or_else(|| {
                error!("template not found for: {namespace}");
                Error::NamespaceNotFound { namespace: namespace.to_string() }
            })?;

        self.lock_index().insert(namespace.to_string(), descriptor.clone());
        Ok(descriptor)
    }

    /// Error template for `request`: a status-specific exception template if
    /// one is registered, else the convention of the route's own engine.
    pub async fn find_template_for_error(
        &self,
        request: &Request,
        error: &ErrorResponse,
    ) -> Result<TemplateDescriptor> {
        let status = error.status;
        if let Some(descriptor) = self.registry.find_exception(status) {
            debug!("Using exception template '{}' for {status}", descriptor.namespace);
            return Ok(descriptor.clone());
        }

        let template = self.find_template_for_route(request.route()?)?;
        self.select_engine(Some(&template))
            .find_template_for_error(request, error, &template)
            .await
    }

    pub fn select_engine(&self, template: Option<&TemplateDescriptor>) -> Arc<dyn TemplateEngine> {
        self.engines.select(template)
    }

    /// File backing `template`, using its engine's extension.
    pub async fn find_template_path<'a>(
        &self,
        template: impl Into<TemplateRef<'a>>,
    ) -> Result<PathBuf> {
        let descriptor = self.descriptor_for(template.into())?;
        let engine = self.select_engine(Some(&descriptor));
        self.resolver.resolve_path(&descriptor.namespace, engine.extension()).await
    }

    /// Adds the reserved `conga` entry and binds every helper into `context`.
    pub fn enhance_data(&self, request: &Request, context: &mut RenderContext) {
        context.insert(
            CONGA_CONTEXT_KEY,
            json!({
                "request": request,
                "security": request.security,
                "parameters": self.parameters,
            }),
        );
        self.helpers.bind(&Arc::new(request.clone()), context);
    }

    pub async fn render_template<'a>(
        &self,
        template: impl Into<TemplateRef<'a>>,
        context: &RenderContext,
    ) -> Result<String> {
        let descriptor = self.descriptor_for(template.into())?;
        self.select_engine(Some(&descriptor)).render(&descriptor.namespace, context).await
    }

    /// [`Self::enhance_data`] followed by [`Self::render_template`].
    pub async fn render_template_for_request<'a>(
        &self,
        request: &Request,
        template: impl Into<TemplateRef<'a>>,
        context: &mut RenderContext,
    ) -> Result<String> {
        self.enhance_data(request, context);
        self.render_template(template, context).await
    }

    fn descriptor_for(&self, template: TemplateRef<'_>) -> Result<TemplateDescriptor> {
        match template {
            TemplateRef::Descriptor(descriptor) => Ok(descriptor.clone()),
            TemplateRef::Namespace(namespace) => self.find_template_for_namespace(namespace),
        }
    }

    fn lock_index(&self) -> MutexGuard<'_, HashMap<String, TemplateDescriptor>> {
        self.namespace_index.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::{PathHelper, TemplateHelper};
    use crate::namespace::NamespaceResolver;
    use async_trait::async_trait;
    use std::fs;

    /// Renders `<engine>:<namespace>:<foo>` and reports sibling error templates.
    struct Recorder(&'static str);

    #[async_trait]
    impl TemplateEngine for Recorder {
        fn name(&self) -> &str {
            self.0
        }

        fn extension(&self) -> &str {
            "rec"
        }

        async fn render(&self, namespace: &str, context: &RenderContext) -> Result<String> {
            let foo = context.get("foo").and_then(Value::as_str).unwrap_or("-");
            Ok(format!("{}:{namespace}:{foo}", self.0))
        }

        async fn find_template_for_error(
            &self,
            _request: &Request,
            _error: &ErrorResponse,
            template: &TemplateDescriptor,
        ) -> Result<TemplateDescriptor> {
            Ok(TemplateDescriptor::new(format!("{}#error", template.namespace)))
        }
    }

    fn service(registry: DescriptorRegistry) -> TemplateService {
        let resolver = TemplatePathResolver::new("/nonexistent", NamespaceResolver::new());
        service_with(registry, resolver)
    }

    fn service_with(
        registry: DescriptorRegistry,
        resolver: TemplatePathResolver,
    ) -> TemplateService {
        let mut engines = EngineRegistry::new("rec");
        engines.register(Arc::new(Recorder("rec")));

        let mut helpers = HelperRegistry::new();
        helpers.register("path", Arc::new(PathHelper) as Arc<dyn TemplateHelper>);

        let mut parameters = IndexMap::new();
        parameters.insert("custom".to_string(), json!("a custom parameter"));

        TemplateService::new(registry, engines, helpers, Arc::new(resolver), parameters)
    }

    fn registry() -> DescriptorRegistry {
        let mut registry = DescriptorRegistry::new();
        registry.register("demo.default", "index", TemplateDescriptor::new("demo:default/index"));
        registry.register(
            "demo.default",
            "twig",
            TemplateDescriptor::new("demo:default/twig").with_engine("twig"),
        );
        registry
    }

    fn routed(action: &str) -> Request {
        Request::new("/").with_route(Route::new("demo.default", action))
    }

    #[test]
    fn route_lookup_is_exact() {
        let service = service(registry());
        assert_eq!(
            service.find_template_for_route(&Route::new("demo.default", "index")).unwrap(),
            TemplateDescriptor::new("demo:default/index")
        );
        let err = service.find_template_for_route(&Route::new("demo.default", "nope")).unwrap_err();
        assert!(matches!(err, Error::DescriptorNotFound { action, .. } if action == "nope"));
    }

    #[test]
    fn namespace_lookup_is_memoized() {
        let service = service(registry());
        let found = service.find_template_for_namespace("demo:default/twig").unwrap();
        assert_eq!(found.engine.as_deref(), Some("twig"));
        assert_eq!(service.lock_index().len(), 1);

        service.find_template_for_namespace("demo:default/twig").unwrap();
        assert_eq!(service.lock_index().len(), 1);

        assert!(matches!(
            service.find_template_for_namespace("demo:missing"),
            Err(Error::NamespaceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn exception_template_beats_engine_convention() {
        let mut registry = registry();
        registry.register_exception(404, TemplateDescriptor::new("demo:errors/404"));
        let service = service(registry);

        let not_found = service
            .find_template_for_error(&routed("index"), &ErrorResponse::new(404))
            .await
            .unwrap();
        assert_eq!(not_found.namespace, "demo:errors/404");

        let server_error = service
            .find_template_for_error(&routed("index"), &ErrorResponse::new(500))
            .await
            .unwrap();
        assert_eq!(server_error.namespace, "demo:default/index#error");
    }

    #[tokio::test]
    async fn error_lookup_propagates_route_failures() {
        let service = service(registry());
        let err = service
            .find_template_for_error(&routed("unmapped"), &ErrorResponse::new(500))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DescriptorNotFound { .. }));
    }

    #[test]
    fn enhance_data_injects_request_parameters_and_helpers() {
        let service = service(registry());
        let request = routed("index").with_security(json!({"user": "alice"}));
        let mut context = RenderContext::new();
        context.insert("foo", json!("bar"));

        service.enhance_data(&request, &mut context);

        let conga = context.get(CONGA_CONTEXT_KEY).unwrap();
        assert_eq!(conga["request"]["original_url"], json!("/"));
        assert_eq!(conga["security"], json!({"user": "alice"}));
        assert_eq!(conga["parameters"]["custom"], json!("a custom parameter"));
        assert_eq!(context.get("foo"), Some(&json!("bar")));
        assert_eq!(context.call("path", &[json!("a.css")]).unwrap(), json!("/a.css"));
    }

    #[tokio::test]
    async fn renders_by_descriptor_or_namespace() {
        let service = service(registry());
        let mut context = RenderContext::new();
        context.insert("foo", json!("bar"));

        let descriptor = TemplateDescriptor::new("demo:default/index");
        assert_eq!(
            service.render_template(&descriptor, &context).await.unwrap(),
            "rec:demo:default/index:bar"
        );
        assert_eq!(
            service.render_template("demo:default/index", &context).await.unwrap(),
            "rec:demo:default/index:bar"
        );
        assert!(service.render_template("demo:unknown", &context).await.is_err());
    }

    #[tokio::test]
    async fn unregistered_engine_renders_through_error_engine() {
        let service = service(registry());
        let err =
            service.render_template("demo:default/twig", &RenderContext::new()).await.unwrap_err();
        assert!(err.to_string().contains("No template engine is defined for demo:default/twig"));
    }

    #[tokio::test]
    async fn template_path_prefers_app_override_over_bundle_default() {
        let dir = tempfile::tempdir().unwrap();
        let bundle_views = dir.path().join("demo/lib/resources/views/default");
        let override_views = dir.path().join("app/resources/demo/views/default");
        fs::create_dir_all(&bundle_views).unwrap();
        fs::create_dir_all(&override_views).unwrap();
        fs::write(bundle_views.join("index.rec"), "bundle").unwrap();
        fs::write(bundle_views.join("page.rec"), "bundle").unwrap();
        fs::write(override_views.join("page.rec"), "override").unwrap();

        let mut namespaces = NamespaceResolver::new();
        namespaces.register_bundle("demo", dir.path().join("demo"));
        let resolver = TemplatePathResolver::new(dir.path().join("app/resources"), namespaces);
        let mut registry = registry();
        registry.register("demo.default", "page", TemplateDescriptor::new("demo:default/page"));
        let service = service_with(registry, resolver);

        let index = TemplateDescriptor::new("demo:default/index");
        assert_eq!(
            service.find_template_path(&index).await.unwrap(),
            bundle_views.join("index.rec")
        );
        assert_eq!(
            service.find_template_path("demo:default/page").await.unwrap(),
            override_views.join("page.rec")
        );
    }

    #[tokio::test]
    async fn template_path_of_unknown_namespace_is_an_error() {
        let service = service(registry());
        assert!(matches!(
            service.find_template_path("demo:missing").await,
            Err(Error::NamespaceNotFound { .. })
        ));
        assert!(matches!(
            service.find_template_path("demo:default/index").await,
            Err(Error::UnknownBundle { .. })
        ));
    }
}
