use super::{ControllerOutcome, ErrorResponse, Response};
use crate::constants::{DEFAULT_ERROR_STATUS, INTERNAL_ERROR_BODY};
use crate::context::{RenderContext, Request};
use crate::error::Result;
use crate::service::TemplateService;
use log::{debug, error};
use serde_json::{Map, Value};
use std::sync::Arc;

const OK: u16 = 200;

/// Drives a templated response through render, error, redirect and send.
pub struct TemplateResponseHandler {
    service: Arc<TemplateService>,
    content_type: String,
}

impl TemplateResponseHandler {
    pub fn new(service: Arc<TemplateService>, content_type: impl Into<String>) -> Self {
        Self { service, content_type: content_type.into() }
    }

    pub fn service(&self) -> &TemplateService {
        &self.service
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Runs `outcome` and always leaves `response` sent. Failures that survive
    /// the error pipeline become a bare 500; their detail only reaches the log.
    pub async fn handle(
        &self,
        request: &Request,
        response: &mut Response,
        outcome: ControllerOutcome,
    ) {
        if let Err(err) = self.process(request, response, outcome).await {
            error!("Unable to respond to {}: {err}", request.original_url);
            self.on_send_response(response, INTERNAL_ERROR_BODY, DEFAULT_ERROR_STATUS);
        }
    }

    /// Runs `outcome`. A failed render goes through the error pipeline once;
    /// if that fails too the error is returned.
    pub async fn process(
        &self,
        request: &Request,
        response: &mut Response,
        outcome: ControllerOutcome,
    ) -> Result<()> {
        match outcome {
            ControllerOutcome::Template { data, status } => {
                match self.on_render_response(request, response, data, status).await {
                    Ok(()) => Ok(()),
                    Err(err) => {
                        error!("{err}");
                        self.on_error_response(request, response, &ErrorResponse::internal())
                            .await
                    }
                }
            }
            ControllerOutcome::Error(err) => self.on_error_response(request, response, &err).await,
            ControllerOutcome::Redirect { location, status } => {
                self.on_send_redirect(response, &location, status);
                Ok(())
            }
        }
    }

    /// Renders the route's template with `data` and sends it. Nothing is sent
    /// if rendering fails.
    pub async fn on_render_response(
        &self,
        request: &Request,
        response: &mut Response,
        data: Option<Map<String, Value>>,
        status: Option<u16>,
    ) -> Result<()> {
        let status = status.unwrap_or(OK);
        let mut context = RenderContext::from_data(data.unwrap_or_default());

        let body = self.render_route(request, &mut context).await.inspect_err(|err| {
            match &request.route {
                Some(route) => error!(
                    "Failed to render {}::{}: {err}",
                    route.controller, route.action
                ),
                None => error!("Failed to render {}: {err}", request.original_url),
            }
        })?;

        self.on_send_response(response, body, status);
        Ok(())
    }

    /// Sends a redirect when `error` carries a location and a 3xx status,
    /// otherwise renders the error template with `{error: <data>}`.
    pub async fn on_error_response(
        &self,
        request: &Request,
        response: &mut Response,
        error: &ErrorResponse,
    ) -> Result<()> {
        if let Some(location) = error.location() {
            if (300..400).contains(&error.status) {
                debug!("Redirecting {} to {location}", request.original_url);
                copy_headers(error, response);
                self.on_send_redirect(response, location, error.status);
                return Ok(());
            }
        }

        let mut context = RenderContext::new();
        context.insert("error", error.data.clone());
        self.service.enhance_data(request, &mut context);

        let template = self.service.find_template_for_error(request, error).await?;
        let body = self.service.render_template(&template, &context).await?;
        // only a rendered error page carries the error's headers
        copy_headers(error, response);
        self.on_send_response(response, body, error.status);
        Ok(())
    }

    /// Writes `body` once. Returns `false` when the response was already sent.
    pub fn on_send_response(
        &self,
        response: &mut Response,
        body: impl Into<String>,
        status: u16,
    ) -> bool {
        if response.headers_sent() {
            debug!("Response already sent, dropping a {status} body");
            return false;
        }
        if response.header("content-type").is_none() {
            response.set_header("content-type", self.content_type.as_str());
        }
        response.send(status, body)
    }

    /// Writes a redirect once. Returns `false` when the response was already sent.
    pub fn on_send_redirect(&self, response: &mut Response, location: &str, status: u16) -> bool {
        if response.headers_sent() {
            debug!("Response already sent, dropping redirect to {location}");
            return false;
        }
        response.redirect(status, location)
    }

    async fn render_route(&self, request: &Request, context: &mut RenderContext) -> Result<String> {
        self.service.enhance_data(request, context);
        let template = self.service.find_template_for_route(request.route()?)?;
        self.service.render_template(&template, context).await
    }
}

fn copy_headers(error: &ErrorResponse, response: &mut Response) {
    if response.headers_sent() {
        return;
    }
    for (name, value) in error.headers() {
        response.set_header(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Route;
    use crate::descriptor::{DescriptorRegistry, TemplateDescriptor};
    use crate::engine::{EngineRegistry, TemplateEngine};
    use crate::error::Error;
    use crate::helper::HelperRegistry;
    use crate::namespace::NamespaceResolver;
    use crate::resolver::TemplatePathResolver;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use serde_json::json;

    /// Renders `<namespace>|foo=<foo>|error=<error>`; fails on `demo:broken`.
    struct Echo;

    #[async_trait]
    impl TemplateEngine for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn extension(&self) -> &str {
            "echo"
        }

        async fn render(&self, namespace: &str, context: &RenderContext) -> Result<String> {
            if namespace == "demo:broken" {
                return Err(Error::RenderError {
                    namespace: namespace.to_string(),
                    message: "boom".to_string(),
                });
            }
            let foo = context.get("foo").map(Value::to_string).unwrap_or_default();
            let error = context.get("error").map(Value::to_string).unwrap_or_default();
            Ok(format!("{namespace}|foo={foo}|error={error}"))
        }

        async fn find_template_for_error(
            &self,
            _request: &Request,
            _error: &ErrorResponse,
            _template: &TemplateDescriptor,
        ) -> Result<TemplateDescriptor> {
            Ok(TemplateDescriptor::new("demo:default/error"))
        }
    }

    fn handler(exceptions: &[(u16, &str)]) -> TemplateResponseHandler {
        let mut registry = DescriptorRegistry::new();
        registry.register("demo.default", "index", TemplateDescriptor::new("demo:default/index"));
        registry.register("demo.default", "broken", TemplateDescriptor::new("demo:broken"));
        for (status, namespace) in exceptions {
            registry.register_exception(*status, TemplateDescriptor::new(*namespace));
        }

        let mut engines = EngineRegistry::new("echo");
        engines.register(Arc::new(Echo));
        let resolver = TemplatePathResolver::new("/nonexistent", NamespaceResolver::new());
        let service = TemplateService::new(
            registry,
            engines,
            HelperRegistry::new(),
            Arc::new(resolver),
            IndexMap::new(),
        );
        TemplateResponseHandler::new(Arc::new(service), "text/html")
    }

    fn request(action: &str) -> Request {
        Request::new("/").with_route(Route::new("demo.default", action))
    }

    #[tokio::test]
    async fn renders_with_defaults() {
        let handler = handler(&[]);
        let mut response = Response::new();
        let outcome = ControllerOutcome::with_data(json!({"foo": "bar"}));
        handler.process(&request("index"), &mut response, outcome).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.body(), Some("demo:default/index|foo=\"bar\"|error="));
    }

    #[tokio::test]
    async fn keeps_upstream_content_type() {
        let handler = handler(&[]);
        let mut response = Response::new();
        response.set_header("Content-Type", "application/xhtml+xml");
        handler
            .on_render_response(&request("index"), &mut response, None, Some(201))
            .await
            .unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.header("content-type"), Some("application/xhtml+xml"));
    }

    #[test]
    fn send_is_idempotent() {
        let handler = handler(&[]);
        let mut response = Response::new();
        assert!(handler.on_send_response(&mut response, "first", 200));
        assert!(!handler.on_send_response(&mut response, "second", 500));
        assert!(!handler.on_send_redirect(&mut response, "/elsewhere", 302));

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), Some("first"));
        assert_eq!(response.header("location"), None);
    }

    #[tokio::test]
    async fn error_with_location_redirects_without_rendering() {
        let handler = handler(&[(301, "demo:missing")]);
        let mut response = Response::new();
        let error = ErrorResponse::new(301).with_header("Location", "/moved");
        handler.on_error_response(&request("index"), &mut response, &error).await.unwrap();

        assert_eq!(response.status(), 301);
        assert_eq!(response.header("location"), Some("/moved"));
        assert_eq!(response.body(), None);
    }

    #[tokio::test]
    async fn error_renders_status_template_with_wrapped_data() {
        let handler = handler(&[(404, "demo:errors/404")]);
        let mut response = Response::new();
        let error = ErrorResponse::new(404).with_data(json!("no such post"));
        handler
            .process(&request("index"), &mut response, error.into())
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
        assert_eq!(response.body(), Some("demo:errors/404|foo=|error=\"no such post\""));
    }

    #[tokio::test]
    async fn error_falls_back_to_engine_convention() {
        let handler = handler(&[]);
        let mut response = Response::new();
        handler
            .process(&request("index"), &mut response, ErrorResponse::new(403).into())
            .await
            .unwrap();

        assert_eq!(response.status(), 403);
        assert!(response.body().unwrap().starts_with("demo:default/error|"));
    }

    #[tokio::test]
    async fn render_failure_goes_through_error_pipeline_once() {
        let handler = handler(&[(500, "demo:errors/500")]);
        let mut response = Response::new();
        handler
            .process(&request("broken"), &mut response, ControllerOutcome::template())
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let body = response.body().unwrap();
        assert!(body.starts_with("demo:errors/500|"));
        assert!(!body.contains("boom"));
    }

    #[tokio::test]
    async fn unmapped_route_sends_generic_500() {
        let handler = handler(&[]);
        let mut response = Response::new();
        let request = request("unmapped");

        let err = handler
            .process(&request, &mut Response::new(), ControllerOutcome::template())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DescriptorNotFound { .. }));

        handler.handle(&request, &mut response, ControllerOutcome::template()).await;
        assert_eq!(response.status(), 500);
        assert_eq!(response.body(), Some(INTERNAL_ERROR_BODY));
        assert!(response.headers_sent());
    }

    #[tokio::test]
    async fn unrouted_request_is_a_failure_not_a_blank_page() {
        let handler = handler(&[]);
        let mut response = Response::new();
        let outcome = ControllerOutcome::template();
        handler.handle(&Request::new("/nowhere"), &mut response, outcome).await;
        assert_eq!(response.status(), 500);
        assert_eq!(response.body(), Some(INTERNAL_ERROR_BODY));
    }

    #[tokio::test]
    async fn failed_error_page_does_not_leak_error_headers() {
        let handler = handler(&[]);
        let mut response = Response::new();
        let error = ErrorResponse::new(500)
            .with_header("Location", "/stale")
            .with_header("X-Reason", "upstream");
        handler.handle(&request("unmapped"), &mut response, error.into()).await;

        assert_eq!(response.status(), 500);
        assert_eq!(response.body(), Some(INTERNAL_ERROR_BODY));
        assert_eq!(response.header("location"), None);
        assert_eq!(response.header("x-reason"), None);
    }

    #[tokio::test]
    async fn rendered_error_page_keeps_error_headers() {
        let handler = handler(&[(404, "demo:errors/404")]);
        let mut response = Response::new();
        let error = ErrorResponse::new(404).with_header("X-Reason", "gone");
        handler.handle(&request("index"), &mut response, error.into()).await;

        assert_eq!(response.status(), 404);
        assert_eq!(response.header("x-reason"), Some("gone"));
        assert!(response.body().unwrap().starts_with("demo:errors/404|"));
    }

    #[tokio::test]
    async fn redirect_outcome() {
        let handler = handler(&[]);
        let mut response = Response::new();
        let outcome = ControllerOutcome::redirect("/login");
        handler.handle(&request("index"), &mut response, outcome).await;
        assert_eq!(response.status(), 302);
        assert_eq!(response.header("location"), Some("/login"));
    }
}
