use super::TemplateEngine;
use crate::constants::ERROR_ENGINE;
use crate::context::{RenderContext, Request};
use crate::descriptor::TemplateDescriptor;
use crate::error::{Error, Result};
use crate::response::ErrorResponse;
use async_trait::async_trait;

/// Stands in for any engine that is not registered. Never renders content.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorEngine;

#[async_trait]
impl TemplateEngine for ErrorEngine {
    fn name(&self) -> &str {
        ERROR_ENGINE
    }

    fn extension(&self) -> &str {
        ""
    }

    async fn render(&self, namespace: &str, _context: &RenderContext) -> Result<String> {
        Err(Error::RenderError {
            namespace: namespace.to_string(),
            message: format!("No template engine is defined for {namespace}"),
        })
    }

    async fn find_template_for_error(
        &self,
        request: &Request,
        _error: &ErrorResponse,
        template: &TemplateDescriptor,
    ) -> Result<TemplateDescriptor> {
        Err(Error::RenderError {
            namespace: template.namespace.clone(),
            message: format!("No template engine is defined for {}", request.original_url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn render_explains_the_missing_engine() {
        let err = ErrorEngine.render("demo:index", &RenderContext::new()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to render template 'demo:index': No template engine is defined for demo:index"
        );
    }

    #[tokio::test]
    async fn has_no_error_template() {
        let result = ErrorEngine
            .find_template_for_error(
                &Request::new("/broken"),
                &ErrorResponse::new(500),
                &TemplateDescriptor::new("demo:index"),
            )
            .await;
        assert!(matches!(
            result,
            Err(Error::RenderError { message, .. }) if message.ends_with("/broken")
        ));
    }
}
