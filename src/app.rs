//! Builds the view layer of a project from its manifest.

use crate::config::ViewConfig;
use crate::constants::helpers as helper_ids;
use crate::context::Request;
use crate::descriptor::DescriptorRegistry;
use crate::engine::{EngineRegistry, MiniJinjaEngine};
use crate::error::Result;
use crate::helper::{CongaHelper, HelperRegistry, PathHelper, RouteTable, UrlHelper};
use crate::namespace::NamespaceResolver;
use crate::resolver::TemplatePathResolver;
use crate::response::{ControllerOutcome, Response, TemplateResponseHandler};
use crate::service::TemplateService;
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// Every view component of one project, wired together.
pub struct ViewApplication {
    config: ViewConfig,
    resolver: Arc<TemplatePathResolver>,
    service: Arc<TemplateService>,
    handler: TemplateResponseHandler,
}

impl ViewApplication {
    /// Loads the manifest in `project_dir` and builds the application.
    pub fn load<P: AsRef<Path>>(project_dir: P) -> Result<Self> {
        Self::from_config(ViewConfig::load(project_dir)?)
    }

    pub fn from_config(config: ViewConfig) -> Result<Self> {
        config.validate()?;

        let mut namespaces = NamespaceResolver::new();
        for (bundle, root) in &config.bundles {
            namespaces.register_bundle(bundle, root);
        }
        let resolver = Arc::new(TemplatePathResolver::new(config.app_resources(), namespaces));

        let mut engines = EngineRegistry::new(&config.default_engine);
        engines.register(Arc::new(MiniJinjaEngine::new(Arc::clone(&resolver))));

        let mut helpers = HelperRegistry::new();
        helpers.register(helper_ids::PATH, Arc::new(PathHelper));
        helpers.register(
            helper_ids::URL,
            Arc::new(UrlHelper::new(RouteTable::from(config.routes.clone()))),
        );
        helpers.register(helper_ids::CONGA, Arc::new(CongaHelper::new(config.client.clone())));

        let mut registry = DescriptorRegistry::new();
        for (service_id, controller) in &config.controllers {
            let source = controller.source(service_id);
            registry.register_annotations(&source, &controller.annotations());
        }
        for (status, exception) in &config.exceptions {
            registry.register_exception(*status, exception.descriptor());
        }
        info!(
            "Registered {} templates, default engine '{}'",
            registry.len(),
            config.default_engine
        );
        debug!("Engines: {}", engines.names().collect::<Vec<_>>().join(", "));

        let service = Arc::new(TemplateService::new(
            registry,
            engines,
            helpers,
            Arc::clone(&resolver),
            config.parameters.clone(),
        ));
        let handler = TemplateResponseHandler::new(Arc::clone(&service), &config.content_type);

        Ok(Self { config, resolver, service, handler })
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TemplatePathResolver {
        &self.resolver
    }

    pub fn service(&self) -> &TemplateService {
        &self.service
    }

    pub fn handler(&self) -> &TemplateResponseHandler {
        &self.handler
    }

    /// Answers `request` with what its controller produced.
    pub async fn respond(&self, request: &Request, outcome: ControllerOutcome) -> Response {
        let mut response = Response::new();
        self.handler.handle(request, &mut response, outcome).await;
        response
    }
}
