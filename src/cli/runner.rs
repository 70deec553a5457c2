use crate::{
    app::ViewApplication,
    cli::{Commands, RenderArgs, ResolveArgs},
    context::{RenderContext, Request, Route},
    error::{Error, Result},
    ioutils::read_data,
    response::{ControllerOutcome, Response},
};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Main CLI runner dispatching to the requested command.
pub struct Runner {
    command: Commands,
}

impl Runner {
    pub fn new(command: Commands) -> Self {
        Self { command }
    }

    pub async fn run(self) -> Result<()> {
        let output = match &self.command {
            Commands::Render(args) => render(args).await?,
            Commands::Resolve(args) => resolve(args).await?.display().to_string(),
        };
        println!("{output}");
        Ok(())
    }
}

/// Renders a route through the full response lifecycle, or a namespace
/// straight through the template service.
pub async fn render(args: &RenderArgs) -> Result<String> {
    let app = ViewApplication::load(&args.project)?;
    let data = read_data(args.data.as_deref())?;
    let mut request = Request::new(&args.url);

    let response = if let Some(route) = &args.route {
        request = request.with_route(Route::parse(route)?);
        let outcome = ControllerOutcome::Template { data: Some(data), status: args.status };
        app.respond(&request, outcome).await
    } else {
        let namespace = args.namespace.as_deref().ok_or_else(|| {
            Error::ConfigValidation("either --route or --namespace is required".into())
        })?;
        let mut context = RenderContext::from_data(data);
        let body = app
            .service()
            .render_template_for_request(&request, namespace, &mut context)
            .await?;
        let mut response = Response::new();
        app.handler().on_send_response(&mut response, body, args.status.unwrap_or(200));
        response
    };

    Ok(format_response(&response))
}

pub async fn resolve(args: &ResolveArgs) -> Result<PathBuf> {
    let app = ViewApplication::load(&args.project)?;
    let engines = app.service().engines();
    let engine = engines.resolve(args.engine.as_deref().unwrap_or(engines.default_engine()));
    app.resolver().resolve_path(&args.namespace, engine.extension()).await
}

/// `HTTP/1.1 <status>`, the headers, a blank line, then the body.
pub fn format_response(response: &Response) -> String {
    let mut out = format!("HTTP/1.1 {}\n", response.status());
    for (name, value) in response.headers() {
        let _ = writeln!(out, "{name}: {value}");
    }
    out.push('\n');
    out.push_str(response.body().unwrap_or_default());
    out
}

pub async fn run(command: Commands) -> Result<()> {
    Runner::new(command).run().await
}
