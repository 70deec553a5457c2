use crate::constants::{exit_codes, verbosity};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// Renders and resolves the views of a project.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render a controller action or a template and print the HTTP response.
    Render(RenderArgs),
    /// Print the file a template namespace resolves to.
    Resolve(ResolveArgs),
}

impl Commands {
    pub fn verbose(&self) -> u8 {
        match self {
            Commands::Render(args) => args.verbose,
            Commands::Resolve(args) => args.verbose,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Project directory containing the view manifest.
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Controller action to render, as `<controller>::<action>`.
    #[arg(long, conflicts_with = "namespace", required_unless_present = "namespace")]
    pub route: Option<String>,

    /// Template namespace to render directly, as `bundle:path`.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Render data as a JSON object, or `-` to read it from stdin.
    #[arg(short, long)]
    pub data: Option<String>,

    /// Response status for a successful render.
    #[arg(short, long)]
    pub status: Option<u16>,

    /// Request URL reported to templates.
    #[arg(long, default_value = "/")]
    pub url: String,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Project directory containing the view manifest.
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Template namespace, as `bundle:path`.
    #[arg(value_name = "NAMESPACE")]
    pub namespace: String,

    /// Engine whose file extension is used. Defaults to the configured engine.
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse command line arguments with custom handling for missing required inputs.
pub fn get_args() -> Cli {
    Cli::try_parse().unwrap_or_else(|e| {
        if e.kind() == ErrorKind::MissingRequiredArgument {
            let mut command = Cli::command().help_template(HELP_TEMPLATE);
            if let Err(print_err) = command.print_help() {
                eprintln!("Failed to display help information: {print_err}");
            } else {
                println!();
            }
            std::process::exit(exit_codes::FAILURE);
        } else {
            e.exit();
        }
    })
}

/// Map `-v` counts to the appropriate log level.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Error,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_verbose_flags_to_log_filters() {
        assert_eq!(get_log_level_from_verbose(verbosity::OFF), LevelFilter::Error);
        assert_eq!(get_log_level_from_verbose(verbosity::INFO), LevelFilter::Info);
        assert_eq!(get_log_level_from_verbose(verbosity::DEBUG), LevelFilter::Debug);
        assert_eq!(get_log_level_from_verbose(verbosity::TRACE), LevelFilter::Trace);
        assert_eq!(get_log_level_from_verbose(verbosity::TRACE + 1), LevelFilter::Trace);
    }

    #[test]
    fn parses_render_by_route() {
        let cli = Cli::parse_from([
            "conga-view",
            "render",
            "project",
            "--route",
            "demo.controller.default::index",
            "--data",
            r#"{"foo":"bar"}"#,
            "-vv",
        ]);
        let Commands::Render(args) = &cli.command else { panic!("expected render") };
        assert_eq!(args.project, PathBuf::from("project"));
        assert_eq!(args.route.as_deref(), Some("demo.controller.default::index"));
        assert_eq!(args.data.as_deref(), Some(r#"{"foo":"bar"}"#));
        assert_eq!(args.url, "/");
        assert_eq!(cli.command.verbose(), 2);
    }

    #[test]
    fn render_needs_exactly_one_target() {
        assert!(Cli::try_parse_from(["conga-view", "render", "project"]).is_err());
        assert!(Cli::try_parse_from([
            "conga-view",
            "render",
            "project",
            "--route",
            "a::b",
            "--namespace",
            "demo:x"
        ])
        .is_err());
    }

    #[test]
    fn parses_resolve() {
        let cli = Cli::parse_from([
            "conga-view",
            "resolve",
            "project",
            "demo:default/index",
            "-e",
            "jinja",
        ]);
        let Commands::Resolve(args) = cli.command else { panic!("expected resolve") };
        assert_eq!(args.namespace, "demo:default/index");
        assert_eq!(args.engine.as_deref(), Some("jinja"));
    }
}
