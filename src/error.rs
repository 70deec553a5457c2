use crate::constants::exit_codes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON. Original error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse YAML. Original error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to build URL. Original error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Failed to render. Original error: {0}")]
    MinijinjaError(#[from] minijinja::Error),

    /// No template registered for a controller action.
    #[error("Template not found for: {controller}::{action}")]
    DescriptorNotFound { controller: String, action: String },

    /// No registered template carries the requested namespace.
    #[error("Template not found for: {namespace}")]
    NamespaceNotFound { namespace: String },

    /// The request was never routed to a controller action.
    #[error("Request '{url}' has no resolved route.")]
    UnroutedRequest { url: String },

    #[error("Invalid template namespace '{namespace}': {reason}.")]
    InvalidNamespace { namespace: String, reason: String },

    #[error("Unknown bundle '{bundle}' in template namespace '{namespace}'.")]
    UnknownBundle { bundle: String, namespace: String },

    /// The packaged default for a namespace is missing on disk.
    #[error("Cannot resolve template '{namespace}': '{path}' does not exist.")]
    TemplatePathUnresolvable { namespace: String, path: String },

    #[error("Failed to render template '{namespace}': {message}")]
    RenderError { namespace: String, message: String },

    #[error("No {kind} registered as '{id}'.")]
    NotRegistered { kind: &'static str, id: String },

    #[error("Template helper '{helper}' failed: {message}")]
    HelperError { helper: String, message: String },

    #[error("No configuration file found in '{project_dir}'. Tried: {config_files}.")]
    ConfigNotFound { project_dir: String, config_files: String },

    #[error("Configuration error: {0}.")]
    ConfigValidation(String),
}

/// Convenience type alias for Results with [`Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(exit_codes::FAILURE);
}
