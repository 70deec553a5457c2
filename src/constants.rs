//! Constants used throughout conga-view

/// Configuration file names in order of preference
pub const CONFIG_FILENAMES: &[&str] = &["views.json", "views.yaml", "views.yml"];

/// Engine used when neither the template nor the configuration names one
pub const DEFAULT_ENGINE: &str = "jinja";

/// Name of the universal fallback engine
pub const ERROR_ENGINE: &str = "_error";

/// Content type written for rendered responses
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Application directory, relative to the project root
pub const DEFAULT_APP_PATH: &str = "app";

/// Directory under the application path holding template overrides
pub const APP_RESOURCES_DIR: &str = "resources";

/// Subpath injected into a namespace when building an override path
pub const VIEWS_SUBPATH: &str = "views";

/// Packaged default views directory, relative to a bundle root
pub const BUNDLE_VIEWS_SUBPATH: &str = "lib/resources/views";

/// Separator between the bundle and the relative path of a namespace
pub const NAMESPACE_SEPARATOR: char = ':';

/// Reserved render context key carrying request and parameters
pub const CONGA_CONTEXT_KEY: &str = "conga";

/// Prefix of exception template keys (`error404`, `error500`, ...)
pub const EXCEPTION_KEY_PREFIX: &str = "error";

/// Sibling template an engine falls back to for error responses
pub const ERROR_TEMPLATE_NAME: &str = "error";

/// Status used when an error carries none
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// Status used when a redirect carries none
pub const DEFAULT_REDIRECT_STATUS: u16 = 302;

/// Body sent when every rendering path has failed
pub const INTERNAL_ERROR_BODY: &str = "Internal error";

/// STDIN indicator for CLI arguments
pub const STDIN_INDICATOR: &str = "-";

/// Service ids of the built-in template helpers
pub mod helpers {
    pub const PATH: &str = "conga.view.helper.path";
    pub const URL: &str = "conga.view.helper.url";
    pub const CONGA: &str = "conga.view.helper.conga";
}

/// Exit codes
pub mod exit_codes {
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
