//! View configuration
//!
//! This module contains the configuration system components:
//! - `types`: per-controller and per-status template entries
//! - `loader`: manifest discovery, parsing and validation

pub mod loader;
pub mod types;


pub use loader::ViewConfig;
pub use types::{ActionTemplate, ControllerConfig, ExceptionTemplate};
