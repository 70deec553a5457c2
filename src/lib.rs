/// Handles argument parsing and the preview commands.
pub mod cli;

/// Defines custom error types.
pub mod error;

/// Names and defaults shared across the crate.
pub mod constants;

/// Loading and validation of the view manifest.
pub mod config;

/// Template namespaces and bundle directories.
pub mod namespace;

/// Template descriptors and their registry.
pub mod descriptor;

/// Resolves namespaces to template files.
pub mod resolver;

/// Typed registry lookup.
pub mod lookup;

/// Template engines and engine selection.
pub mod engine;

/// Functions exposed to templates.
pub mod helper;

/// Request data and the render context.
pub mod context;

/// The template service facade.
pub mod service;

/// Response lifecycle integration.
pub mod response;

/// Wires a project's view layer together.
pub mod app;

/// A set of helpers for reading CLI input.
pub mod ioutils;
