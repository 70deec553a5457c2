//! Pluggable template engines.
//!
//! - `fallback`: the `_error` engine every failed selection lands on
//! - `registry`: engine lookup by name with the fallback policy
//! - `minijinja`: the file-backed MiniJinja engine
//! - `filters`: filters registered on the MiniJinja environment

pub mod fallback;
pub mod filters;
pub mod minijinja;
pub mod registry;

pub use fallback::ErrorEngine;
pub use self::minijinja::MiniJinjaEngine;
pub use registry::EngineRegistry;

use crate::context::{RenderContext, Request};
use crate::descriptor::TemplateDescriptor;
use crate::error::Result;
use crate::response::ErrorResponse;
use async_trait::async_trait;

/// Contract every rendering engine implements.
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// Name the engine is registered and selected under.
    fn name(&self) -> &str;

    /// File extension of this engine's templates, without the dot.
    fn extension(&self) -> &str;

    /// Renders the template identified by `namespace`.
    ///
    /// # Errors
    /// * `Error::RenderError` / `Error::MinijinjaError` on syntax or runtime failures
    /// * `Error::TemplatePathUnresolvable` when no file backs the namespace
    async fn render(&self, namespace: &str, context: &RenderContext) -> Result<String>;

    /// Engine-specific error template for a request whose own route renders
    /// with `template`.
    async fn find_template_for_error(
        &self,
        request: &Request,
        error: &ErrorResponse,
        template: &TemplateDescriptor,
    ) -> Result<TemplateDescriptor>;
}
