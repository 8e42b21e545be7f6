//! External collaborator ports: module loading, index fetching, rendering.

use std::sync::Arc;

use async_trait::async_trait;
use storyframe_domain::{ModuleExports, StoriesList};
use storyframe_shared::ExceptionPayload;

use super::error::{LoadError, RenderError};
use super::types::RenderSurface;
use crate::entities::Story;
use crate::use_cases::preview::{DocsContext, DocsPage, RenderContext};

/// Imports a story module by path.
///
/// Returning the same `Arc` for an unchanged module is what keeps parsed CSF
/// files identity-stable across hot reloads of unrelated modules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn import(&self, path: &str) -> Result<Arc<ModuleExports>, LoadError>;
}

/// Fetches the current stories index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoriesIndexSource: Send + Sync {
    async fn fetch(&self) -> Result<StoriesList, LoadError>;
}

/// The framework-specific render step.
///
/// Implementations call `context.story_fn()` to obtain the element, mount it on
/// `surface`, and call `context.show_main()` once something is visible.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render_to_dom(
        &self,
        context: RenderContext,
        surface: &RenderSurface,
    ) -> Result<(), RenderError>;
}

/// Renders a documentation page for a component.
#[async_trait]
pub trait DocsRenderer: Send + Sync {
    async fn render_docs(
        &self,
        context: DocsContext,
        page: DocsPage,
        surface: &RenderSurface,
    ) -> Result<(), RenderError>;
}

/// The host's display: where stories mount and how errors are shown.
pub trait PreviewView: Send + Sync {
    /// Prepare the story root for `story` and return it.
    fn prepare_for_story(&self, story: &Story) -> RenderSurface;

    /// Prepare the docs root and return it.
    fn prepare_for_docs(&self) -> RenderSurface;

    /// Unmount whatever was rendered into the docs root.
    fn release_docs_surface(&self);

    fn show_main(&self);

    fn show_no_preview(&self);

    fn show_error_display(&self, error: &ExceptionPayload);
}
