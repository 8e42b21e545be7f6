//! Headless host adapters.
//!
//! There is no DOM here: the view tracks which display is showing, the
//! renderer keeps the last element written to each surface, and everything
//! is reported through tracing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use storyframe_shared::ExceptionPayload;

use crate::entities::Story;
use crate::infrastructure::ports::{
    DocsRenderer, PreviewView, RenderError, RenderSurface, Renderer,
};
use crate::use_cases::preview::{DocsContext, DocsPage, RenderContext};

/// Which of the host's displays is visible.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Display {
    /// Nothing rendered yet
    #[default]
    Preparing,
    Main,
    NoPreview,
    Error(ExceptionPayload),
}

#[derive(Debug, Default)]
struct ViewState {
    display: Display,
    docs_mounted: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessView {
    state: Mutex<ViewState>,
}

impl HeadlessView {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn display(&self) -> Display {
        self.state().display.clone()
    }

    pub fn docs_mounted(&self) -> bool {
        self.state().docs_mounted
    }
}

impl PreviewView for HeadlessView {
    fn prepare_for_story(&self, story: &Story) -> RenderSurface {
        tracing::debug!(story_id = %story.id, "Preparing story root");
        self.state().display = Display::Preparing;
        RenderSurface::StoryRoot
    }

    fn prepare_for_docs(&self) -> RenderSurface {
        let mut state = self.state();
        state.display = Display::Preparing;
        state.docs_mounted = true;
        RenderSurface::DocsRoot
    }

    fn release_docs_surface(&self) {
        tracing::debug!("Unmounting docs root");
        self.state().docs_mounted = false;
    }

    fn show_main(&self) {
        self.state().display = Display::Main;
    }

    fn show_no_preview(&self) {
        tracing::info!("Showing no-preview display");
        self.state().display = Display::NoPreview;
    }

    fn show_error_display(&self, error: &ExceptionPayload) {
        self.state().display = Display::Error(error.clone());
    }
}

/// Evaluates story functions and keeps their output per surface.
#[derive(Debug, Default)]
pub struct TextRenderer {
    output: Mutex<HashMap<RenderSurface, Value>>,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last element rendered to `surface`.
    pub fn output(&self, surface: &RenderSurface) -> Option<Value> {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(surface)
            .cloned()
    }
}

#[async_trait]
impl Renderer for TextRenderer {
    async fn render_to_dom(
        &self,
        context: RenderContext,
        surface: &RenderSurface,
    ) -> Result<(), RenderError> {
        let element = context.story_fn()?;
        tracing::info!(
            story_id = %context.id,
            surface = %surface,
            remount = context.force_remount,
            element = %element,
            "Rendered story"
        );
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(surface.clone(), element);
        context.show_main();
        Ok(())
    }
}

/// Renders a docs page as an outline: a heading, then every story of the
/// component rendered inline at its anchor.
#[derive(Debug, Default)]
pub struct OutlineDocsRenderer;

impl OutlineDocsRenderer {
    pub fn anchor(story: &Story) -> RenderSurface {
        RenderSurface::Element(format!("anchor--{}", story.id))
    }
}

#[async_trait]
impl DocsRenderer for OutlineDocsRenderer {
    async fn render_docs(
        &self,
        context: DocsContext,
        page: DocsPage,
        surface: &RenderSurface,
    ) -> Result<(), RenderError> {
        tracing::info!(
            title = %context.title,
            surface = %surface,
            page = ?page.page,
            container = ?page.container,
            "Rendering docs page"
        );
        let stories = context.component_stories().map_err(RenderError::failed)?;
        for story in stories {
            let anchor = Self::anchor(&story);
            tracing::debug!(story_id = %story.id, anchor = %anchor, "Rendering inline story");
            context.render_story_to_element(story, anchor).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_tracks_the_visible_display() {
        let view = HeadlessView::new();
        assert_eq!(view.display(), Display::Preparing);

        view.show_error_display(&ExceptionPayload::new("boom"));
        assert_eq!(view.display(), Display::Error(ExceptionPayload::new("boom")));

        assert_eq!(view.prepare_for_docs(), RenderSurface::DocsRoot);
        assert!(view.docs_mounted());
        view.release_docs_surface();
        assert!(!view.docs_mounted());

        view.show_main();
        assert_eq!(view.display(), Display::Main);
    }
}
