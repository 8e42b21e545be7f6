//! Docs page rendering.

use std::sync::Arc;

use serde_json::Value;
use storyframe_domain::{StoryContext, StoryId, ViewMode};

use super::render_context::RenderContext;
use super::story_render::RenderServices;
use super::PreviewError;
use crate::entities::{CsfFile, Story};
use crate::infrastructure::ports::{RenderError, RenderSurface};
use crate::stores::{StoreError, StoryStore};

/// The page and container a story's `docs` parameters ask for.
#[derive(Debug, Clone, PartialEq)]
pub struct DocsPage {
    /// `docs.page`; `None` renders the container's default page
    pub page: Option<Value>,
    /// `docs.container`; `None` means no wrapper
    pub container: Option<Value>,
}

impl DocsPage {
    /// Read `parameters.docs`. A page without a container is a
    /// misconfiguration.
    pub fn from_story(story: &Story) -> Result<Self, PreviewError> {
        let docs = story.parameters.get("docs").and_then(Value::as_object);
        let page = docs.and_then(|docs| docs.get("page")).cloned();
        let container = docs.and_then(|docs| docs.get("container")).cloned();
        if page.is_some() && container.is_none() {
            return Err(PreviewError::MissingDocsContainer {
                story_id: story.id.clone(),
            });
        }
        Ok(Self { page, container })
    }
}

/// What a docs page can reach: the stories of its CSF file and a way to
/// render any of them inline.
#[derive(Clone)]
pub struct DocsContext {
    pub id: StoryId,
    pub title: String,
    pub name: String,
    csf_file: Arc<CsfFile>,
    services: RenderServices,
}

impl DocsContext {
    pub fn new(story: &Story, csf_file: Arc<CsfFile>, services: RenderServices) -> Self {
        Self {
            id: story.id.clone(),
            title: story.title.clone(),
            name: story.name.clone(),
            csf_file,
            services,
        }
    }

    fn store(&self) -> &Arc<StoryStore> {
        &self.services.store
    }

    /// A story of this page's CSF file; the page's own story when `id` is
    /// `None`.
    pub fn story_by_id(&self, id: Option<&StoryId>) -> Result<Arc<Story>, StoreError> {
        let id = id.unwrap_or(&self.id);
        self.store().story_from_csf_file(id, &self.csf_file)
    }

    pub fn component_stories(&self) -> Result<Vec<Arc<Story>>, StoreError> {
        self.store().component_stories_from_csf_file(&self.csf_file)
    }

    /// Load any story in the index, including ones from other files.
    pub async fn load_story(&self, id: &StoryId) -> Result<Arc<Story>, StoreError> {
        self.store().load_story(id).await
    }

    pub fn story_context(&self, story: &Story) -> StoryContext {
        self.store()
            .get_story_context(story)
            .with_view_mode(ViewMode::Docs)
    }

    /// Render `story` inline, into one of the page's own elements.
    pub async fn render_story_to_element(
        &self,
        story: Arc<Story>,
        element: RenderSurface,
    ) -> Result<(), RenderError> {
        let context = self.story_context(&story);
        let loaded = story
            .apply_loaders(&context)
            .await
            .map_err(|error| RenderError::Loader(format!("{error:#}")))?;
        let context = context.with_loaded(loaded);
        let render_context =
            RenderContext::new(story, context, true, self.services.display.clone());
        self.services
            .renderer
            .render_to_dom(render_context, &element)
            .await
    }
}
