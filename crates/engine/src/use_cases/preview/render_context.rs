//! What a renderer is handed: the bound story and the display callbacks.

use std::fmt;
use std::sync::Arc;

use storyframe_domain::{ComponentId, StoryContext, StoryElement, StoryId};
use storyframe_shared::{ExceptionPayload, PreviewEvent};

use crate::entities::Story;
use crate::infrastructure::ports::{Channel, PreviewView};

/// Routes display state changes to the host view and notifies the manager.
#[derive(Clone)]
pub struct RenderDisplay {
    view: Arc<dyn PreviewView>,
    channel: Arc<dyn Channel>,
}

impl RenderDisplay {
    pub fn new(view: Arc<dyn PreviewView>, channel: Arc<dyn Channel>) -> Self {
        Self { view, channel }
    }

    pub fn view(&self) -> &Arc<dyn PreviewView> {
        &self.view
    }

    pub fn show_main(&self) {
        self.view.show_main();
    }

    /// A problem the renderer describes for the user (not a crash).
    pub fn show_error(&self, title: &str, description: &str) {
        tracing::warn!(title, description, "Story reported an error");
        self.channel.emit(PreviewEvent::StoryErrored {
            title: title.to_string(),
            description: description.to_string(),
        });
        self.view.show_error_display(&ExceptionPayload {
            message: title.to_string(),
            stack: Some(description.to_string()),
        });
    }

    pub fn show_exception(&self, error: ExceptionPayload) {
        tracing::error!(message = %error.message, "Story threw an exception");
        self.view.show_error_display(&error);
        self.channel.emit(PreviewEvent::StoryThrewException(error));
    }

    pub fn show_missing(&self, specifier: Option<String>) {
        tracing::warn!(specifier = ?specifier, "Story is missing");
        self.view.show_no_preview();
        self.channel.emit(PreviewEvent::StoryMissing(specifier));
    }

    pub fn show_config_error(&self, error: ExceptionPayload) {
        tracing::error!(message = %error.message, "Preview configuration failed");
        self.view.show_error_display(&error);
        self.channel.emit(PreviewEvent::ConfigError(error));
    }
}

/// One render call's input.
#[derive(Clone)]
pub struct RenderContext {
    pub id: StoryId,
    pub title: String,
    pub name: String,
    pub component_id: ComponentId,
    /// Set on the first render of a session only
    pub force_remount: bool,
    pub story_context: StoryContext,
    story: Arc<Story>,
    display: RenderDisplay,
}

impl RenderContext {
    pub fn new(
        story: Arc<Story>,
        story_context: StoryContext,
        force_remount: bool,
        display: RenderDisplay,
    ) -> Self {
        Self {
            id: story.id.clone(),
            title: story.title.clone(),
            name: story.name.clone(),
            component_id: story.component_id.clone(),
            force_remount,
            story_context,
            story,
            display,
        }
    }

    /// The story's render function bound to this context.
    pub fn story_fn(&self) -> anyhow::Result<StoryElement> {
        self.story.render_with(&self.story_context)
    }

    pub fn show_main(&self) {
        self.display.show_main();
    }

    pub fn show_error(&self, title: &str, description: &str) {
        self.display.show_error(title, description);
    }

    pub fn show_exception(&self, error: &anyhow::Error) {
        self.display.show_exception(ExceptionPayload::from_error(&**error));
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("id", &self.id)
            .field("force_remount", &self.force_remount)
            .field("story_context", &self.story_context)
            .finish_non_exhaustive()
    }
}
