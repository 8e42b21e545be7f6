//! The selection-change algorithm.

use std::sync::Arc;

use storyframe_domain::{Args, Selection, ViewMode};
use storyframe_shared::{ExceptionPayload, PreviewEvent};

use super::docs::{DocsContext, DocsPage};
use super::story_render::{StoryRender, StoryRenderHandle};
use super::{Preview, PreviewError};
use crate::entities::Story;
use crate::stores::StoryStore;

enum Dispatch {
    Story(Arc<StoryRender>),
    Docs,
}

impl Preview {
    /// Render `selection`, replacing whatever is rendered now.
    ///
    /// `persisted_args` hydrate the story's args once, before its first
    /// render. Load failures show the missing-story display and are not
    /// returned.
    pub async fn render_selection(
        self: &Arc<Self>,
        selection: Selection,
        persisted_args: Option<Args>,
    ) -> Result<(), PreviewError> {
        let store = self.require_store()?;
        let story_id = selection.story_id.clone();

        // 1. Load
        let story = match store.load_story(&story_id).await {
            Ok(story) => story,
            Err(error) => {
                tracing::warn!(story_id = %story_id, error = %error, "Failed to load story");
                self.show_missing_story(&selection);
                return Ok(());
            }
        };

        // 2. Swap sessions. Nothing in this block awaits, so the recorded
        //    previous selection is the ground truth for any later selection.
        let mut events = Vec::new();
        let dispatch = {
            let mut state = self.state();
            // Checked under the state lock: a newer selection's task may
            // already have swapped sessions on another worker.
            if !self.is_current(&selection) {
                tracing::debug!(story_id = %story_id, "Selection superseded while loading");
                return Ok(());
            }
            let previous_selection = state.previous_selection.clone();
            let story_changed = previous_selection
                .as_ref()
                .map_or(true, |previous| previous.story_id != selection.story_id);
            let view_mode_changed = previous_selection
                .as_ref()
                .map_or(true, |previous| previous.view_mode != selection.view_mode);
            let implementation_changed = state
                .previous_story
                .as_ref()
                .map_or(true, |previous| !Arc::ptr_eq(previous, &story));

            if !story_changed && !view_mode_changed && !implementation_changed {
                drop(state);
                self.channel.emit(PreviewEvent::StoryUnchanged(story_id));
                return Ok(());
            }

            if let Some(args) = &persisted_args {
                store.args.update_from_persisted(&story, args);
            } else if implementation_changed && !story_changed {
                if let Some(previous) = &state.previous_story {
                    store.args.reset_on_implementation_change(&story, previous);
                }
            }

            let renders_docs = selection.view_mode == ViewMode::Docs || story.is_docs_only();
            if state.docs_active && !renders_docs {
                self.view.release_docs_surface();
                state.docs_active = false;
            }
            if let Some(session) = state.session.take() {
                session.teardown();
            }
            if previous_selection.is_some() && (story_changed || view_mode_changed) {
                events.push(PreviewEvent::StoryChanged(story_id.clone()));
            }

            state.previous_selection = Some(selection.clone());
            state.previous_story = Some(story.clone());

            if renders_docs {
                state.docs_active = true;
                Dispatch::Docs
            } else {
                let surface = self.view.prepare_for_story(&story);
                let render =
                    StoryRender::prepare(self.render_services(store.clone()), story.clone(), surface);
                state.session = Some(StoryRenderHandle::new(render.clone()));
                Dispatch::Story(render)
            }
        };

        for event in events {
            self.channel.emit(event);
        }

        // 3. Render
        match dispatch {
            Dispatch::Story(render) => {
                render.begin();
                Ok(())
            }
            Dispatch::Docs => self.render_docs(&store, story, &selection).await,
        }
    }

    fn is_current(&self, selection: &Selection) -> bool {
        self.selection_store.selection().as_ref() == Some(selection)
    }

    /// Tear down whatever is rendered and show the missing-story display,
    /// unless `selection` has been superseded.
    fn show_missing_story(&self, selection: &Selection) {
        {
            let mut state = self.state();
            if !self.is_current(selection) {
                return;
            }
            if let Some(session) = state.session.take() {
                session.teardown();
            }
            if state.docs_active {
                self.view.release_docs_surface();
                state.docs_active = false;
            }
            state.previous_selection = Some(selection.clone());
            state.previous_story = None;
        }
        self.display
            .show_missing(Some(selection.story_id.to_string()));
    }

    async fn render_docs(
        &self,
        store: &Arc<StoryStore>,
        story: Arc<Story>,
        selection: &Selection,
    ) -> Result<(), PreviewError> {
        let page = DocsPage::from_story(&story)?;
        let csf_file = store.load_csf_file_by_story_id(&story.id).await?;
        let surface = self.view.prepare_for_docs();
        let context = DocsContext::new(&story, csf_file, self.render_services(store.clone()));

        tracing::debug!(story_id = %story.id, surface = %surface, "Rendering docs");
        if let Err(error) = self
            .docs_renderer
            .render_docs(context, page, &surface)
            .await
        {
            tracing::error!(story_id = %story.id, error = %error, "Docs render failed");
            self.display
                .show_exception(ExceptionPayload::from_error(&error));
            return Ok(());
        }

        if self.is_current(selection) {
            self.channel
                .emit(PreviewEvent::DocsRendered(story.id.clone()));
        }
        Ok(())
    }
}
