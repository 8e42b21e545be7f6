//! Preview use cases.
//!
//! The [`Preview`] turns selections into rendered stories or docs pages:
//! it owns the story store once the configuration is valid, listens to the
//! manager channel, and keeps at most one story render session alive.

mod docs;
mod render_context;
mod selection;
mod story_render;


use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use storyframe_domain::{DomainError, GlobalAnnotations, Selection, StoryId};
use storyframe_shared::{EventKind, ExceptionPayload, KeydownEvent, PreviewEvent};

pub use docs::{DocsContext, DocsPage};
pub use render_context::{RenderContext, RenderDisplay};
pub use story_render::{RenderPhase, RenderServices, StoryRender, StoryRenderHandle};

use crate::entities::Story;
use crate::infrastructure::ports::{
    Channel, DocsRenderer, ModuleLoader, PreviewView, RenderError, Renderer, StoriesIndexSource,
    Subscription,
};
use crate::stores::{SelectionStore, StoreError, StoryStore};

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Preview is not initialized")]
    NotInitialized,

    #[error("Preview configuration failed: {0}")]
    Config(String),

    #[error("Story {story_id} sets docs.page without docs.container")]
    MissingDocsContainer { story_id: StoryId },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Selection(#[from] DomainError),
}

/// Startup behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewOptions {
    /// Import every story module during initialization
    pub cache_all_csf_files: bool,
    /// Emit the legacy `setStories` snapshot after initialization
    pub emit_legacy_stories: bool,
}

/// The external collaborators a preview is built from.
#[derive(Clone)]
pub struct PreviewPorts {
    pub channel: Arc<dyn Channel>,
    pub view: Arc<dyn PreviewView>,
    pub renderer: Arc<dyn Renderer>,
    pub docs_renderer: Arc<dyn DocsRenderer>,
    pub module_loader: Arc<dyn ModuleLoader>,
    pub index_source: Arc<dyn StoriesIndexSource>,
}

/// The element that had focus when a key was pressed.
#[derive(Debug, Clone, Default)]
pub struct FocusTarget {
    pub tag_name: String,
    pub content_editable: bool,
}

impl FocusTarget {
    fn is_text_input(&self) -> bool {
        let tag = self.tag_name.to_ascii_lowercase();
        self.content_editable || tag == "input" || tag == "textarea"
    }
}

#[derive(Default)]
struct SelectionState {
    previous_selection: Option<Selection>,
    previous_story: Option<Arc<Story>>,
    session: Option<StoryRenderHandle>,
    docs_active: bool,
}

pub struct Preview {
    channel: Arc<dyn Channel>,
    view: Arc<dyn PreviewView>,
    renderer: Arc<dyn Renderer>,
    docs_renderer: Arc<dyn DocsRenderer>,
    index_source: Arc<dyn StoriesIndexSource>,
    module_loader: RwLock<Arc<dyn ModuleLoader>>,
    store: RwLock<Option<Arc<StoryStore>>>,
    selection_store: SelectionStore,
    state: Mutex<SelectionState>,
    subscriptions: Mutex<Vec<Subscription>>,
    display: RenderDisplay,
    options: PreviewOptions,
}

impl Preview {
    pub fn new(
        ports: PreviewPorts,
        selection_store: SelectionStore,
        options: PreviewOptions,
    ) -> Arc<Self> {
        let display = RenderDisplay::new(ports.view.clone(), ports.channel.clone());
        Arc::new(Self {
            channel: ports.channel,
            view: ports.view,
            renderer: ports.renderer,
            docs_renderer: ports.docs_renderer,
            index_source: ports.index_source,
            module_loader: RwLock::new(ports.module_loader),
            store: RwLock::new(None),
            selection_store,
            state: Mutex::new(SelectionState::default()),
            subscriptions: Mutex::new(Vec::new()),
            display,
            options,
        })
    }

    fn state(&self) -> MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The story store; `None` until the configuration has been evaluated
    /// successfully.
    pub fn story_store(&self) -> Option<Arc<StoryStore>> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_store(&self) -> Result<Arc<StoryStore>, PreviewError> {
        self.story_store().ok_or(PreviewError::NotInitialized)
    }

    pub fn current_selection(&self) -> Option<Selection> {
        self.selection_store.selection()
    }

    /// Phase of the active story session, if one exists.
    pub fn current_phase(&self) -> Option<RenderPhase> {
        self.state().session.as_ref().map(StoryRenderHandle::phase)
    }

    fn render_services(&self, store: Arc<StoryStore>) -> RenderServices {
        RenderServices {
            store,
            renderer: self.renderer.clone(),
            channel: self.channel.clone(),
            display: self.display.clone(),
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Start listening, evaluate the configuration, and render the specified
    /// story.
    ///
    /// A configuration failure is displayed and leaves the preview
    /// uninitialized until [`Preview::on_global_annotations_changed`] brings
    /// a valid one.
    pub async fn initialize(
        self: &Arc<Self>,
        global_annotations: anyhow::Result<GlobalAnnotations>,
    ) -> Result<(), PreviewError> {
        self.setup_listeners();
        self.initialize_store(global_annotations).await?;
        self.select_specified_story().await
    }

    fn setup_listeners(self: &Arc<Self>) {
        let mut subscriptions = lock(&self.subscriptions);
        if !subscriptions.is_empty() {
            return;
        }
        let channel = self.channel.as_ref();
        subscriptions.push(Subscription::register(
            channel,
            EventKind::SetCurrentStory,
            self.listener(|preview, event| {
                if let PreviewEvent::SetCurrentStory(selection) = event {
                    preview.on_set_current_story(selection.clone());
                }
            }),
        ));
        subscriptions.push(Subscription::register(
            channel,
            EventKind::UpdateGlobals,
            self.listener(|preview, event| {
                if let PreviewEvent::UpdateGlobals { globals } = event {
                    preview.on_update_globals(globals);
                }
            }),
        ));
        subscriptions.push(Subscription::register(
            channel,
            EventKind::UpdateStoryArgs,
            self.listener(|preview, event| {
                if let PreviewEvent::UpdateStoryArgs {
                    story_id,
                    updated_args,
                } = event
                {
                    preview.on_update_args(story_id, updated_args);
                }
            }),
        ));
        subscriptions.push(Subscription::register(
            channel,
            EventKind::ResetStoryArgs,
            self.listener(|preview, event| {
                if let PreviewEvent::ResetStoryArgs {
                    story_id,
                    arg_names,
                } = event
                {
                    preview.on_reset_args(story_id, arg_names.as_deref());
                }
            }),
        ));
    }

    fn listener(
        self: &Arc<Self>,
        handle: impl Fn(&Arc<Preview>, &PreviewEvent) + Send + Sync + 'static,
    ) -> crate::infrastructure::ports::Listener {
        let weak: Weak<Preview> = Arc::downgrade(self);
        Arc::new(move |event: &PreviewEvent| {
            if let Some(preview) = weak.upgrade() {
                handle(&preview, event);
            }
        })
    }

    async fn initialize_store(
        &self,
        global_annotations: anyhow::Result<GlobalAnnotations>,
    ) -> Result<Arc<StoryStore>, PreviewError> {
        let global_annotations = match global_annotations {
            Ok(global_annotations) => global_annotations,
            Err(error) => {
                self.display
                    .show_config_error(ExceptionPayload::from_error(&*error));
                return Err(PreviewError::Config(format!("{error:#}")));
            }
        };

        let module_loader = self
            .module_loader
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let store = Arc::new(StoryStore::new(
            module_loader,
            self.index_source.clone(),
            global_annotations,
        ));
        if let Err(error) = store.initialize(self.options.cache_all_csf_files).await {
            self.display
                .show_config_error(ExceptionPayload::from_error(&error));
            return Err(error.into());
        }

        *self.store.write().unwrap_or_else(PoisonError::into_inner) = Some(store.clone());
        tracing::info!(
            stories = store.stories_index().snapshot().stories.len(),
            "Preview initialized"
        );

        self.channel.emit(PreviewEvent::SetGlobals {
            globals: store.globals.get(),
            global_types: store.globals.global_types(),
        });
        if self.options.emit_legacy_stories {
            self.channel
                .emit(PreviewEvent::SetStories(store.get_set_stories_payload()));
        }
        Ok(store)
    }

    /// Resolve the persisted specifier and render what it points at.
    pub async fn select_specified_story(self: &Arc<Self>) -> Result<(), PreviewError> {
        let store = self.require_store()?;
        let Some(specifier) = self.selection_store.selection_specifier() else {
            self.display.show_missing(None);
            return Ok(());
        };

        let Some(story_id) = store
            .stories_index()
            .story_id_from_specifier(&specifier.story_specifier)
        else {
            self.display
                .show_missing(Some(specifier.story_specifier.to_string()));
            return Ok(());
        };

        if let Some(globals) = &specifier.globals {
            store.globals.update_from_persisted(globals);
        }

        let selection = Selection::new(story_id, specifier.view_mode);
        self.selection_store.set_selection(selection.clone());
        self.channel
            .emit(PreviewEvent::StorySpecified(selection.clone()));
        self.channel
            .emit(PreviewEvent::CurrentStoryWasSet(selection.clone()));

        self.render_selection(selection, specifier.args).await
    }

    // =========================================================================
    // Channel handlers
    // =========================================================================

    /// The manager picked a story.
    pub fn on_set_current_story(self: &Arc<Self>, selection: Selection) {
        self.selection_store.set_selection(selection.clone());
        self.channel
            .emit(PreviewEvent::CurrentStoryWasSet(selection.clone()));

        let preview = self.clone();
        tokio::spawn(async move {
            if let Err(error) = preview.render_selection(selection, None).await {
                tracing::error!(error = %error, "Failed to render selection");
            }
        });
    }

    pub fn on_update_globals(&self, globals: &storyframe_domain::Globals) {
        let Some(store) = self.story_store() else {
            tracing::warn!("Globals update before initialization ignored");
            return;
        };
        let globals = store.globals.update(globals);
        self.channel.emit(PreviewEvent::GlobalsUpdated {
            globals,
            initial_globals: store.globals.initial_globals(),
        });
    }

    pub fn on_update_args(&self, story_id: &StoryId, updated_args: &storyframe_domain::Args) {
        let Some(store) = self.story_store() else {
            tracing::warn!(story_id = %story_id, "Args update before initialization ignored");
            return;
        };
        let args = store.args.update(story_id, updated_args);
        self.channel.emit(PreviewEvent::StoryArgsUpdated {
            story_id: story_id.clone(),
            args,
        });
    }

    /// Restore args to their initial values; every set arg when `arg_names`
    /// is `None`.
    pub fn on_reset_args(&self, story_id: &StoryId, arg_names: Option<&[String]>) {
        let Some(store) = self.story_store() else {
            tracing::warn!(story_id = %story_id, "Args reset before initialization ignored");
            return;
        };
        let args = store.args.reset(story_id, arg_names);
        self.channel.emit(PreviewEvent::StoryArgsUpdated {
            story_id: story_id.clone(),
            args,
        });
    }

    /// Forward a key press to the manager unless the user is typing.
    pub fn on_keydown(&self, event: KeydownEvent, target: &FocusTarget) {
        if target.is_text_input() {
            return;
        }
        self.channel.emit(PreviewEvent::PreviewKeydown { event });
    }

    // =========================================================================
    // Hot reload
    // =========================================================================

    /// Story modules changed: swap the loader, drop caches, refresh the index
    /// and re-render the current selection.
    pub async fn on_import_fn_changed(
        self: &Arc<Self>,
        module_loader: Arc<dyn ModuleLoader>,
    ) -> Result<(), PreviewError> {
        *self
            .module_loader
            .write()
            .unwrap_or_else(PoisonError::into_inner) = module_loader.clone();
        let store = self.require_store()?;
        store.on_import_fn_changed(module_loader);
        store.refresh_index().await?;
        self.render_current_selection().await
    }

    /// The preview configuration was re-evaluated.
    ///
    /// A failure is displayed; success either updates the live store or, if
    /// the preview never got past a configuration error, initializes it now.
    pub async fn on_global_annotations_changed(
        self: &Arc<Self>,
        global_annotations: anyhow::Result<GlobalAnnotations>,
    ) -> Result<(), PreviewError> {
        match self.story_store() {
            None => {
                self.initialize_store(global_annotations).await?;
                if self.current_selection().is_some() {
                    self.render_current_selection().await
                } else {
                    self.select_specified_story().await
                }
            }
            Some(store) => {
                let global_annotations = match global_annotations {
                    Ok(global_annotations) => global_annotations,
                    Err(error) => {
                        self.display
                            .show_config_error(ExceptionPayload::from_error(&*error));
                        return Err(PreviewError::Config(format!("{error:#}")));
                    }
                };
                store.update_global_annotations(global_annotations);
                self.render_current_selection().await
            }
        }
    }

    async fn render_current_selection(self: &Arc<Self>) -> Result<(), PreviewError> {
        match self.current_selection() {
            Some(selection) => self.render_selection(selection, None).await,
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
