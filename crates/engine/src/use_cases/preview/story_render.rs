//! Story render sessions.
//!
//! One session drives one story through `Init → Loaded → Rendered → Done`.
//! Cancellation is cooperative: the session's token is checked each time an
//! awaited step resumes, and a cancelled session stops without emitting
//! anything. Work a loader or renderer already started is not undone.
//!
//! While alive, a session listens for exactly four channel events
//! (`updateGlobals`, `forceReRender`, and args updates/resets for its own
//! story) and removes all four on teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use storyframe_domain::{StoryContext, StoryId, ViewMode};
use storyframe_shared::{EventKind, ExceptionPayload, PreviewEvent};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::render_context::{RenderContext, RenderDisplay};
use crate::entities::Story;
use crate::infrastructure::ports::{Channel, Listener, RenderSurface, Renderer, Subscription};
use crate::stores::StoryStore;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// Context built, loaders running
    Init,
    /// Loaders done, first render in flight
    Loaded,
    /// First render committed, play function running
    Rendered,
    /// Terminal
    Done,
}

/// Everything a session needs from the preview.
#[derive(Clone)]
pub struct RenderServices {
    pub store: Arc<StoryStore>,
    pub renderer: Arc<dyn Renderer>,
    pub channel: Arc<dyn Channel>,
    pub display: RenderDisplay,
}

pub struct StoryRender {
    session_id: Uuid,
    story: Arc<Story>,
    surface: RenderSurface,
    services: RenderServices,
    cancel: CancellationToken,
    phase: Mutex<RenderPhase>,
    /// The context loaders ran with, including their output
    loaded_context: Mutex<Option<StoryContext>>,
    subscriptions: Mutex<Vec<Subscription>>,
    /// Serializes re-renders against the surface
    rerender_lock: tokio::sync::Mutex<()>,
    torn_down: AtomicBool,
}

impl StoryRender {
    /// Build a session and register its listeners. Nothing renders until
    /// [`StoryRender::begin`].
    pub fn prepare(services: RenderServices, story: Arc<Story>, surface: RenderSurface) -> Arc<Self> {
        let render = Arc::new(Self {
            session_id: Uuid::new_v4(),
            story,
            surface,
            services,
            cancel: CancellationToken::new(),
            phase: Mutex::new(RenderPhase::Init),
            loaded_context: Mutex::new(None),
            subscriptions: Mutex::new(Vec::new()),
            rerender_lock: tokio::sync::Mutex::new(()),
            torn_down: AtomicBool::new(false),
        });
        render.subscribe();
        render
    }

    /// Spawn the initial render.
    pub fn begin(self: &Arc<Self>) {
        tracing::debug!(
            session_id = %self.session_id,
            story_id = %self.story.id,
            surface = %self.surface,
            "Starting story render"
        );
        tokio::spawn(self.clone().render_initial());
    }

    pub fn story(&self) -> &Arc<Story> {
        &self.story
    }

    pub fn phase(&self) -> RenderPhase {
        *lock(&self.phase)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn set_phase(&self, phase: RenderPhase) {
        *lock(&self.phase) = phase;
        tracing::trace!(session_id = %self.session_id, phase = ?phase, "Render phase");
    }

    fn subscribe(self: &Arc<Self>) {
        let channel = self.services.channel.clone();
        let story_id = self.story.id.clone();
        let subscriptions = vec![
            Subscription::register(
                channel.as_ref(),
                EventKind::UpdateGlobals,
                self.rerender_listener(None),
            ),
            Subscription::register(
                channel.as_ref(),
                EventKind::ForceReRender,
                self.rerender_listener(None),
            ),
            Subscription::register(
                channel.as_ref(),
                EventKind::UpdateStoryArgs,
                self.rerender_listener(Some(story_id.clone())),
            ),
            Subscription::register(
                channel.as_ref(),
                EventKind::ResetStoryArgs,
                self.rerender_listener(Some(story_id)),
            ),
        ];
        *lock(&self.subscriptions) = subscriptions;
    }

    /// A listener that schedules a re-render, optionally only for events
    /// targeting `only_story`.
    fn rerender_listener(self: &Arc<Self>, only_story: Option<StoryId>) -> Listener {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |event: &PreviewEvent| {
            if let Some(story_id) = &only_story {
                if event.target_story() != Some(story_id) {
                    return;
                }
            }
            let Some(render) = weak.upgrade() else {
                return;
            };
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move { render.rerender().await });
                }
                Err(_) => {
                    tracing::warn!(story_id = %render.story.id, "No runtime to re-render on");
                }
            }
        })
    }

    async fn render_initial(self: Arc<Self>) {
        if self.is_cancelled() {
            return;
        }
        let story = self.story.clone();
        let services = self.services.clone();

        let context = services
            .store
            .get_story_context(&story)
            .with_view_mode(ViewMode::Story);
        services.channel.emit(PreviewEvent::StoryPrepared {
            id: story.id.clone(),
            parameters: story.parameters.clone(),
            initial_args: story.initial_args.clone(),
            arg_types: story.arg_types.clone(),
            args: context.args.clone(),
        });

        // 1. Loaders
        let loaded = story.apply_loaders(&context).await;
        if self.is_cancelled() {
            tracing::debug!(session_id = %self.session_id, "Cancelled while loading");
            return;
        }
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(error) => {
                tracing::error!(story_id = %story.id, error = %error, "Loaders failed");
                services.display.show_exception(ExceptionPayload::from_error(&*error));
                return;
            }
        };
        let loaded_context = context.with_loaded(loaded);
        *lock(&self.loaded_context) = Some(loaded_context.clone());
        self.set_phase(RenderPhase::Loaded);

        // 2. First render, against freshly read args and globals
        let fresh = services.store.get_story_context(&story);
        let render_context = RenderContext::new(
            story.clone(),
            loaded_context.refreshed(fresh),
            true,
            services.display.clone(),
        );
        let play_context = render_context.story_context.clone();
        let rendered = services
            .renderer
            .render_to_dom(render_context, &self.surface)
            .await;
        if self.is_cancelled() {
            tracing::debug!(session_id = %self.session_id, "Cancelled while rendering");
            return;
        }
        if let Err(error) = rendered {
            tracing::error!(story_id = %story.id, error = %error, "Render failed");
            services.display.show_exception(ExceptionPayload::from_error(&error));
            return;
        }
        self.set_phase(RenderPhase::Rendered);

        // 3. Play function
        let played = story.run_play(&play_context).await;
        if self.is_cancelled() {
            tracing::debug!(session_id = %self.session_id, "Cancelled while playing");
            return;
        }
        if let Err(error) = played {
            tracing::error!(story_id = %story.id, error = %error, "Play function failed");
            services.display.show_exception(ExceptionPayload::from_error(&*error));
            return;
        }

        self.set_phase(RenderPhase::Done);
        tracing::info!(story_id = %story.id, "Story rendered");
        services
            .channel
            .emit(PreviewEvent::StoryRendered(story.id.clone()));
    }

    /// Render again with current args and globals, reusing loader output.
    pub async fn rerender(&self) {
        match self.phase() {
            RenderPhase::Init => {
                tracing::debug!(story_id = %self.story.id, "Re-render skipped, loaders still running");
                return;
            }
            RenderPhase::Loaded => {
                tracing::warn!(
                    story_id = %self.story.id,
                    "Re-render ignored, the first render has not committed yet"
                );
                return;
            }
            RenderPhase::Rendered => {
                tracing::warn!(
                    story_id = %self.story.id,
                    "Re-rendering while the play function runs, results may be inconsistent"
                );
            }
            RenderPhase::Done => {}
        }
        if self.is_cancelled() {
            return;
        }

        let _guard = self.rerender_lock.lock().await;
        let Some(loaded_context) = lock(&self.loaded_context).clone() else {
            return;
        };
        let services = &self.services;
        let fresh = services.store.get_story_context(&self.story);
        let render_context = RenderContext::new(
            self.story.clone(),
            loaded_context.refreshed(fresh),
            false,
            services.display.clone(),
        );

        let rendered = services
            .renderer
            .render_to_dom(render_context, &self.surface)
            .await;
        if self.is_cancelled() {
            return;
        }
        match rendered {
            Err(error) => {
                tracing::error!(story_id = %self.story.id, error = %error, "Re-render failed");
                services.display.show_exception(ExceptionPayload::from_error(&error));
            }
            // Only a finished session reports; a session still playing
            // reports when its play function completes
            Ok(()) if self.phase() == RenderPhase::Done => {
                services
                    .channel
                    .emit(PreviewEvent::StoryRendered(self.story.id.clone()));
            }
            Ok(()) => {}
        }
    }

    /// Cancel, clean the story's hooks and drop the listeners. Runs once.
    fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();
        self.services.store.cleanup_story(&self.story);
        let subscriptions = std::mem::take(&mut *lock(&self.subscriptions));
        for subscription in subscriptions {
            subscription.cancel(self.services.channel.as_ref());
        }
        tracing::debug!(
            session_id = %self.session_id,
            story_id = %self.story.id,
            phase = ?self.phase(),
            "Story render torn down"
        );
    }
}

/// Owner of the active session.
pub struct StoryRenderHandle {
    render: Arc<StoryRender>,
}

impl StoryRenderHandle {
    pub fn new(render: Arc<StoryRender>) -> Self {
        Self { render }
    }

    pub fn story(&self) -> &Arc<Story> {
        self.render.story()
    }

    pub fn phase(&self) -> RenderPhase {
        self.render.phase()
    }

    pub fn render(&self) -> &Arc<StoryRender> {
        &self.render
    }

    /// Tear the session down. The initial render notices at its next resume
    /// point.
    pub fn teardown(self) {
        self.render.teardown();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
