//! Story context handed to loaders, render functions and play functions.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::ids::{ComponentId, StoryId};
use crate::value_objects::{ArgTypes, Args, Globals, Parameters, ViewMode};

/// Everything a story function can see about the story it renders.
#[derive(Clone)]
pub struct StoryContext {
    pub id: StoryId,
    pub name: String,
    pub title: String,
    pub component_id: ComponentId,
    pub parameters: Parameters,
    pub arg_types: ArgTypes,
    pub initial_args: Args,
    pub args: Args,
    pub globals: Globals,
    /// Same object for every context built for one story, until cleanup
    pub hooks: Arc<Hooks>,
    pub view_mode: ViewMode,
    /// Merged output of the story's loaders
    pub loaded: Map<String, Value>,
}

impl StoryContext {
    pub fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }

    pub fn with_loaded(mut self, loaded: Map<String, Value>) -> Self {
        self.loaded = loaded;
        self
    }

    /// Take current args/globals from `fresh` while keeping this context's
    /// view mode and loader output.
    pub fn refreshed(&self, fresh: StoryContext) -> StoryContext {
        StoryContext {
            view_mode: self.view_mode,
            loaded: self.loaded.clone(),
            ..fresh
        }
    }

    /// Legacy alias for the title.
    pub fn kind(&self) -> &str {
        &self.title
    }
}

impl fmt::Debug for StoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryContext")
            .field("id", &self.id)
            .field("view_mode", &self.view_mode)
            .field("args", &self.args)
            .field("globals", &self.globals)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

type Cleanup = Box<dyn FnOnce() + Send>;

/// Per-story state that survives re-renders of the same story.
///
/// Render functions stash values here and register teardown callbacks;
/// [`Hooks::clean`] runs when the story's render session is torn down.
#[derive(Default)]
pub struct Hooks {
    state: Mutex<Map<String, Value>>,
    cleanups: Mutex<Vec<Cleanup>>,
    clean_count: AtomicUsize,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &str) -> Option<Value> {
        lock(&self.state).get(key).cloned()
    }

    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        lock(&self.state).insert(key.into(), value);
    }

    /// Register a callback for the next [`Hooks::clean`].
    pub fn on_cleanup(&self, cleanup: impl FnOnce() + Send + 'static) {
        lock(&self.cleanups).push(Box::new(cleanup));
    }

    /// Run pending cleanups and forget stashed state.
    pub fn clean(&self) {
        let cleanups = std::mem::take(&mut *lock(&self.cleanups));
        for cleanup in cleanups {
            cleanup();
        }
        lock(&self.state).clear();
        self.clean_count.fetch_add(1, Ordering::SeqCst);
    }

    /// How many times [`Hooks::clean`] ran.
    pub fn clean_count(&self) -> usize {
        self.clean_count.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("clean_count", &self.clean_count())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
