//! Hand-written test doubles that record what they were asked to do.
//!
//! Mockall covers call expectations; these cover the cases where a test
//! needs real async behaviour (yielding, gating) or wants to inspect calls
//! after the fact.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use storyframe_domain::{Loader, ModuleExports, PlayFunction, StoriesList, StoryContext, StoryId};
use storyframe_shared::ExceptionPayload;
use tokio::sync::Notify;

use super::stories::obj;
use crate::entities::Story;
use crate::infrastructure::ports::{
    DocsRenderer, LoadError, ModuleLoader, PreviewView, RenderError, RenderSurface, Renderer,
    StoriesIndexSource,
};
use crate::use_cases::preview::{DocsContext, DocsPage, RenderContext};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

// =============================================================================
// Loading
// =============================================================================

/// Serves fixed modules, yielding to the scheduler before each import so
/// concurrent callers really interleave.
pub struct YieldingModuleLoader {
    modules: HashMap<String, Arc<ModuleExports>>,
    imports: Mutex<Vec<String>>,
}

impl YieldingModuleLoader {
    pub fn new(modules: Vec<(&str, ModuleExports)>) -> Self {
        Self {
            modules: modules
                .into_iter()
                .map(|(path, module)| (path.to_string(), Arc::new(module)))
                .collect(),
            imports: Mutex::new(Vec::new()),
        }
    }

    /// Every path imported so far, in order.
    pub fn imports(&self) -> Vec<String> {
        lock(&self.imports).clone()
    }
}

#[async_trait]
impl ModuleLoader for YieldingModuleLoader {
    async fn import(&self, path: &str) -> Result<Arc<ModuleExports>, LoadError> {
        lock(&self.imports).push(path.to_string());
        tokio::task::yield_now().await;
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::not_found(path))
    }
}

/// Serves fixed modules once its gate opens.
pub struct GatedModuleLoader {
    gate: Arc<Gate>,
    modules: YieldingModuleLoader,
}

impl GatedModuleLoader {
    pub fn new(gate: Arc<Gate>, modules: Vec<(&str, ModuleExports)>) -> Self {
        Self {
            gate,
            modules: YieldingModuleLoader::new(modules),
        }
    }
}

#[async_trait]
impl ModuleLoader for GatedModuleLoader {
    async fn import(&self, path: &str) -> Result<Arc<ModuleExports>, LoadError> {
        self.gate.wait().await;
        self.modules.import(path).await
    }
}

pub struct StaticIndexSource(pub StoriesList);

#[async_trait]
impl StoriesIndexSource for StaticIndexSource {
    async fn fetch(&self) -> Result<StoriesList, LoadError> {
        Ok(self.0.clone())
    }
}

// =============================================================================
// Gates
// =============================================================================

/// A latch tests open to let gated loaders and play functions finish.
#[derive(Default)]
pub struct Gate {
    open: AtomicBool,
    notify: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.open.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

/// Blocks until its gate opens, then yields `{"gated": true}`.
pub struct GatedLoader(pub Arc<Gate>);

#[async_trait]
impl Loader for GatedLoader {
    async fn load(&self, _context: &StoryContext) -> anyhow::Result<Map<String, Value>> {
        self.0.wait().await;
        Ok(obj(json!({"gated": true})))
    }
}

/// Blocks until its gate opens.
pub struct GatedPlay(pub Arc<Gate>);

#[async_trait]
impl PlayFunction for GatedPlay {
    async fn play(&self, _context: &StoryContext) -> anyhow::Result<()> {
        self.0.wait().await;
        Ok(())
    }
}

/// Counts its calls and yields `{"count": n}`.
#[derive(Default)]
pub struct CountingLoader {
    calls: AtomicUsize,
}

impl CountingLoader {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Loader for CountingLoader {
    async fn load(&self, _context: &StoryContext) -> anyhow::Result<Map<String, Value>> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(obj(json!({"count": count})))
    }
}

pub struct FailingLoader(pub &'static str);

#[async_trait]
impl Loader for FailingLoader {
    async fn load(&self, _context: &StoryContext) -> anyhow::Result<Map<String, Value>> {
        anyhow::bail!(self.0)
    }
}

// =============================================================================
// Rendering
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub story_id: StoryId,
    pub surface: RenderSurface,
    pub force_remount: bool,
    pub element: Value,
}

/// Evaluates the story function and records the element it produced.
#[derive(Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>,
    failure: Mutex<Option<String>>,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every render from now on.
    pub fn fail_with(&self, message: &str) {
        *lock(&self.failure) = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        lock(&self.calls).clone()
    }

    pub fn calls_for(&self, story_id: &str) -> Vec<RenderCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.story_id.as_str() == story_id)
            .collect()
    }
}

#[async_trait]
impl Renderer for RecordingRenderer {
    async fn render_to_dom(
        &self,
        context: RenderContext,
        surface: &RenderSurface,
    ) -> Result<(), RenderError> {
        tokio::task::yield_now().await;
        if let Some(message) = lock(&self.failure).clone() {
            return Err(RenderError::failed(message));
        }
        let element = context.story_fn()?;
        lock(&self.calls).push(RenderCall {
            story_id: context.id.clone(),
            surface: surface.clone(),
            force_remount: context.force_remount,
            element,
        });
        context.show_main();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocsCall {
    pub story_id: StoryId,
    pub page: DocsPage,
    pub surface: RenderSurface,
}

/// Renders every story of the page's component inline, then records the page.
#[derive(Default)]
pub struct RecordingDocsRenderer {
    calls: Mutex<Vec<DocsCall>>,
}

impl RecordingDocsRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<DocsCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl DocsRenderer for RecordingDocsRenderer {
    async fn render_docs(
        &self,
        context: DocsContext,
        page: DocsPage,
        surface: &RenderSurface,
    ) -> Result<(), RenderError> {
        let stories = context.component_stories().map_err(RenderError::failed)?;
        for story in stories {
            let element = RenderSurface::Element(format!("anchor--{}", story.id));
            context.render_story_to_element(story, element).await?;
        }
        lock(&self.calls).push(DocsCall {
            story_id: context.id.clone(),
            page,
            surface: surface.clone(),
        });
        Ok(())
    }
}

// =============================================================================
// View
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    PrepareForStory(StoryId),
    PrepareForDocs,
    ReleaseDocs,
    ShowMain,
    ShowNoPreview,
    ShowError(String),
}

#[derive(Default)]
pub struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ViewCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: ViewCall) {
        lock(&self.calls).push(call);
    }
}

impl PreviewView for RecordingView {
    fn prepare_for_story(&self, story: &Story) -> RenderSurface {
        self.record(ViewCall::PrepareForStory(story.id.clone()));
        RenderSurface::StoryRoot
    }

    fn prepare_for_docs(&self) -> RenderSurface {
        self.record(ViewCall::PrepareForDocs);
        RenderSurface::DocsRoot
    }

    fn release_docs_surface(&self) {
        self.record(ViewCall::ReleaseDocs);
    }

    fn show_main(&self) {
        self.record(ViewCall::ShowMain);
    }

    fn show_no_preview(&self) {
        self.record(ViewCall::ShowNoPreview);
    }

    fn show_error_display(&self, error: &ExceptionPayload) {
        self.record(ViewCall::ShowError(error.message.clone()));
    }
}
