//! Story cache.
//!
//! Loads story modules on demand and memoizes the parsed CSF file per import
//! path and the prepared story per story id. Consumers compare stories by
//! `Arc` identity, so a cached story is only ever replaced after an explicit
//! invalidation:
//!
//! - `on_import_fn_changed` drops both caches (any module may have changed)
//! - `update_global_annotations` drops prepared stories only
//!
//! Each module loader swap starts a new generation. A load that began under
//! an older generation still returns its story but never caches it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use futures_util::future::try_join_all;
use storyframe_domain::{
    DomainError, GlobalAnnotations, StoriesList, StoryContext, StoryId, ViewMode,
};
use storyframe_shared::SetStoriesPayload;
use tokio::sync::OnceCell;

use super::args::ArgsStore;
use super::globals::GlobalsStore;
use super::hooks::HooksRegistry;
use crate::entities::{prepare_story, process_csf_file, CsfFile, StoriesIndex, Story};
use crate::infrastructure::ports::{LoadError, ModuleLoader, StoriesIndexSource};

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Story not found: {0}")]
    StoryNotFound(StoryId),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Preparation(#[from] DomainError),
}

/// One in-flight or finished CSF load. Every caller for the same path awaits
/// the same cell.
type CsfCell = Arc<OnceCell<Arc<CsfFile>>>;

#[derive(Default)]
struct PreparedStories {
    generation: u64,
    by_id: HashMap<StoryId, Arc<Story>>,
}

pub struct StoryStore {
    index: StoriesIndex,
    module_loader: RwLock<Arc<dyn ModuleLoader>>,
    global_annotations: RwLock<Arc<GlobalAnnotations>>,
    csf_files: Mutex<HashMap<String, CsfCell>>,
    stories: Mutex<PreparedStories>,
    hooks: HooksRegistry,
    pub args: ArgsStore,
    pub globals: GlobalsStore,
}

impl StoryStore {
    pub fn new(
        module_loader: Arc<dyn ModuleLoader>,
        index_source: Arc<dyn StoriesIndexSource>,
        global_annotations: GlobalAnnotations,
    ) -> Self {
        let globals = GlobalsStore::new(
            global_annotations.globals.clone(),
            global_annotations.global_types.clone(),
        );
        Self {
            index: StoriesIndex::new(index_source),
            module_loader: RwLock::new(module_loader),
            global_annotations: RwLock::new(Arc::new(global_annotations)),
            csf_files: Mutex::new(HashMap::new()),
            stories: Mutex::new(PreparedStories::default()),
            hooks: HooksRegistry::new(),
            args: ArgsStore::new(),
            globals,
        }
    }

    fn csf_files(&self) -> MutexGuard<'_, HashMap<String, CsfCell>> {
        self.csf_files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stories(&self) -> MutexGuard<'_, PreparedStories> {
        self.stories.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn module_loader(&self) -> Arc<dyn ModuleLoader> {
        self.module_loader
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn global_annotations(&self) -> Arc<GlobalAnnotations> {
        self.global_annotations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stories_index(&self) -> &StoriesIndex {
        &self.index
    }

    /// Fetch the stories index and, optionally, warm the CSF cache with every
    /// file it references.
    pub async fn initialize(&self, cache_all_csf_files: bool) -> Result<(), StoreError> {
        self.index.refresh().await?;
        if cache_all_csf_files {
            self.cache_all_csf_files().await?;
        }
        Ok(())
    }

    pub async fn refresh_index(&self) -> Result<Arc<StoriesList>, StoreError> {
        Ok(self.index.refresh().await?)
    }

    /// Load every CSF file the index references, once per import path.
    pub async fn cache_all_csf_files(&self) -> Result<Vec<Arc<CsfFile>>, StoreError> {
        let list = self.index.snapshot();
        let mut seen = std::collections::HashSet::new();
        let first_story_per_path: Vec<StoryId> = list
            .stories
            .iter()
            .filter(|entry| seen.insert(entry.import_path.as_str()))
            .map(|entry| entry.id.clone())
            .collect();

        tracing::debug!(files = first_story_per_path.len(), "Caching all CSF files");
        try_join_all(
            first_story_per_path
                .iter()
                .map(|story_id| self.load_csf_file_by_story_id(story_id)),
        )
        .await
    }

    /// The parsed CSF file containing `story_id`, imported at most once per
    /// import path until the next invalidation.
    pub async fn load_csf_file_by_story_id(
        &self,
        story_id: &StoryId,
    ) -> Result<Arc<CsfFile>, StoreError> {
        let entry = self
            .index
            .entry(story_id)
            .ok_or_else(|| StoreError::StoryNotFound(story_id.clone()))?;

        let cell = self
            .csf_files()
            .entry(entry.import_path.clone())
            .or_default()
            .clone();
        let loader = self.module_loader();

        let csf_file = cell
            .get_or_try_init(|| async {
                tracing::debug!(import_path = %entry.import_path, "Importing story module");
                let module = loader.import(&entry.import_path).await?;
                Ok::<_, LoadError>(Arc::new(process_csf_file(
                    module,
                    &entry.import_path,
                    &entry.title,
                )))
            })
            .await?;

        Ok(csf_file.clone())
    }

    /// The prepared story for `story_id`. Repeated calls return the same `Arc`.
    pub async fn load_story(&self, story_id: &StoryId) -> Result<Arc<Story>, StoreError> {
        let generation = self.stories().generation;
        let csf_file = self.load_csf_file_by_story_id(story_id).await?;
        self.prepare_in_generation(story_id, &csf_file, generation)
    }

    /// Prepare (or fetch the cached) story `story_id` from an already loaded
    /// CSF file.
    pub fn story_from_csf_file(
        &self,
        story_id: &StoryId,
        csf_file: &CsfFile,
    ) -> Result<Arc<Story>, StoreError> {
        let generation = self.stories().generation;
        self.prepare_in_generation(story_id, csf_file, generation)
    }

    fn prepare_in_generation(
        &self,
        story_id: &StoryId,
        csf_file: &CsfFile,
        generation: u64,
    ) -> Result<Arc<Story>, StoreError> {
        let mut stories = self.stories();
        let current = stories.generation == generation;
        if current {
            if let Some(story) = stories.by_id.get(story_id) {
                return Ok(story.clone());
            }
        }

        let csf_story = csf_file
            .story(story_id)
            .ok_or_else(|| StoreError::StoryNotFound(story_id.clone()))?;
        let story = Arc::new(prepare_story(
            csf_story,
            csf_file,
            &self.global_annotations(),
        )?);
        if !current {
            tracing::debug!(story_id = %story_id, "Module loader replaced during load, story not cached");
            return Ok(story);
        }
        self.args.set_initial(&story);
        stories.by_id.insert(story_id.clone(), story.clone());

        tracing::debug!(story_id = %story_id, "Prepared story");
        Ok(story)
    }

    /// Every story of a CSF file, in export order.
    pub fn component_stories_from_csf_file(
        &self,
        csf_file: &CsfFile,
    ) -> Result<Vec<Arc<Story>>, StoreError> {
        csf_file
            .stories
            .iter()
            .map(|csf_story| self.story_from_csf_file(&csf_story.id, csf_file))
            .collect()
    }

    /// Assemble a story context from current args and globals.
    ///
    /// The `hooks` object is the same for every call with the same story.
    pub fn get_story_context(&self, story: &Story) -> StoryContext {
        StoryContext {
            id: story.id.clone(),
            name: story.name.clone(),
            title: story.title.clone(),
            component_id: story.component_id.clone(),
            parameters: story.parameters.clone(),
            arg_types: story.arg_types.clone(),
            initial_args: story.initial_args.clone(),
            args: self.args.get_or_seed(story),
            globals: self.globals.get(),
            hooks: self.hooks.hooks_for(&story.id),
            view_mode: ViewMode::Story,
            loaded: Default::default(),
        }
    }

    /// Run the story's hook cleanups. Called once when its render session is
    /// torn down.
    pub fn cleanup_story(&self, story: &Story) {
        self.hooks.clean(&story.id);
    }

    /// Swap the module loader and forget every cached file and story.
    pub fn on_import_fn_changed(&self, module_loader: Arc<dyn ModuleLoader>) {
        *self
            .module_loader
            .write()
            .unwrap_or_else(PoisonError::into_inner) = module_loader;
        // Loads still in flight finish into the old cells and are dropped
        *self.csf_files() = HashMap::new();
        let mut stories = self.stories();
        stories.generation += 1;
        stories.by_id.clear();
        drop(stories);
        tracing::info!("Module loader replaced, story caches cleared");
    }

    /// Swap the global annotations. Parsed CSF files stay valid; prepared
    /// stories do not.
    pub fn update_global_annotations(&self, global_annotations: GlobalAnnotations) {
        self.globals.set(
            global_annotations.globals.clone(),
            global_annotations.global_types.clone(),
        );
        *self
            .global_annotations
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(global_annotations);
        self.stories().by_id.clear();
        tracing::info!("Global annotations replaced, prepared stories cleared");
    }

    /// Legacy whole-index snapshot for managers that predate on-demand loading.
    pub fn get_set_stories_payload(&self) -> SetStoriesPayload {
        SetStoriesPayload::from_index(&self.index.snapshot(), self.globals.get())
    }
}
