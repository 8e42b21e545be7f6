//! Stories index: the resolvable catalog of every story.
//!
//! Snapshots are replaced wholesale on refresh; resolution always reads the
//! latest one.

use std::sync::{Arc, PoisonError, RwLock};

use storyframe_domain::{StoriesList, StoryId, StoryIndexEntry, StorySpecifier};

use crate::infrastructure::ports::{LoadError, StoriesIndexSource};

pub struct StoriesIndex {
    source: Arc<dyn StoriesIndexSource>,
    current: RwLock<Arc<StoriesList>>,
}

impl StoriesIndex {
    pub fn new(source: Arc<dyn StoriesIndexSource>) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(StoriesList::default())),
        }
    }

    /// Fetch a fresh list from the source and make it current.
    pub async fn refresh(&self) -> Result<Arc<StoriesList>, LoadError> {
        let list = self.source.fetch().await?;
        if list.v != StoriesList::VERSION {
            tracing::warn!(version = list.v, "Stories index has an unexpected version");
        }
        for entry in &list.stories {
            if entry.id.as_str().is_empty() {
                return Err(LoadError::index(format!(
                    "entry '{}' in '{}' has no id",
                    entry.name, entry.title
                )));
            }
        }
        let list = Arc::new(list);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = list.clone();
        tracing::debug!(stories = list.stories.len(), "Stories index refreshed");
        Ok(list)
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> Arc<StoriesList> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn entry(&self, story_id: &StoryId) -> Option<StoryIndexEntry> {
        self.snapshot()
            .stories
            .iter()
            .find(|entry| &entry.id == story_id)
            .cloned()
    }

    /// Resolve `specifier` against the current snapshot.
    ///
    /// An id matches exactly first, then as a prefix of a story id. A miss is
    /// `None`, never an error.
    pub fn story_id_from_specifier(&self, specifier: &StorySpecifier) -> Option<StoryId> {
        let list = self.snapshot();
        let stories = &list.stories;
        match specifier {
            StorySpecifier::First => stories.first().map(|entry| entry.id.clone()),
            StorySpecifier::Id(id) => stories
                .iter()
                .find(|entry| entry.id.as_str() == id)
                .or_else(|| stories.iter().find(|entry| entry.id.as_str().starts_with(id.as_str())))
                .map(|entry| entry.id.clone()),
            StorySpecifier::Named { name, title } => stories
                .iter()
                .find(|entry| &entry.name == name && &entry.title == title)
                .map(|entry| entry.id.clone()),
        }
    }
}
