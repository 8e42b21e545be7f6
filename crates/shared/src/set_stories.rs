//! Legacy `setStories` snapshot for managers that predate on-demand loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use storyframe_domain::{Globals, StoriesList, StoryId};

/// Whole-index snapshot, grouped by title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStoriesPayload {
    pub v: u32,
    pub stories: BTreeMap<StoryId, LegacyStory>,
    pub global_parameters: Map<String, Value>,
    pub globals: Globals,
    /// One (empty) entry per title
    pub kind_parameters: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyStory {
    pub id: StoryId,
    pub kind: String,
    pub name: String,
    pub parameters: LegacyStoryParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStoryParameters {
    /// The story's import path
    pub file_name: String,
}

impl SetStoriesPayload {
    pub fn from_index(list: &StoriesList, globals: Globals) -> Self {
        let mut stories = BTreeMap::new();
        let mut kind_parameters = BTreeMap::new();
        for entry in &list.stories {
            kind_parameters
                .entry(entry.title.clone())
                .or_insert_with(Map::new);
            stories.insert(
                entry.id.clone(),
                LegacyStory {
                    id: entry.id.clone(),
                    kind: entry.title.clone(),
                    name: entry.name.clone(),
                    parameters: LegacyStoryParameters {
                        file_name: entry.import_path.clone(),
                    },
                },
            );
        }
        Self {
            v: StoriesList::VERSION,
            stories,
            global_parameters: Map::new(),
            globals,
            kind_parameters,
        }
    }
}
