//! Stories index entries and the versioned list that holds them.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ids::StoryId;

/// One story as published by the index: where it lives and what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryIndexEntry {
    #[serde(default = "unset_id")]
    pub id: StoryId,
    pub title: String,
    pub name: String,
    pub import_path: String,
}

fn unset_id() -> StoryId {
    StoryId::new("")
}

/// Versioned, ordered catalog of every story.
///
/// Order is the order of the `stories` object on the wire; the first entry is
/// what `*` resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoriesList {
    pub v: u32,
    #[serde(
        serialize_with = "serialize_entries",
        deserialize_with = "deserialize_entries"
    )]
    pub stories: Vec<StoryIndexEntry>,
}

impl StoriesList {
    pub const VERSION: u32 = 3;

    pub fn new(stories: Vec<StoryIndexEntry>) -> Self {
        Self {
            v: Self::VERSION,
            stories,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

impl Default for StoriesList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn serialize_entries<S>(entries: &[StoryIndexEntry], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for entry in entries {
        map.serialize_entry(entry.id.as_str(), entry)?;
    }
    map.end()
}

fn deserialize_entries<'de, D>(deserializer: D) -> Result<Vec<StoryIndexEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<StoryIndexEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of story id to index entry")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((id, mut entry)) = access.next_entry::<String, StoryIndexEntry>()? {
                // The key is authoritative; the body may omit the id
                entry.id = StoryId::new(id);
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_order_is_preserved() {
        let list: StoriesList = serde_json::from_str(
            r#"{
                "v": 3,
                "stories": {
                    "zeta--last": {"title": "Zeta", "name": "Last", "importPath": "./Zeta.js"},
                    "alpha--first": {"title": "Alpha", "name": "First", "importPath": "./Alpha.js"}
                }
            }"#,
        )
        .expect("stories list");

        let ids: Vec<_> = list.stories.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta--last", "alpha--first"]);
    }

    #[test]
    fn serializes_back_to_an_id_keyed_object() {
        let list = StoriesList::new(vec![StoryIndexEntry {
            id: StoryId::new("a--b"),
            title: "A".into(),
            name: "B".into(),
            import_path: "./A.js".into(),
        }]);

        assert_eq!(
            serde_json::to_value(&list).expect("serialize"),
            json!({
                "v": 3,
                "stories": {
                    "a--b": {"id": "a--b", "title": "A", "name": "B", "importPath": "./A.js"}
                }
            })
        );
    }
}
