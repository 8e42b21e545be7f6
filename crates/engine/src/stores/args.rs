//! Per-story args storage.
//!
//! Holds the current args of every story that has been read or updated, plus
//! the initial args each entry was seeded from. Entries are created lazily;
//! args written before a story is prepared are kept and merged over its
//! initial args once it is.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use storyframe_domain::{map_args_to_types, shallow_merge, Args, StoryId};

use crate::entities::Story;

#[derive(Debug, Clone, Default)]
struct StoryArgs {
    initial: Args,
    current: Args,
    seeded: bool,
}

impl StoryArgs {
    fn seeded_from(story: &Story) -> Self {
        Self {
            initial: story.initial_args.clone(),
            current: story.initial_args.clone(),
            seeded: true,
        }
    }
}

/// Current args keyed by story id.
#[derive(Debug, Default)]
pub struct ArgsStore {
    entries: Mutex<HashMap<StoryId, StoryArgs>>,
}

impl ArgsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<StoryId, StoryArgs>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The entry for `story`, seeded from its initial args if it has not
    /// been yet.
    fn seeded<'a>(
        entries: &'a mut HashMap<StoryId, StoryArgs>,
        story: &Story,
    ) -> &'a mut StoryArgs {
        let entry = entries.entry(story.id.clone()).or_default();
        if !entry.seeded {
            let pending = std::mem::take(&mut entry.current);
            *entry = StoryArgs::seeded_from(story);
            shallow_merge(&mut entry.current, &pending);
        }
        entry
    }

    /// Record a story's initial args, seeding its current args if unset.
    pub fn set_initial(&self, story: &Story) {
        let mut entries = self.entries();
        Self::seeded(&mut entries, story).initial = story.initial_args.clone();
    }

    pub fn get(&self, story_id: &StoryId) -> Option<Args> {
        self.entries().get(story_id).map(|entry| entry.current.clone())
    }

    /// Current args for `story`, seeded from its initial args on first read.
    pub fn get_or_seed(&self, story: &Story) -> Args {
        let mut entries = self.entries();
        Self::seeded(&mut entries, story).current.clone()
    }

    /// Shallow-merge `partial` into the story's current args and return them.
    pub fn update(&self, story_id: &StoryId, partial: &Args) -> Args {
        let mut entries = self.entries();
        let entry = entries.entry(story_id.clone()).or_default();
        shallow_merge(&mut entry.current, partial);
        entry.current.clone()
    }

    /// Restore `arg_names` (every currently set name when `None`) to their
    /// initial values. Names with no initial value are removed.
    pub fn reset(&self, story_id: &StoryId, arg_names: Option<&[String]>) -> Args {
        let mut entries = self.entries();
        let entry = entries.entry(story_id.clone()).or_default();
        let names: Vec<String> = match arg_names {
            Some(names) => names.to_vec(),
            None => entry
                .current
                .keys()
                .chain(entry.initial.keys())
                .cloned()
                .collect(),
        };
        for name in names {
            match entry.initial.get(&name) {
                Some(value) => {
                    entry.current.insert(name, value.clone());
                }
                None => {
                    entry.current.remove(&name);
                }
            }
        }
        entry.current.clone()
    }

    /// One-time hydration from a shared or bookmarked selection.
    ///
    /// Persisted values are coerced to the story's arg types; undeclared or
    /// incompatible ones are dropped with a warning.
    pub fn update_from_persisted(&self, story: &Story, persisted: &Args) -> Args {
        let (mapped, dropped) = map_args_to_types(persisted, &story.arg_types);
        if !dropped.is_empty() {
            tracing::warn!(
                story_id = %story.id,
                dropped = ?dropped,
                "Ignoring persisted args that do not match the story's arg types"
            );
        }
        self.get_or_seed(story);
        self.update(&story.id, &mapped)
    }

    /// Discard everything set for the previous implementation of a story and
    /// reseed from the new one.
    pub fn reset_on_implementation_change(&self, story: &Story, previous: &Story) {
        tracing::debug!(
            story_id = %story.id,
            previous_id = %previous.id,
            "Story implementation changed, reseeding args"
        );
        self.entries()
            .insert(story.id.clone(), StoryArgs::seeded_from(story));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::stories::{obj, prepared};
    use serde_json::{json, Value};
    use storyframe_domain::{ArgType, ArgTypes, ComponentAnnotations, ModuleExports, SbType, StoryAnnotations};

    fn story() -> std::sync::Arc<Story> {
        let module = ModuleExports::new(ComponentAnnotations::titled("Button"))
            .with_story("primary", StoryAnnotations::new().with_args(obj(json!({"label": "Hi", "size": 1}))));
        prepared(module, "./Button.stories.json", "Button", 0)
    }

    #[test]
    fn updates_merge_and_reset_restores_named_args() {
        let store = ArgsStore::new();
        let story = story();
        store.set_initial(&story);

        store.update(&story.id, &obj(json!({"a": 1})));
        let args = store.update(&story.id, &obj(json!({"b": 2, "label": "Bye"})));
        assert_eq!(
            Value::Object(args),
            json!({"label": "Bye", "size": 1, "a": 1, "b": 2})
        );

        let args = store.reset(&story.id, Some(&["label".to_string(), "a".to_string()]));
        assert_eq!(Value::Object(args), json!({"label": "Hi", "size": 1, "b": 2}));

        let args = store.reset(&story.id, None);
        assert_eq!(Value::Object(args), json!({"label": "Hi", "size": 1}));
    }

    #[test]
    fn reads_seed_from_initial_args() {
        let store = ArgsStore::new();
        let story = story();

        assert_eq!(store.get(&story.id), None);
        assert_eq!(Value::Object(store.get_or_seed(&story)), json!({"label": "Hi", "size": 1}));
        assert!(store.get(&story.id).is_some());
    }

    #[test]
    fn updates_before_seeding_merge_over_initial_args() {
        let store = ArgsStore::new();
        let story = story();

        store.update(&story.id, &obj(json!({"extra": 1, "label": "Early"})));
        store.set_initial(&story);

        assert_eq!(
            Value::Object(store.get(&story.id).unwrap()),
            json!({"label": "Early", "size": 1, "extra": 1})
        );
        let args = store.reset(&story.id, None);
        assert_eq!(Value::Object(args), json!({"label": "Hi", "size": 1}));
    }

    #[test]
    fn persisted_args_are_coerced_and_filtered() {
        let store = ArgsStore::new();
        let story = story();

        let args = store.update_from_persisted(
            &story,
            &obj(json!({"size": "3", "label": "From URL", "unknown": "x"})),
        );

        assert_eq!(Value::Object(args), json!({"label": "From URL", "size": 3}));
    }

    #[test]
    fn implementation_change_reseeds_from_new_story() {
        let store = ArgsStore::new();
        let previous = story();
        store.set_initial(&previous);
        store.update(&previous.id, &obj(json!({"label": "Edited", "stale": true})));

        let mut arg_types = ArgTypes::new();
        arg_types.insert("label".to_string(), ArgType::named("label", SbType::String));
        let module = ModuleExports::new(ComponentAnnotations::titled("Button")).with_story(
            "primary",
            StoryAnnotations::new()
                .with_args(obj(json!({"label": "New"})))
                .with_arg_types(arg_types),
        );
        let next = prepared(module, "./Button.stories.json", "Button", 0);

        store.reset_on_implementation_change(&next, &previous);

        assert_eq!(Value::Object(store.get(&next.id).unwrap()), json!({"label": "New"}));
    }
}
