//! Per-story hooks registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storyframe_domain::{Hooks, StoryId};

/// Hands out one [`Hooks`] object per story id, created on first use.
#[derive(Debug, Default)]
pub struct HooksRegistry {
    hooks: Mutex<HashMap<StoryId, Arc<Hooks>>>,
}

impl HooksRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn hooks(&self) -> MutexGuard<'_, HashMap<StoryId, Arc<Hooks>>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn hooks_for(&self, story_id: &StoryId) -> Arc<Hooks> {
        self.hooks()
            .entry(story_id.clone())
            .or_insert_with(|| Arc::new(Hooks::new()))
            .clone()
    }

    /// Run the story's hook cleanups. The hooks object itself is kept.
    pub fn clean(&self, story_id: &StoryId) {
        // Cleanups may call back into the registry
        let hooks = self.hooks().get(story_id).cloned();
        if let Some(hooks) = hooks {
            hooks.clean();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_story_gets_same_hooks() {
        let registry = HooksRegistry::new();
        let id = StoryId::new("button--primary");

        let first = registry.hooks_for(&id);
        let second = registry.hooks_for(&id);
        let other = registry.hooks_for(&StoryId::new("button--secondary"));

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn clean_only_touches_the_named_story() {
        let registry = HooksRegistry::new();
        let id = StoryId::new("button--primary");
        let other = StoryId::new("button--secondary");
        let hooks = registry.hooks_for(&id);
        let other_hooks = registry.hooks_for(&other);

        registry.clean(&id);
        registry.clean(&StoryId::new("never-rendered"));

        assert_eq!(hooks.clean_count(), 1);
        assert_eq!(other_hooks.clean_count(), 0);
        assert!(Arc::ptr_eq(&hooks, &registry.hooks_for(&id)));
    }
}
