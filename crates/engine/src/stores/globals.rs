//! Process-wide globals storage.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use storyframe_domain::{shallow_merge, GlobalTypes, Globals};

#[derive(Debug, Default)]
struct GlobalsState {
    initial: Globals,
    current: Globals,
    global_types: GlobalTypes,
}

impl GlobalsState {
    /// Split `globals` into the declared ones (initially set, or typed) and
    /// the names of the rest.
    fn declared(&self, globals: &Globals) -> (Globals, Vec<String>) {
        let mut accepted = Globals::new();
        let mut dropped = Vec::new();
        for (key, value) in globals {
            if self.initial.contains_key(key) || self.global_types.contains_key(key) {
                accepted.insert(key.clone(), value.clone());
            } else {
                dropped.push(key.clone());
            }
        }
        (accepted, dropped)
    }

    /// Globals whose current value differs from the initial one.
    fn user_changes(&self) -> Globals {
        self.current
            .iter()
            .filter(|(key, value)| self.initial.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// The current globals and the snapshot they started from.
#[derive(Debug, Default)]
pub struct GlobalsStore {
    state: RwLock<GlobalsState>,
}

impl GlobalsStore {
    pub fn new(globals: Globals, global_types: GlobalTypes) -> Self {
        let store = Self::default();
        store.set(globals, global_types);
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, GlobalsState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GlobalsState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the initial globals and types: used when the global
    /// annotations change.
    ///
    /// Declared global types contribute their `defaultValue` for any global
    /// not given explicitly. Globals the user changed are re-applied when
    /// they are still declared.
    pub fn set(&self, globals: Globals, global_types: GlobalTypes) {
        let mut initial = Globals::new();
        for (key, declaration) in &global_types {
            if let Some(default) = declaration.get("defaultValue") {
                initial.insert(key.clone(), default.clone());
            }
        }
        shallow_merge(&mut initial, &globals);

        let mut state = self.write();
        let changes = state.user_changes();
        state.current = initial.clone();
        state.initial = initial;
        state.global_types = global_types;

        let (kept, dropped) = state.declared(&changes);
        if !dropped.is_empty() {
            tracing::debug!(dropped = ?dropped, "Dropping changed globals that are no longer declared");
        }
        shallow_merge(&mut state.current, &kept);
    }

    pub fn get(&self) -> Globals {
        self.read().current.clone()
    }

    pub fn initial_globals(&self) -> Globals {
        self.read().initial.clone()
    }

    pub fn global_types(&self) -> GlobalTypes {
        self.read().global_types.clone()
    }

    /// Shallow-merge `partial` into the current globals and return them.
    pub fn update(&self, partial: &Globals) -> Globals {
        let mut state = self.write();
        shallow_merge(&mut state.current, partial);
        state.current.clone()
    }

    /// One-time hydration before the first render. Only globals that are
    /// declared (initially set, or typed) are accepted.
    pub fn update_from_persisted(&self, persisted: &Globals) -> Globals {
        let mut state = self.write();
        let (accepted, dropped) = state.declared(persisted);
        if !dropped.is_empty() {
            tracing::warn!(dropped = ?dropped, "Ignoring persisted globals that are not declared");
        }
        shallow_merge(&mut state.current, &accepted);
        state.current.clone()
    }
}
