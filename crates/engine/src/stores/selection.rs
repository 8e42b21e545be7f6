//! Selection tracking.
//!
//! Remembers the specifier the preview started from (typically parsed from
//! the URL) and the selection currently driving rendering.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use storyframe_domain::{
    Args, DomainError, Globals, Selection, SelectionSpecifier, StorySpecifier, ViewMode,
};

#[derive(Debug, Default)]
struct SelectionState {
    specifier: Option<SelectionSpecifier>,
    selection: Option<Selection>,
}

#[derive(Debug, Default)]
pub struct SelectionStore {
    state: Mutex<SelectionState>,
}

impl SelectionStore {
    pub fn new(specifier: Option<SelectionSpecifier>) -> Self {
        Self {
            state: Mutex::new(SelectionState {
                specifier,
                selection: None,
            }),
        }
    }

    /// Build a store from a URL query string such as
    /// `id=button--primary&viewMode=story&args=label:Hi;primary:!true`.
    pub fn from_query(query: &str) -> Result<Self, DomainError> {
        Ok(Self::new(parse_selection_query(query)?))
    }

    fn state(&self) -> MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn selection_specifier(&self) -> Option<SelectionSpecifier> {
        self.state().specifier.clone()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.state().selection.clone()
    }

    pub fn set_selection(&self, selection: Selection) {
        self.state().selection = Some(selection);
    }
}

/// Parse a persisted selection out of a URL query.
///
/// Returns `Ok(None)` when the query names no story at all.
pub fn parse_selection_query(query: &str) -> Result<Option<SelectionSpecifier>, DomainError> {
    let query = query.trim_start_matches('?');
    let mut story: Option<StorySpecifier> = None;
    let mut view_mode: Option<ViewMode> = None;
    let mut args: Option<Args> = None;
    let mut globals: Option<Globals> = None;

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "id" => story = Some(StorySpecifier::from(value.as_ref())),
            "path" => {
                let (mode, id) = parse_path(&value)?;
                story = Some(StorySpecifier::from(id));
                view_mode = view_mode.or(Some(mode));
            }
            "viewMode" => view_mode = Some(value.parse()?),
            "args" => args = Some(parse_pairs(&value)?),
            "globals" => globals = Some(parse_pairs(&value)?),
            _ => {}
        }
    }

    Ok(story.map(|story_specifier| SelectionSpecifier {
        story_specifier,
        view_mode: view_mode.unwrap_or_default(),
        args,
        globals,
    }))
}

/// `/story/button--primary` or `/docs/button--primary`.
fn parse_path(path: &str) -> Result<(ViewMode, &str), DomainError> {
    let mut parts = path.trim_start_matches('/').splitn(2, '/');
    match (parts.next(), parts.next()) {
        (Some(mode), Some(id)) if !id.is_empty() => Ok((mode.parse()?, id)),
        _ => Err(DomainError::invalid_selection(format!(
            "path '{path}' is not /<viewMode>/<storyId>"
        ))),
    }
}

/// `key:value;flag:!true;empty:!null`.
fn parse_pairs(encoded: &str) -> Result<Args, DomainError> {
    let mut pairs = Args::new();
    for pair in encoded.split(';').filter(|pair| !pair.is_empty()) {
        let Some((key, raw)) = pair.split_once(':') else {
            return Err(DomainError::invalid_selection(format!(
                "'{pair}' is not key:value"
            )));
        };
        let value = match raw {
            "!true" => Value::Bool(true),
            "!false" => Value::Bool(false),
            "!null" => Value::Null,
            "!undefined" => continue,
            _ => Value::String(raw.to_string()),
        };
        pairs.insert(key.to_string(), value);
    }
    Ok(pairs)
}
