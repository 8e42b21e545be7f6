//! Channel events exchanged between the preview and the manager UI.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Wire names follow the camelCase event names manager UIs already speak
//! - Renaming a variant's wire name is a breaking change

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use storyframe_domain::{ArgTypes, Args, GlobalTypes, Globals, Parameters, Selection, StoryId};

use crate::set_stories::SetStoriesPayload;

/// Every event the preview emits or listens for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum PreviewEvent {
    // =========================================================================
    // Preview → Manager
    // =========================================================================
    /// Initial globals and their declarations
    #[serde(rename_all = "camelCase")]
    SetGlobals {
        globals: Globals,
        global_types: GlobalTypes,
    },
    /// Legacy whole-index snapshot
    SetStories(SetStoriesPayload),
    /// The persisted selection resolved to this story
    StorySpecified(Selection),
    /// The current selection changed
    CurrentStoryWasSet(Selection),
    /// A story session built its context and is about to run loaders
    #[serde(rename_all = "camelCase")]
    StoryPrepared {
        id: StoryId,
        parameters: Parameters,
        initial_args: Args,
        arg_types: ArgTypes,
        args: Args,
    },
    /// A story finished rendering (including its play function)
    StoryRendered(StoryId),
    /// A different story (or view mode) is now being rendered
    StoryChanged(StoryId),
    /// A selection arrived that changes nothing
    StoryUnchanged(StoryId),
    /// The renderer or a story function failed
    StoryThrewException(ExceptionPayload),
    /// The renderer reported a user-facing problem
    StoryErrored { title: String, description: String },
    /// The requested story does not exist or failed to load
    StoryMissing(Option<String>),
    /// The preview configuration could not be evaluated
    ConfigError(ExceptionPayload),
    /// A docs page finished rendering
    DocsRendered(StoryId),
    #[serde(rename_all = "camelCase")]
    GlobalsUpdated {
        globals: Globals,
        initial_globals: Globals,
    },
    #[serde(rename_all = "camelCase")]
    StoryArgsUpdated { story_id: StoryId, args: Args },

    // =========================================================================
    // Manager → Preview
    // =========================================================================
    UpdateGlobals { globals: Globals },
    #[serde(rename_all = "camelCase")]
    UpdateStoryArgs {
        story_id: StoryId,
        updated_args: Args,
    },
    #[serde(rename_all = "camelCase")]
    ResetStoryArgs {
        story_id: StoryId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arg_names: Option<Vec<String>>,
    },
    SetCurrentStory(Selection),
    ForceReRender,
    /// Forwarded key press (preview → manager)
    PreviewKeydown { event: KeydownEvent },
}

/// Discriminant of [`PreviewEvent`], used to register listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SetGlobals,
    SetStories,
    StorySpecified,
    CurrentStoryWasSet,
    StoryPrepared,
    StoryRendered,
    StoryChanged,
    StoryUnchanged,
    StoryThrewException,
    StoryErrored,
    StoryMissing,
    ConfigError,
    DocsRendered,
    GlobalsUpdated,
    StoryArgsUpdated,
    UpdateGlobals,
    UpdateStoryArgs,
    ResetStoryArgs,
    SetCurrentStory,
    ForceReRender,
    PreviewKeydown,
}

impl EventKind {
    /// The event name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SetGlobals => "setGlobals",
            EventKind::SetStories => "setStories",
            EventKind::StorySpecified => "storySpecified",
            EventKind::CurrentStoryWasSet => "currentStoryWasSet",
            EventKind::StoryPrepared => "storyPrepared",
            EventKind::StoryRendered => "storyRendered",
            EventKind::StoryChanged => "storyChanged",
            EventKind::StoryUnchanged => "storyUnchanged",
            EventKind::StoryThrewException => "storyThrewException",
            EventKind::StoryErrored => "storyErrored",
            EventKind::StoryMissing => "storyMissing",
            EventKind::ConfigError => "configError",
            EventKind::DocsRendered => "docsRendered",
            EventKind::GlobalsUpdated => "globalsUpdated",
            EventKind::StoryArgsUpdated => "storyArgsUpdated",
            EventKind::UpdateGlobals => "updateGlobals",
            EventKind::UpdateStoryArgs => "updateStoryArgs",
            EventKind::ResetStoryArgs => "resetStoryArgs",
            EventKind::SetCurrentStory => "setCurrentStory",
            EventKind::ForceReRender => "forceReRender",
            EventKind::PreviewKeydown => "previewKeydown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PreviewEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PreviewEvent::SetGlobals { .. } => EventKind::SetGlobals,
            PreviewEvent::SetStories(_) => EventKind::SetStories,
            PreviewEvent::StorySpecified(_) => EventKind::StorySpecified,
            PreviewEvent::CurrentStoryWasSet(_) => EventKind::CurrentStoryWasSet,
            PreviewEvent::StoryPrepared { .. } => EventKind::StoryPrepared,
            PreviewEvent::StoryRendered(_) => EventKind::StoryRendered,
            PreviewEvent::StoryChanged(_) => EventKind::StoryChanged,
            PreviewEvent::StoryUnchanged(_) => EventKind::StoryUnchanged,
            PreviewEvent::StoryThrewException(_) => EventKind::StoryThrewException,
            PreviewEvent::StoryErrored { .. } => EventKind::StoryErrored,
            PreviewEvent::StoryMissing(_) => EventKind::StoryMissing,
            PreviewEvent::ConfigError(_) => EventKind::ConfigError,
            PreviewEvent::DocsRendered(_) => EventKind::DocsRendered,
            PreviewEvent::GlobalsUpdated { .. } => EventKind::GlobalsUpdated,
            PreviewEvent::StoryArgsUpdated { .. } => EventKind::StoryArgsUpdated,
            PreviewEvent::UpdateGlobals { .. } => EventKind::UpdateGlobals,
            PreviewEvent::UpdateStoryArgs { .. } => EventKind::UpdateStoryArgs,
            PreviewEvent::ResetStoryArgs { .. } => EventKind::ResetStoryArgs,
            PreviewEvent::SetCurrentStory(_) => EventKind::SetCurrentStory,
            PreviewEvent::ForceReRender => EventKind::ForceReRender,
            PreviewEvent::PreviewKeydown { .. } => EventKind::PreviewKeydown,
        }
    }

    /// The story an args event targets, if any.
    pub fn target_story(&self) -> Option<&StoryId> {
        match self {
            PreviewEvent::UpdateStoryArgs { story_id, .. }
            | PreviewEvent::ResetStoryArgs { story_id, .. }
            | PreviewEvent::StoryArgsUpdated { story_id, .. } => Some(story_id),
            _ => None,
        }
    }
}

/// An error flattened for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ExceptionPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// Capture an error and its source chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            stack: (!chain.is_empty()).then(|| chain.join("\n")),
        }
    }
}

/// The subset of a keyboard event the manager needs for its shortcuts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeydownEvent {
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub key: String,
    pub code: String,
    pub key_code: u32,
}

/// Convenience for building JSON payloads in handlers.
pub fn to_value(event: &PreviewEvent) -> Value {
    serde_json::to_value(event).unwrap_or(Value::Null)
}
