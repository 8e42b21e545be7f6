//! Selections and the specifiers they are resolved from.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::args::{Args, Globals};
use super::view_mode::ViewMode;
use crate::ids::StoryId;

/// The (story, view mode) pair currently driving what is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub story_id: StoryId,
    pub view_mode: ViewMode,
}

impl Selection {
    pub fn new(story_id: impl Into<StoryId>, view_mode: ViewMode) -> Self {
        Self {
            story_id: story_id.into(),
            view_mode,
        }
    }

    pub fn story(story_id: impl Into<StoryId>) -> Self {
        Self::new(story_id, ViewMode::Story)
    }

    pub fn docs(story_id: impl Into<StoryId>) -> Self {
        Self::new(story_id, ViewMode::Docs)
    }
}

/// Something that can be resolved to a story id against the stories index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SpecifierRepr", into = "SpecifierRepr")]
pub enum StorySpecifier {
    /// `*`: whichever story comes first in the index
    First,
    /// An exact story id, or a prefix of one
    Id(String),
    /// A story name inside a title
    Named { name: String, title: String },
}

impl StorySpecifier {
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    pub fn named(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            title: title.into(),
        }
    }
}

impl From<&str> for StorySpecifier {
    fn from(value: &str) -> Self {
        if value == "*" {
            StorySpecifier::First
        } else {
            StorySpecifier::Id(value.to_string())
        }
    }
}

impl From<StoryId> for StorySpecifier {
    fn from(value: StoryId) -> Self {
        StorySpecifier::Id(value.into_string())
    }
}

impl fmt::Display for StorySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorySpecifier::First => f.write_str("*"),
            StorySpecifier::Id(id) => f.write_str(id),
            StorySpecifier::Named { name, title } => write!(f, "{title} / {name}"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SpecifierRepr {
    Text(String),
    Named { name: String, title: String },
}

impl From<SpecifierRepr> for StorySpecifier {
    fn from(value: SpecifierRepr) -> Self {
        match value {
            SpecifierRepr::Text(text) => StorySpecifier::from(text.as_str()),
            SpecifierRepr::Named { name, title } => StorySpecifier::Named { name, title },
        }
    }
}

impl From<StorySpecifier> for SpecifierRepr {
    fn from(value: StorySpecifier) -> Self {
        match value {
            StorySpecifier::First => SpecifierRepr::Text("*".to_string()),
            StorySpecifier::Id(id) => SpecifierRepr::Text(id),
            StorySpecifier::Named { name, title } => SpecifierRepr::Named { name, title },
        }
    }
}

/// A selection as persisted outside the preview (a shared link, a bookmark).
///
/// `args` and `globals` are applied once, when the specified story is first
/// selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSpecifier {
    pub story_specifier: StorySpecifier,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub globals: Option<Globals>,
}

impl SelectionSpecifier {
    pub fn new(story_specifier: impl Into<StorySpecifier>, view_mode: ViewMode) -> Self {
        Self {
            story_specifier: story_specifier.into(),
            view_mode,
            args: None,
            globals: None,
        }
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = Some(globals);
        self
    }
}
