//! Unified error types for the domain layer
//!
//! Covers failures that can be detected from story data alone, before any
//! module loading or rendering takes place.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A view mode string that is neither `story` nor `docs`
    #[error("Unknown view mode: {0}")]
    UnknownViewMode(String),

    /// A persisted selection could not be parsed
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// A story definition cannot be turned into a renderable story
    #[error("Story {story} is invalid: {reason}")]
    InvalidStory { story: String, reason: String },
}

impl DomainError {
    /// Creates an invalid-story error for a story that fails preparation.
    ///
    /// # Example
    /// ```ignore
    /// return Err(DomainError::invalid_story("button--primary", "no render function"));
    /// ```
    pub fn invalid_story(story: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStory {
            story: story.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_story_message_names_the_story() {
        let err = DomainError::invalid_story("button--primary", "no render function");
        assert_eq!(
            err.to_string(),
            "Story button--primary is invalid: no render function"
        );
    }
}
