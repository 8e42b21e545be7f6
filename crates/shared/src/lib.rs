//! storyframe Shared - wire types between the preview and its manager
//!
//! This crate contains the types that cross the publish/subscribe channel:
//! - `PreviewEvent` and its `EventKind` discriminant
//! - The legacy `setStories` snapshot payload
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and the domain crate
//! 2. **No business logic** - Pure data types and serialization

pub mod events;
pub mod set_stories;

pub use events::{EventKind, ExceptionPayload, KeydownEvent, PreviewEvent};
pub use set_stories::{LegacyStory, LegacyStoryParameters, SetStoriesPayload};
