//! In-memory state storage modules.
//!
//! Stores hold the preview's runtime state:
//! - `StoryStore` - CSF file and prepared story caches, story contexts
//! - `ArgsStore` - current args per story
//! - `GlobalsStore` - current globals
//! - `HooksRegistry` - per-story hooks objects
//! - `SelectionStore` - persisted specifier and current selection

pub mod args;
pub mod globals;
pub mod hooks;
pub mod selection;
pub mod story_store;

pub use args::ArgsStore;
pub use globals::GlobalsStore;
pub use hooks::HooksRegistry;
pub use selection::{parse_selection_query, SelectionStore};
pub use story_store::{StoreError, StoryStore};
