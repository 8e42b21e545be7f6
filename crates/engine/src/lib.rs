//! storyframe Engine library.
//!
//! The preview runtime: turns story modules and a stories index into
//! rendered stories, driven by events from a manager channel.
//!
//! ## Structure
//!
//! - `entities/` - CSF normalization, story preparation, the stories index
//! - `stores/` - Story cache, args, globals, hooks and selection state
//! - `use_cases/` - The preview lifecycle and story render sessions
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

/// Test fixtures shared by unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
