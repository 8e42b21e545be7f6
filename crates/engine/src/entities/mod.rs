//! Entity modules - story capability encapsulation.
//!
//! Naming rules, CSF normalization, story preparation and the stories index.
//! Stores and use cases build on these.

pub mod csf;
pub mod naming;
pub mod stories_index;
pub mod story;

pub use csf::{process_csf_file, CsfFile, CsfStory};
pub use naming::{sanitize, story_name_from_export, to_story_id};
pub use stories_index::StoriesIndex;
pub use story::{prepare_story, Story};
