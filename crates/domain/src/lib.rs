//! storyframe Domain - story vocabulary shared by every other crate.
//!
//! - `ids` - string ids for stories and components
//! - `value_objects` - args, globals, parameters, arg types, selections
//! - `entities` - raw module annotations and stories index entries
//! - `context` - the story context and per-story hooks

extern crate self as storyframe_domain;

pub mod context;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use context::{Hooks, StoryContext};
pub use entities::{
    ComponentAnnotations, GlobalAnnotations, Loader, ModuleExports, PlayFunction, StaticLoader,
    StoriesList, StoryAnnotations, StoryElement, StoryFn, StoryIndexEntry,
};
pub use error::DomainError;
pub use ids::{ComponentId, StoryId};
pub use value_objects::{
    combine_arg_types, combine_parameters, infer_arg_types, map_args_to_types, shallow_merge,
    ArgType, ArgTypes, Args, GlobalTypes, Globals, Parameters, SbType, Selection,
    SelectionSpecifier, StorySpecifier, ViewMode,
};
