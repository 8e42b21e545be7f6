//! Domain entities

mod annotations;
mod index_entry;

pub use annotations::{
    ComponentAnnotations, GlobalAnnotations, Loader, ModuleExports, PlayFunction, StaticLoader,
    StoryAnnotations, StoryElement, StoryFn,
};
pub use index_entry::{StoriesList, StoryIndexEntry};
