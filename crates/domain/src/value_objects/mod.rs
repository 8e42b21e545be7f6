//! Value objects - Immutable objects defined by their attributes

mod args;
mod selection;
mod view_mode;

pub use args::{
    combine_arg_types, combine_parameters, infer_arg_types, map_args_to_types, shallow_merge,
    ArgType, ArgTypes, Args, GlobalTypes, Globals, Parameters, SbType,
};
pub use selection::{Selection, SelectionSpecifier, StorySpecifier};
pub use view_mode::ViewMode;
