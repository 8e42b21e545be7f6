//! Raw story annotations as exported by a story module.
//!
//! A module exports one set of component annotations (the default export) and
//! any number of named story exports. Global annotations come from the preview
//! configuration and apply to every story.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::StoryContext;
use crate::value_objects::{ArgTypes, Args, GlobalTypes, Globals, Parameters};

/// Framework-agnostic output of a story's render function.
pub type StoryElement = Value;

/// Fetches extra data before a story renders. The returned record lands in
/// `StoryContext::loaded`.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, context: &StoryContext) -> anyhow::Result<Map<String, Value>>;
}

/// The unbound render function of a story.
pub trait StoryFn: Send + Sync {
    fn render(&self, context: &StoryContext) -> anyhow::Result<StoryElement>;
}

impl<F> StoryFn for F
where
    F: Fn(&StoryContext) -> anyhow::Result<StoryElement> + Send + Sync,
{
    fn render(&self, context: &StoryContext) -> anyhow::Result<StoryElement> {
        self(context)
    }
}

/// Post-render interaction script.
#[async_trait]
pub trait PlayFunction: Send + Sync {
    async fn play(&self, context: &StoryContext) -> anyhow::Result<()>;
}

/// A loader that always yields the same values.
pub struct StaticLoader {
    values: Map<String, Value>,
}

impl StaticLoader {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

#[async_trait]
impl Loader for StaticLoader {
    async fn load(&self, _context: &StoryContext) -> anyhow::Result<Map<String, Value>> {
        Ok(self.values.clone())
    }
}

/// Annotations of one named story export.
#[derive(Clone, Default)]
pub struct StoryAnnotations {
    /// Display name; derived from the export name when absent
    pub name: Option<String>,
    pub args: Args,
    pub arg_types: ArgTypes,
    pub parameters: Parameters,
    pub loaders: Vec<Arc<dyn Loader>>,
    pub render: Option<Arc<dyn StoryFn>>,
    pub play: Option<Arc<dyn PlayFunction>>,
}

impl StoryAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg_types(mut self, arg_types: ArgTypes) -> Self {
        self.arg_types = arg_types;
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loaders.push(loader);
        self
    }

    pub fn with_render(mut self, render: Arc<dyn StoryFn>) -> Self {
        self.render = Some(render);
        self
    }

    pub fn with_play(mut self, play: Arc<dyn PlayFunction>) -> Self {
        self.play = Some(play);
        self
    }
}

impl fmt::Debug for StoryAnnotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryAnnotations")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("parameters", &self.parameters)
            .field("loaders", &self.loaders.len())
            .field("has_render", &self.render.is_some())
            .field("has_play", &self.play.is_some())
            .finish_non_exhaustive()
    }
}

/// The default export of a story module.
#[derive(Clone, Default)]
pub struct ComponentAnnotations {
    pub title: Option<String>,
    /// Overrides the component id derived from the title
    pub id: Option<String>,
    pub args: Args,
    pub arg_types: ArgTypes,
    pub parameters: Parameters,
    pub loaders: Vec<Arc<dyn Loader>>,
    pub render: Option<Arc<dyn StoryFn>>,
    /// Only these export names are stories, when set
    pub include_stories: Option<Vec<String>>,
    /// These export names are never stories
    pub exclude_stories: Option<Vec<String>>,
}

impl ComponentAnnotations {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_render(mut self, render: Arc<dyn StoryFn>) -> Self {
        self.render = Some(render);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loaders.push(loader);
        self
    }
}

impl fmt::Debug for ComponentAnnotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentAnnotations")
            .field("title", &self.title)
            .field("id", &self.id)
            .field("args", &self.args)
            .field("parameters", &self.parameters)
            .field("loaders", &self.loaders.len())
            .field("has_render", &self.render.is_some())
            .finish_non_exhaustive()
    }
}

/// Everything one story module exports.
#[derive(Clone, Default, Debug)]
pub struct ModuleExports {
    pub default: ComponentAnnotations,
    /// Named exports in declaration order
    pub stories: Vec<(String, StoryAnnotations)>,
}

impl ModuleExports {
    pub fn new(default: ComponentAnnotations) -> Self {
        Self {
            default,
            stories: Vec::new(),
        }
    }

    pub fn with_story(mut self, export_name: impl Into<String>, story: StoryAnnotations) -> Self {
        self.stories.push((export_name.into(), story));
        self
    }
}

/// Project-wide annotations from the preview configuration.
#[derive(Clone, Default)]
pub struct GlobalAnnotations {
    pub parameters: Parameters,
    pub args: Args,
    pub arg_types: ArgTypes,
    pub globals: Globals,
    pub global_types: GlobalTypes,
    pub loaders: Vec<Arc<dyn Loader>>,
    pub render: Option<Arc<dyn StoryFn>>,
}

impl GlobalAnnotations {
    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    pub fn with_global_types(mut self, global_types: GlobalTypes) -> Self {
        self.global_types = global_types;
        self
    }

    pub fn with_render(mut self, render: Arc<dyn StoryFn>) -> Self {
        self.render = Some(render);
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }
}

impl fmt::Debug for GlobalAnnotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalAnnotations")
            .field("parameters", &self.parameters)
            .field("globals", &self.globals)
            .field("global_types", &self.global_types)
            .field("loaders", &self.loaders.len())
            .field("has_render", &self.render.is_some())
            .finish_non_exhaustive()
    }
}
