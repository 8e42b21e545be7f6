//! Prepared stories.
//!
//! A [`Story`] is one fully resolved story: merged parameters, arg types and
//! initial args, plus the loaders, render function and play function it runs
//! with. Stories are immutable once prepared and shared behind `Arc`.

use std::fmt;
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::{Map, Value};
use storyframe_domain::{
    combine_arg_types, combine_parameters, infer_arg_types, shallow_merge, ArgTypes, Args,
    ComponentId, DomainError, GlobalAnnotations, Loader, Parameters, PlayFunction, StoryContext,
    StoryElement, StoryFn, StoryId,
};

use super::csf::{CsfFile, CsfStory};

pub struct Story {
    pub id: StoryId,
    pub name: String,
    pub title: String,
    pub component_id: ComponentId,
    pub parameters: Parameters,
    pub arg_types: ArgTypes,
    pub initial_args: Args,
    loaders: Vec<Arc<dyn Loader>>,
    render: Arc<dyn StoryFn>,
    play: Option<Arc<dyn PlayFunction>>,
}

impl Story {
    /// Stories marked `docsOnly` always render through the docs path.
    pub fn is_docs_only(&self) -> bool {
        self.parameters
            .get("docsOnly")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn has_play(&self) -> bool {
        self.play.is_some()
    }

    /// Run every loader concurrently and merge their output, later loaders
    /// winning on key clashes.
    pub async fn apply_loaders(&self, context: &StoryContext) -> anyhow::Result<Map<String, Value>> {
        let results = try_join_all(self.loaders.iter().map(|loader| loader.load(context))).await?;
        let mut loaded = Map::new();
        for result in &results {
            shallow_merge(&mut loaded, result);
        }
        Ok(loaded)
    }

    /// Call the unbound render function with `context`.
    pub fn render_with(&self, context: &StoryContext) -> anyhow::Result<StoryElement> {
        self.render.render(context)
    }

    /// Run the play function, if the story has one.
    pub async fn run_play(&self, context: &StoryContext) -> anyhow::Result<()> {
        match &self.play {
            Some(play) => play.play(context).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Story")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("title", &self.title)
            .field("initial_args", &self.initial_args)
            .field("loaders", &self.loaders.len())
            .field("has_play", &self.play.is_some())
            .finish_non_exhaustive()
    }
}

/// Resolve one CSF story against its file and the global annotations.
///
/// Fails when no render function is found at story, component or global
/// level.
pub fn prepare_story(
    csf_story: &CsfStory,
    csf_file: &CsfFile,
    global: &GlobalAnnotations,
) -> Result<Story, DomainError> {
    let story = &csf_story.annotations;
    let meta = &csf_file.meta;

    let parameters = combine_parameters(&[&global.parameters, &meta.parameters, &story.parameters]);

    let declared = combine_arg_types(&[&global.arg_types, &meta.arg_types, &story.arg_types]);
    let mut initial_args = Args::new();
    for (key, arg_type) in &declared {
        if let Some(default) = &arg_type.default_value {
            initial_args.insert(key.clone(), default.clone());
        }
    }
    for layer in [&global.args, &meta.args, &story.args] {
        shallow_merge(&mut initial_args, layer);
    }
    let arg_types = infer_arg_types(&declared, &initial_args);

    let loaders = global
        .loaders
        .iter()
        .chain(&meta.loaders)
        .chain(&story.loaders)
        .cloned()
        .collect();

    let render = story
        .render
        .clone()
        .or_else(|| meta.render.clone())
        .or_else(|| global.render.clone())
        .ok_or_else(|| {
            DomainError::invalid_story(csf_story.id.as_str(), "no render function is defined")
        })?;

    Ok(Story {
        id: csf_story.id.clone(),
        name: csf_story.name.clone(),
        title: csf_file.title.clone(),
        component_id: csf_file.component_id.clone(),
        parameters,
        arg_types,
        initial_args,
        loaders,
        render,
        play: story.play.clone(),
    })
}
