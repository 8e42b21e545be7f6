//! Story modules and the stories index read from JSON files.
//!
//! A story module file looks like:
//!
//! ```json
//! {
//!   "default": {"title": "Button", "args": {"label": "Hi"}, "template": "<button>{{label}}</button>"},
//!   "stories": [
//!     {"export": "primary", "args": {"primary": true}},
//!     {"export": "withData", "loaders": {"user": "ada"}, "template": "{{loaded.user}}"}
//!   ]
//! }
//! ```
//!
//! Templates stand in for render functions: `{{name}}` reads an arg,
//! `{{globals.name}}` a global and `{{loaded.name}}` loader output.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use storyframe_domain::{
    ArgTypes, Args, ComponentAnnotations, GlobalAnnotations, GlobalTypes, Globals, ModuleExports,
    Parameters, StaticLoader, StoriesList, StoryAnnotations, StoryContext, StoryElement, StoryFn,
};

use crate::infrastructure::ports::{LoadError, ModuleLoader, StoriesIndexSource};

/// File name of the project-wide annotations inside the stories directory.
pub const PREVIEW_FILE: &str = "preview.json";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeta {
    title: Option<String>,
    id: Option<String>,
    #[serde(default)]
    args: Args,
    #[serde(default)]
    arg_types: ArgTypes,
    #[serde(default)]
    parameters: Parameters,
    template: Option<String>,
    loaders: Option<Map<String, Value>>,
    include_stories: Option<Vec<String>>,
    exclude_stories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStory {
    export: String,
    name: Option<String>,
    #[serde(default)]
    args: Args,
    #[serde(default)]
    arg_types: ArgTypes,
    #[serde(default)]
    parameters: Parameters,
    template: Option<String>,
    loaders: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    #[serde(default)]
    default: RawMeta,
    #[serde(default)]
    stories: Vec<RawStory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPreview {
    #[serde(default)]
    parameters: Parameters,
    #[serde(default)]
    args: Args,
    #[serde(default)]
    arg_types: ArgTypes,
    #[serde(default)]
    globals: Globals,
    #[serde(default)]
    global_types: GlobalTypes,
    template: Option<String>,
    loaders: Option<Map<String, Value>>,
}

impl RawModule {
    fn into_exports(self) -> ModuleExports {
        let meta = self.default;
        let mut default = ComponentAnnotations {
            title: meta.title,
            id: meta.id,
            args: meta.args,
            arg_types: meta.arg_types,
            parameters: meta.parameters,
            include_stories: meta.include_stories,
            exclude_stories: meta.exclude_stories,
            ..ComponentAnnotations::default()
        };
        if let Some(template) = meta.template {
            default = default.with_render(TemplateRender::shared(template));
        }
        if let Some(values) = meta.loaders {
            default = default.with_loader(Arc::new(StaticLoader::new(values)));
        }

        let mut exports = ModuleExports::new(default);
        for raw in self.stories {
            let mut story = StoryAnnotations::new()
                .with_args(raw.args)
                .with_arg_types(raw.arg_types)
                .with_parameters(raw.parameters);
            if let Some(name) = raw.name {
                story = story.with_name(name);
            }
            if let Some(template) = raw.template {
                story = story.with_render(TemplateRender::shared(template));
            }
            if let Some(values) = raw.loaders {
                story = story.with_loader(Arc::new(StaticLoader::new(values)));
            }
            exports = exports.with_story(raw.export, story);
        }
        exports
    }
}

impl RawPreview {
    fn into_annotations(self) -> GlobalAnnotations {
        let mut annotations = GlobalAnnotations {
            parameters: self.parameters,
            args: self.args,
            arg_types: self.arg_types,
            globals: self.globals,
            global_types: self.global_types,
            ..GlobalAnnotations::default()
        };
        if let Some(template) = self.template {
            annotations = annotations.with_render(TemplateRender::shared(template));
        }
        if let Some(values) = self.loaders {
            annotations
                .loaders
                .push(Arc::new(StaticLoader::new(values)));
        }
        annotations
    }
}

// =============================================================================
// Template render function
// =============================================================================

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*(?:(globals|loaded)\.)?([A-Za-z0-9_-]+)\s*\}\}")
            .expect("placeholder pattern is invalid")
    })
}

/// Renders a string template against the story context.
#[derive(Debug, Clone)]
pub struct TemplateRender {
    template: String,
}

impl TemplateRender {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn shared(template: String) -> Arc<dyn StoryFn> {
        Arc::new(Self::new(template))
    }

    pub fn fill(&self, context: &StoryContext) -> String {
        placeholder_regex()
            .replace_all(&self.template, |caps: &regex_lite::Captures<'_>| {
                let source = match caps.get(1).map(|m| m.as_str()) {
                    Some("globals") => &context.globals,
                    Some("loaded") => &context.loaded,
                    _ => &context.args,
                };
                match source.get(&caps[2]) {
                    Some(Value::String(text)) => text.clone(),
                    Some(value) => value.to_string(),
                    None => String::new(),
                }
            })
            .into_owned()
    }
}

impl StoryFn for TemplateRender {
    fn render(&self, context: &StoryContext) -> anyhow::Result<StoryElement> {
        Ok(json!({
            "story": context.id.as_str(),
            "html": self.fill(context),
        }))
    }
}

// =============================================================================
// Loaders
// =============================================================================

/// Imports story modules from JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct JsonModuleLoader {
    root: PathBuf,
}

impl JsonModuleLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an import path against the root. Paths that climb out of the
    /// root resolve to nothing.
    fn resolve(&self, import_path: &str) -> Option<PathBuf> {
        let relative = Path::new(import_path.trim_start_matches("./"));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(resolved)
    }

    /// Read the project-wide annotations. A missing file yields empty ones.
    pub async fn global_annotations(&self) -> anyhow::Result<GlobalAnnotations> {
        let path = self.root.join(PREVIEW_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No preview file, using empty annotations");
                return Ok(GlobalAnnotations::default());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("reading {}", path.display())))
            }
        };
        let raw: RawPreview = serde_json::from_str(&text)
            .map_err(|e| anyhow::Error::new(e).context(format!("parsing {}", path.display())))?;
        Ok(raw.into_annotations())
    }
}

#[async_trait]
impl ModuleLoader for JsonModuleLoader {
    async fn import(&self, path: &str) -> Result<Arc<ModuleExports>, LoadError> {
        let file = self.resolve(path).ok_or_else(|| LoadError::not_found(path))?;
        let text = match tokio::fs::read_to_string(&file).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::not_found(path))
            }
            Err(e) => return Err(LoadError::evaluation(path, e)),
        };
        let raw: RawModule =
            serde_json::from_str(&text).map_err(|e| LoadError::evaluation(path, e))?;
        tracing::debug!(path, stories = raw.stories.len(), "Imported story module");
        Ok(Arc::new(raw.into_exports()))
    }
}

/// Reads the stories index from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileIndexSource {
    path: PathBuf,
}

impl FileIndexSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StoriesIndexSource for FileIndexSource {
    async fn fetch(&self) -> Result<StoriesList, LoadError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LoadError::index(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| LoadError::index(format!("{}: {e}", self.path.display())))
    }
}
