//! Story modules, indexes and annotations shared by tests.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use storyframe_domain::{
    ComponentAnnotations, GlobalAnnotations, ModuleExports, StoriesList, StoryAnnotations,
    StoryContext, StoryElement, StoryFn, StoryId, StoryIndexEntry,
};

use crate::entities::{prepare_story, process_csf_file, Story};

/// Unwrap a `json!({...})` literal into a map.
pub fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Renders the context it was given, so tests can assert on what a render saw.
pub fn echo_render() -> Arc<dyn StoryFn> {
    Arc::new(|context: &StoryContext| -> anyhow::Result<StoryElement> {
        Ok(json!({
            "story": context.id.as_str(),
            "args": context.args,
            "globals": context.globals,
            "loaded": context.loaded,
        }))
    })
}

/// Stories `a` and `b`, served from `X`.
pub fn component_one() -> ModuleExports {
    ModuleExports::new(ComponentAnnotations::titled("Component One"))
        .with_story("a", StoryAnnotations::new().with_args(obj(json!({"foo": "a"}))))
        .with_story("b", StoryAnnotations::new().with_args(obj(json!({"foo": "b"}))))
}

/// Story `c`, served from `Y`.
pub fn component_two() -> ModuleExports {
    ModuleExports::new(ComponentAnnotations::titled("Component Two"))
        .with_story("c", StoryAnnotations::new().with_args(obj(json!({"foo": "c"}))))
}

pub fn entry(id: &str, title: &str, name: &str, import_path: &str) -> StoryIndexEntry {
    StoryIndexEntry {
        id: StoryId::new(id),
        title: title.to_string(),
        name: name.to_string(),
        import_path: import_path.to_string(),
    }
}

pub fn stories_list() -> StoriesList {
    StoriesList::new(vec![
        entry("component-one--a", "Component One", "A", "X"),
        entry("component-one--b", "Component One", "B", "X"),
        entry("component-two--c", "Component Two", "C", "Y"),
    ])
}

pub fn global_annotations() -> GlobalAnnotations {
    GlobalAnnotations::default()
        .with_globals(obj(json!({"a": "b"})))
        .with_render(echo_render())
}

/// Normalize `module` and prepare its `index`-th story against
/// [`global_annotations`].
pub fn prepared(module: ModuleExports, import_path: &str, title: &str, index: usize) -> Arc<Story> {
    let csf_file = process_csf_file(Arc::new(module), import_path, title);
    let csf_story = &csf_file.stories[index];
    Arc::new(prepare_story(csf_story, &csf_file, &global_annotations()).unwrap())
}
