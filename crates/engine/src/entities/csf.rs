//! CSF file normalization.
//!
//! Turns the raw exports of one story module into a [`CsfFile`]: the shared
//! component metadata plus every exported story, each with its id and display
//! name resolved.

use std::sync::Arc;

use serde_json::Value;
use storyframe_domain::{ComponentAnnotations, ComponentId, ModuleExports, StoryAnnotations, StoryId};

use super::naming::{component_id, story_name_from_export, to_story_id};

/// One story export of a CSF file.
#[derive(Debug, Clone)]
pub struct CsfStory {
    pub id: StoryId,
    pub name: String,
    pub export_name: String,
    pub annotations: StoryAnnotations,
}

/// A normalized story module.
#[derive(Debug)]
pub struct CsfFile {
    pub import_path: String,
    pub title: String,
    pub component_id: ComponentId,
    /// Component annotations, with `fileName` added to their parameters
    pub meta: ComponentAnnotations,
    /// Stories in export order
    pub stories: Vec<CsfStory>,
    module: Arc<ModuleExports>,
}

impl CsfFile {
    pub fn story(&self, id: &StoryId) -> Option<&CsfStory> {
        self.stories.iter().find(|story| &story.id == id)
    }

    /// The module exports this file was parsed from.
    pub fn module(&self) -> &Arc<ModuleExports> {
        &self.module
    }
}

/// Normalize `module` loaded from `import_path`.
///
/// `title` comes from the stories index and wins over the module's own title.
pub fn process_csf_file(module: Arc<ModuleExports>, import_path: &str, title: &str) -> CsfFile {
    let mut meta = module.default.clone();
    meta.title = Some(title.to_string());
    meta.parameters
        .insert("fileName".to_string(), Value::String(import_path.to_string()));
    let component_id = component_id(title, meta.id.as_deref());

    let stories = module
        .stories
        .iter()
        .filter(|(export_name, _)| is_export_story(export_name, &meta))
        .map(|(export_name, annotations)| {
            let name = annotations
                .name
                .clone()
                .unwrap_or_else(|| story_name_from_export(export_name));
            CsfStory {
                id: to_story_id(component_id.as_str(), &story_name_from_export(export_name)),
                name,
                export_name: export_name.clone(),
                annotations: annotations.clone(),
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        import_path,
        title,
        stories = stories.len(),
        "Processed CSF file"
    );

    CsfFile {
        import_path: import_path.to_string(),
        title: title.to_string(),
        component_id,
        meta,
        stories,
        module,
    }
}

fn is_export_story(export_name: &str, meta: &ComponentAnnotations) -> bool {
    if export_name.starts_with("__") {
        return false;
    }
    let included = meta
        .include_stories
        .as_ref()
        .map_or(true, |names| names.iter().any(|name| name == export_name));
    let excluded = meta
        .exclude_stories
        .as_ref()
        .is_some_and(|names| names.iter().any(|name| name == export_name));
    included && !excluded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exports() -> Arc<ModuleExports> {
        Arc::new(
            ModuleExports::new(ComponentAnnotations::titled("Ignored Title"))
                .with_story("primary", StoryAnnotations::new())
                .with_story("withIcon", StoryAnnotations::new().with_name("Icon!"))
                .with_story("mockData", StoryAnnotations::new()),
        )
    }

    #[test]
    fn ids_use_index_title_and_export_names() {
        let csf = process_csf_file(exports(), "./Button.stories.json", "Forms/Button");

        let ids: Vec<_> = csf.stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["forms-button--primary", "forms-button--with-icon", "forms-button--mock-data"]
        );
        assert_eq!(csf.stories[0].name, "Primary");
        assert_eq!(csf.stories[1].name, "Icon!");
        assert_eq!(csf.title, "Forms/Button");
        assert_eq!(csf.component_id.as_str(), "forms-button");
    }

    #[test]
    fn file_name_is_added_to_component_parameters() {
        let csf = process_csf_file(exports(), "./Button.stories.json", "Button");
        assert_eq!(
            csf.meta.parameters.get("fileName"),
            Some(&json!("./Button.stories.json"))
        );
    }

    #[test]
    fn include_and_exclude_filter_exports() {
        let mut meta = ComponentAnnotations::titled("Button");
        meta.exclude_stories = Some(vec!["mockData".to_string()]);
        meta.id = Some("btn".to_string());
        let module = Arc::new(ModuleExports {
            default: meta,
            stories: exports().stories.clone(),
        });

        let csf = process_csf_file(module, "./Button.stories.json", "Button");

        let ids: Vec<_> = csf.stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["btn--primary", "btn--with-icon"]);

        let mut meta = ComponentAnnotations::titled("Button");
        meta.include_stories = Some(vec!["withIcon".to_string()]);
        let module = Arc::new(ModuleExports {
            default: meta,
            stories: exports().stories.clone(),
        });
        let csf = process_csf_file(module, "./Button.stories.json", "Button");
        assert_eq!(csf.stories.len(), 1);
        assert!(csf.story(&StoryId::new("button--with-icon")).is_some());
    }
}
