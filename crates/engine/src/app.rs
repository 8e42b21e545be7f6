//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    channel::InMemoryChannel,
    config::PreviewConfig,
    fs_modules::{FileIndexSource, JsonModuleLoader},
    headless::{HeadlessView, OutlineDocsRenderer, TextRenderer},
};
use crate::stores::SelectionStore;
use crate::use_cases::{Preview, PreviewError, PreviewPorts};

/// A preview wired to JSON story files and the headless adapters.
pub struct App {
    pub config: PreviewConfig,
    pub channel: Arc<InMemoryChannel>,
    pub view: Arc<HeadlessView>,
    pub renderer: Arc<TextRenderer>,
    pub preview: Arc<Preview>,
    modules: Arc<JsonModuleLoader>,
}

impl App {
    pub fn new(config: PreviewConfig) -> Result<Self, PreviewError> {
        let selection_store = SelectionStore::from_query(&config.selection)?;
        let channel = Arc::new(InMemoryChannel::new());
        let view = Arc::new(HeadlessView::new());
        let renderer = Arc::new(TextRenderer::new());
        let modules = Arc::new(JsonModuleLoader::new(&config.stories_dir));

        let ports = PreviewPorts {
            channel: channel.clone(),
            view: view.clone(),
            renderer: renderer.clone(),
            docs_renderer: Arc::new(OutlineDocsRenderer),
            module_loader: modules.clone(),
            index_source: Arc::new(FileIndexSource::new(&config.index_path)),
        };
        let preview = Preview::new(ports, selection_store, config.preview_options());

        Ok(Self {
            config,
            channel,
            view,
            renderer,
            preview,
            modules,
        })
    }

    /// Read the preview file and render the configured selection.
    pub async fn start(&self) -> Result<(), PreviewError> {
        tracing::info!(
            stories_dir = %self.config.stories_dir.display(),
            index = %self.config.index_path.display(),
            selection = %self.config.selection,
            "Starting preview"
        );
        let global_annotations = self.modules.global_annotations().await;
        self.preview.initialize(global_annotations).await
    }

    /// Story files changed on disk.
    pub async fn reload_stories(&self) -> Result<(), PreviewError> {
        let modules = Arc::new(JsonModuleLoader::new(&self.config.stories_dir));
        self.preview.on_import_fn_changed(modules).await
    }

    /// The preview file changed on disk.
    pub async fn reload_preview(&self) -> Result<(), PreviewError> {
        let global_annotations = self.modules.global_annotations().await;
        self.preview
            .on_global_annotations_changed(global_annotations)
            .await
    }
}
