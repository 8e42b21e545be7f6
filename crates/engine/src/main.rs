//! storyframe Engine - headless preview runner.
//!
//! Renders the configured selection from JSON story files and prints what
//! was rendered.

use storyframe_engine::infrastructure::config::PreviewConfig;
use storyframe_engine::infrastructure::ports::RenderSurface;
use storyframe_engine::App;
use storyframe_shared::PreviewEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the runner may start from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyframe_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting storyframe preview");

    let config = PreviewConfig::from_env()?;
    let render_timeout = config.render_timeout;
    let app = App::new(config)?;
    let mut events = app.channel.subscribe();

    // Failures are also reported on the channel, handled below
    if let Err(e) = app.start().await {
        tracing::warn!(error = %e, "Preview did not start cleanly");
    }

    let outcome = tokio::time::timeout(render_timeout, first_outcome(&mut events))
        .await
        .map_err(|_| anyhow::anyhow!("nothing rendered within {render_timeout:?}"))?
        .ok_or_else(|| anyhow::anyhow!("preview channel closed"))?;

    match outcome {
        PreviewEvent::StoryRendered(id) => {
            let element = app.renderer.output(&RenderSurface::StoryRoot);
            tracing::info!(story_id = %id, "Story rendered");
            println!("{}", serde_json::to_string_pretty(&element)?);
            Ok(())
        }
        PreviewEvent::DocsRendered(id) => {
            tracing::info!(story_id = %id, "Docs rendered");
            Ok(())
        }
        PreviewEvent::StoryMissing(specifier) => {
            anyhow::bail!("story not found: {}", specifier.unwrap_or_else(|| "<none>".into()))
        }
        PreviewEvent::StoryThrewException(error) | PreviewEvent::ConfigError(error) => {
            anyhow::bail!("{}", error.message)
        }
        other => anyhow::bail!("unexpected event {}", other.kind()),
    }
}

/// Wait for the first event that settles the initial render.
async fn first_outcome(events: &mut broadcast::Receiver<PreviewEvent>) -> Option<PreviewEvent> {
    loop {
        match events.recv().await {
            Ok(
                event @ (PreviewEvent::StoryRendered(_)
                | PreviewEvent::DocsRendered(_)
                | PreviewEvent::StoryMissing(_)
                | PreviewEvent::StoryThrewException(_)
                | PreviewEvent::ConfigError(_)),
            ) => return Some(event),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event observer lagged");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
