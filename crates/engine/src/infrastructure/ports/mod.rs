//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Module loading (bundler imports, JSON files, test doubles)
//! - The stories index source
//! - Rendering stories and docs pages (one renderer per UI framework)
//! - The host view (mount points, error display)
//! - The manager channel

mod channel;
mod error;
mod external;
mod types;

pub use channel::{Channel, Listener, ListenerId, Subscription};
pub use error::{LoadError, RenderError};
pub use external::{
    DocsRenderer, ModuleLoader, PreviewView, Renderer, StoriesIndexSource,
};
pub use types::RenderSurface;

#[cfg(test)]
pub use external::{MockModuleLoader, MockStoriesIndexSource};
