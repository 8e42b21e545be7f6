//! Use cases - preview orchestration.
//!
//! Use cases orchestrate across entity modules and stores to turn channel
//! events into rendered stories.

pub mod preview;

pub use preview::{Preview, PreviewError, PreviewOptions, PreviewPorts};
