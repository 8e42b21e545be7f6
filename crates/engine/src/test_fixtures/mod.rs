//! Test fixtures and common test helpers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::stories::{component_one, obj};
//! use crate::test_fixtures::recording::RecordingRenderer;
//! ```

pub mod recording;
pub mod stories;
