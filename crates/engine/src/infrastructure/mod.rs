//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod channel;
pub mod config;
pub mod fs_modules;
pub mod headless;
pub mod ports;
