//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod config;
pub mod devices;
pub mod play;
pub mod render;
pub mod score;
