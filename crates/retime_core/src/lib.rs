//! Retime Core - retime a video track to the length of a separate audio
//! track and remux both into one MP4.
//!
//! This crate contains all processing logic with zero UI dependencies.
//! It drives an external multimedia engine (ffmpeg) and can be used by
//! the `retime` CLI or any other front end.

pub mod config;
pub mod engine;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod probe;
pub mod speed;
pub mod workbench;

pub use workbench::{ReleaseHook, Workbench};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
