//! Data models for retime.
//!
//! This module contains the core data structures shared by the probe,
//! speed, orchestrator, and workbench layers:
//! - Enums for input slots, retiming direction, and duration sources
//! - Media structures (input handles, probe results)
//! - Run outputs (reports, artifacts)

mod artifact;
mod enums;
mod media;

pub use artifact::{ArtifactId, OutputArtifact, RemuxReport, OUTPUT_MEDIA_TYPE};
pub use enums::{DurationSourceKind, Slot, SpeedDirection};
pub use media::{MediaHandle, ProbeResult};
