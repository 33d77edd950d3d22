//! External multimedia engine contract.
//!
//! The remux orchestrator never encodes, demuxes, or muxes anything
//! itself. It drives an engine through the [`MediaEngine`] trait:
//!
//! ```text
//! initialize ─► stage(video) ─► stage(audio) ─► probe(video) ─► probe(audio)
//!            ─► transcode(args) ─► read_output ─► unstage(*)
//! ```
//!
//! Engines are single-caller resources. They are shared through an
//! [`EngineSession`], which serializes access and rejects a second run
//! while one is in flight.
//!
//! [`FfmpegEngine`] is the subprocess-backed implementation.

mod errors;
mod ffmpeg;
mod session;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use errors::{EngineError, EngineResult};
pub use ffmpeg::FfmpegEngine;
pub use session::{EngineGuard, EngineSession};
pub use types::{DiagnosticKind, DiagnosticLine, TranscodeArgs};

/// Operations the orchestrator needs from a multimedia engine.
///
/// Working storage is a flat namespace keyed by file name. Callers are
/// responsible for choosing collision-free names.
pub trait MediaEngine: Send {
    /// Engine name (for logging and error context).
    fn name(&self) -> &str;

    /// Whether [`initialize`](Self::initialize) has already succeeded.
    fn is_initialized(&self) -> bool;

    /// Prepare the engine for use.
    ///
    /// Must be idempotent: calling it on an initialized engine succeeds
    /// without doing anything.
    fn initialize(&mut self) -> EngineResult<()>;

    /// Write `bytes` into working storage under `name`.
    fn stage(&mut self, name: &str, bytes: &[u8]) -> EngineResult<()>;

    /// Run the engine in info mode against a staged file.
    ///
    /// Returns the free-form diagnostic output; it does not carry a
    /// structured duration.
    fn probe(&mut self, name: &str) -> EngineResult<Vec<DiagnosticLine>>;

    /// Structured duration query for a staged file.
    ///
    /// `Ok(None)` means the engine ran but reported no duration. Engines
    /// without a structured probe API keep the default.
    fn query_duration(&mut self, name: &str) -> EngineResult<Option<f64>> {
        let _ = name;
        Err(EngineError::Unsupported("structured duration query"))
    }

    /// Run one combined retime + remux request.
    ///
    /// Returns the diagnostic output of the run.
    fn transcode(&mut self, args: &TranscodeArgs) -> EngineResult<Vec<DiagnosticLine>>;

    /// Read a produced file out of working storage.
    fn read_output(&mut self, name: &str) -> EngineResult<Vec<u8>>;

    /// Remove a file from working storage.
    fn unstage(&mut self, name: &str) -> EngineResult<()>;
}
