//! Remux orchestrator: one retime run from staged inputs to output bytes.
//!
//! # Stages
//!
//! ```text
//! Run
//!     ├── Initialize   load the engine (once per session)
//!     ├── Stage        write both inputs into engine storage
//!     ├── Probe        learn each input's duration
//!     ├── Compute      speed factor = video / audio
//!     ├── Transcode    retime video, map audio, encode
//!     ├── Read output  pull the produced file out of storage
//!     └── Cleanup      unstage everything (always runs)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use retime_core::orchestrator::{RemuxOrchestrator, RunContext};
//!
//! let orchestrator = RemuxOrchestrator::new(&settings);
//! let ctx = RunContext::new(&logger);
//! let output = orchestrator.run(&session, &video, &audio, &ctx)?;
//! println!("Speed factor: {:.4}", output.report.speed_factor);
//! ```

mod errors;
mod remux;
mod staging;
mod types;

pub use errors::{ProcessingError, ProcessingErrorKind, ProcessingResult};
pub use remux::RemuxOrchestrator;
pub use staging::{StagingArea, StagingPlan};
pub use types::{ProgressCallback, RemuxOutput, RemuxStage, RunContext};
