//! Run logging for retime.
//!
//! Two layers:
//! - `tracing` for library diagnostics, set up once per process with
//!   [`init_tracing`]
//! - [`RunLogger`], the per-run log a user reads: phase markers, engine
//!   commands, results, and (outside compact mode) raw engine output.
//!   Output goes to an optional file and an optional callback; a tail of
//!   engine lines is kept and dumped when a run fails.
//!
//! # Example
//!
//! ```no_run
//! use retime_core::logging::{RunLogger, LogConfig};
//!
//! let logger = RunLogger::builder("retime_clip")
//!     .log_dir(".logs")
//!     .config(LogConfig::default())
//!     .callback(Box::new(|line| println!("{}", line)))
//!     .build()
//!     .unwrap();
//!
//! logger.phase("Probe");
//! logger.command("ffmpeg -hide_banner -i video-clip.mp4");
//! logger.success("Video ready for playback and download.");
//! ```

mod run_logger;
mod types;

pub use run_logger::{RunLogger, RunLoggerBuilder};
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global `tracing` subscriber (stderr).
///
/// `RUST_LOG` wins over `default_level`. Call once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

/// Tracing for tests (warnings and above, captured per test).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
