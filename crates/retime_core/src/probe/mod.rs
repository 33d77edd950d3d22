//! Duration discovery.
//!
//! Two layers:
//! - **duration**: the line-level extractor that recognises
//!   `Duration: HH:MM:SS.CC` in engine diagnostics and attributes it to an
//!   input by file name
//! - **source**: the [`DurationSource`] strategy the orchestrator calls,
//!   with a log-scraping implementation and a structured-query one
//!
//! # Attribution
//!
//! A matched duration belongs to whichever known staging name appears in
//! the same line. Lines that mention neither name, or both, are ignored:
//!
//! ```text
//! "  Duration: 00:00:20.00 ... (video-clip.mp4)"        -> (Video, 20.0)
//! "  Duration: 00:00:20.00"                             -> ignored
//! "  Duration: 00:00:20.00 video-clip.mp4 audio-dub.mp3" -> ignored
//! ```

mod duration;
mod source;

pub use duration::{parse_duration, DurationExtractor, SlotNames};
pub use source::{
    source_for, DurationSource, LogScrapeSource, ProbeOutcome, StructuredDurationSource,
};
