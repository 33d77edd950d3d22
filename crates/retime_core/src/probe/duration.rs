//! `Duration:` line extraction and attribution.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Slot;

/// `Duration: HH:MM:SS.CC`, two digits per field.
static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Duration: ([0-9]{2}):([0-9]{2}):([0-9]{2})\.([0-9]{2})")
        .expect("duration pattern is a valid regex")
});

/// Parse the first `Duration: HH:MM:SS.CC` in `line` into seconds.
///
/// Returns `None` for lines without the pattern.
pub fn parse_duration(line: &str) -> Option<f64> {
    let caps = DURATION_PATTERN.captures(line)?;
    let field = |i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };

    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    let centis = field(4)?;

    Some(
        f64::from(hours) * 3600.0
            + f64::from(minutes) * 60.0
            + f64::from(seconds)
            + f64::from(centis) / 100.0,
    )
}

/// The staging names of both inputs, used to attribute log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotNames {
    video: String,
    audio: String,
}

impl SlotNames {
    pub fn new(video: impl Into<String>, audio: impl Into<String>) -> Self {
        Self {
            video: video.into(),
            audio: audio.into(),
        }
    }

    /// Name staged for `slot`.
    pub fn name(&self, slot: Slot) -> &str {
        match slot {
            Slot::Video => &self.video,
            Slot::Audio => &self.audio,
        }
    }

    /// Slot whose name, and only whose name, occurs in `line`.
    pub fn attribute(&self, line: &str) -> Option<Slot> {
        let has_video = line.contains(self.video.as_str());
        let has_audio = line.contains(self.audio.as_str());
        match (has_video, has_audio) {
            (true, false) => Some(Slot::Video),
            (false, true) => Some(Slot::Audio),
            _ => None,
        }
    }
}

/// Recognises duration lines and attributes them to an input slot.
#[derive(Debug, Clone)]
pub struct DurationExtractor {
    names: SlotNames,
}

impl DurationExtractor {
    pub fn new(names: SlotNames) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &SlotNames {
        &self.names
    }

    /// Extract `(slot, seconds)` from one diagnostic line.
    ///
    /// Lines without a duration, and duration lines with no certain
    /// attribution, yield `None`.
    pub fn extract(&self, line: &str) -> Option<(Slot, f64)> {
        let seconds = parse_duration(line)?;
        match self.names.attribute(line) {
            Some(slot) => Some((slot, seconds)),
            None => {
                tracing::debug!("Ignoring unattributed duration line: {}", line.trim());
                None
            }
        }
    }
}
