//! Core enums used throughout the library.

use serde::{Deserialize, Serialize};

/// Logical input slot a media handle occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Video,
    Audio,
}

impl Slot {
    /// Both slots in probe order.
    pub const ALL: [Slot; 2] = [Slot::Video, Slot::Audio];

    /// Lowercase label, also used as the staging name prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Video => "video",
            Slot::Audio => "audio",
        }
    }

    /// The other slot.
    pub fn other(&self) -> Slot {
        match self {
            Slot::Video => Slot::Audio,
            Slot::Audio => Slot::Video,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the video has to be retimed to match the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedDirection {
    /// Video is longer than the audio and is played back faster.
    SpeedUp,
    /// Video is shorter than the audio and is stretched.
    SlowDown,
    /// Durations already match within tolerance.
    Unchanged,
}

impl SpeedDirection {
    /// Short label ("speed up", "slow down", "unchanged").
    pub fn label(&self) -> &'static str {
        match self {
            SpeedDirection::SpeedUp => "speed up",
            SpeedDirection::SlowDown => "slow down",
            SpeedDirection::Unchanged => "unchanged",
        }
    }

    /// Sentence shown to the user after the factor is computed.
    pub fn summary(&self) -> &'static str {
        match self {
            SpeedDirection::SpeedUp => "Video will be sped up to match audio duration.",
            SpeedDirection::SlowDown => "Video will be slowed down to match audio duration.",
            SpeedDirection::Unchanged => {
                "Video and audio durations already match closely (no speed change needed)."
            }
        }
    }
}

impl std::fmt::Display for SpeedDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Strategy used to discover input durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSourceKind {
    /// Scrape `Duration:` lines out of the engine's diagnostic output.
    LogScrape,
    /// Ask the engine for a structured duration value.
    Structured,
}

impl std::fmt::Display for DurationSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationSourceKind::LogScrape => write!(f, "log_scrape"),
            DurationSourceKind::Structured => write!(f, "structured"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_other_flips() {
        assert_eq!(Slot::Video.other(), Slot::Audio);
        assert_eq!(Slot::Audio.other(), Slot::Video);
    }

    #[test]
    fn direction_serializes_snake_case() {
        let json = serde_json::to_string(&SpeedDirection::SpeedUp).unwrap();
        assert_eq!(json, "\"speed_up\"");
    }

    #[test]
    fn duration_source_parses_from_toml_value() {
        #[derive(Deserialize)]
        struct Wrapper {
            source: DurationSourceKind,
        }
        let parsed: Wrapper = toml::from_str("source = \"structured\"").unwrap();
        assert_eq!(parsed.source, DurationSourceKind::Structured);
    }
}
