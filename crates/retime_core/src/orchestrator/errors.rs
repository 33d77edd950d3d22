//! Error types for a remux run.
//!
//! Engine failures are translated into the processing taxonomy here;
//! callers match on [`ProcessingError::kind`].

use thiserror::Error;

use crate::engine::EngineError;
use crate::models::Slot;
use crate::speed::SpeedError;

/// Coarse classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingErrorKind {
    MissingInput,
    EngineInitError,
    StageError,
    ProbeFailed,
    TranscodeError,
    /// Another run holds the engine.
    Busy,
}

impl ProcessingErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingErrorKind::MissingInput => "MissingInput",
            ProcessingErrorKind::EngineInitError => "EngineInitError",
            ProcessingErrorKind::StageError => "StageError",
            ProcessingErrorKind::ProbeFailed => "ProbeFailed",
            ProcessingErrorKind::TranscodeError => "TranscodeError",
            ProcessingErrorKind::Busy => "Busy",
        }
    }
}

impl std::fmt::Display for ProcessingErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error that ends a remux run.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// One or both input slots are empty.
    #[error("Please select both video and audio files (missing {})", join_slots(.slots))]
    MissingInput { slots: Vec<Slot> },

    /// The engine could not be loaded.
    #[error("Failed to initialize {engine}: {source}")]
    EngineInit {
        engine: String,
        #[source]
        source: EngineError,
    },

    /// An input could not be written into engine storage.
    #[error("Failed to stage {slot} file '{name}': {source}")]
    Stage {
        slot: Slot,
        name: String,
        #[source]
        source: EngineError,
    },

    /// No usable duration for at least one input.
    #[error("Could not determine {} duration: {detail}", join_slots(.slots))]
    ProbeFailed { slots: Vec<Slot>, detail: String },

    /// The retime request failed or produced no output.
    #[error("Transcode failed: {message}")]
    Transcode {
        message: String,
        #[source]
        source: Option<EngineError>,
    },

    /// The engine session is held by another run.
    #[error("Engine '{engine}' is busy with another run")]
    Busy { engine: String },
}

fn join_slots(slots: &[Slot]) -> String {
    slots
        .iter()
        .map(Slot::as_str)
        .collect::<Vec<_>>()
        .join(" and ")
}

impl ProcessingError {
    pub fn missing_input(slots: Vec<Slot>) -> Self {
        Self::MissingInput { slots }
    }

    pub fn engine_init(engine: impl Into<String>, source: EngineError) -> Self {
        Self::EngineInit {
            engine: engine.into(),
            source,
        }
    }

    pub fn stage_failed(slot: Slot, name: impl Into<String>, source: EngineError) -> Self {
        Self::Stage {
            slot,
            name: name.into(),
            source,
        }
    }

    pub fn probe_failed(slots: Vec<Slot>, detail: impl Into<String>) -> Self {
        Self::ProbeFailed {
            slots,
            detail: detail.into(),
        }
    }

    pub fn transcode(message: impl Into<String>) -> Self {
        Self::Transcode {
            message: message.into(),
            source: None,
        }
    }

    pub fn transcode_engine(source: EngineError) -> Self {
        Self::Transcode {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn busy(engine: impl Into<String>) -> Self {
        Self::Busy {
            engine: engine.into(),
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ProcessingErrorKind {
        match self {
            Self::MissingInput { .. } => ProcessingErrorKind::MissingInput,
            Self::EngineInit { .. } => ProcessingErrorKind::EngineInitError,
            Self::Stage { .. } => ProcessingErrorKind::StageError,
            Self::ProbeFailed { .. } => ProcessingErrorKind::ProbeFailed,
            Self::Transcode { .. } => ProcessingErrorKind::TranscodeError,
            Self::Busy { .. } => ProcessingErrorKind::Busy,
        }
    }
}

impl From<SpeedError> for ProcessingError {
    fn from(err: SpeedError) -> Self {
        let slot = match &err {
            SpeedError::InvalidDuration { which, .. } if *which == "audio" => Slot::Audio,
            SpeedError::InvalidDuration { .. } => Slot::Video,
        };
        Self::probe_failed(vec![slot], err.to_string())
    }
}

/// Result type for remux runs.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_lists_slots() {
        let err = ProcessingError::missing_input(vec![Slot::Video, Slot::Audio]);
        assert_eq!(err.kind(), ProcessingErrorKind::MissingInput);
        assert!(err.to_string().contains("missing video and audio"));
    }

    #[test]
    fn stage_error_chains_source() {
        let err = ProcessingError::stage_failed(
            Slot::Audio,
            "dub.mp3",
            EngineError::other("disk full"),
        );
        let msg = err.to_string();
        assert!(msg.contains("audio"));
        assert!(msg.contains("dub.mp3"));
        assert!(msg.contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn speed_error_becomes_probe_failed() {
        let err: ProcessingError = SpeedError::InvalidDuration {
            which: "audio",
            value: 0.0,
        }
        .into();
        assert_eq!(err.kind(), ProcessingErrorKind::ProbeFailed);
        match err {
            ProcessingError::ProbeFailed { slots, .. } => assert_eq!(slots, vec![Slot::Audio]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transcode_without_source() {
        let err = ProcessingError::transcode("no output file");
        assert_eq!(err.kind(), ProcessingErrorKind::TranscodeError);
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn kinds_display_by_name() {
        assert_eq!(ProcessingErrorKind::Busy.to_string(), "Busy");
        assert_eq!(ProcessingError::busy("ffmpeg").kind(), ProcessingErrorKind::Busy);
    }
}
