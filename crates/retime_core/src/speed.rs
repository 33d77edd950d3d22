//! Speed factor computation.
//!
//! The video is retimed with `setpts=PTS/factor`, so the retimed video lasts
//! `video / factor` seconds. Matching the audio means
//! `factor = video_duration / audio_duration`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::SpeedDirection;

/// Default tolerance around 1.0 inside which no retiming is reported.
pub const DEFAULT_UNCHANGED_TOLERANCE: f64 = 1e-6;

/// Errors from speed factor computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeedError {
    /// A duration was zero, negative, or not a number.
    #[error("Invalid {which} duration: {value}")]
    InvalidDuration { which: &'static str, value: f64 },
}

/// Playback-rate multiplier applied to the video track.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SpeedFactor(f64);

impl SpeedFactor {
    /// Compute `video_duration / audio_duration`.
    pub fn compute(video_duration: f64, audio_duration: f64) -> Result<Self, SpeedError> {
        check_duration("video", video_duration)?;
        check_duration("audio", audio_duration)?;
        Ok(Self(video_duration / audio_duration))
    }

    /// Raw ratio.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Multiplier applied to presentation timestamps (`1 / factor`).
    pub fn pts_scale(&self) -> f64 {
        1.0 / self.0
    }

    /// Classify the factor against `1 ± tolerance`.
    ///
    /// A tolerance of `0.0` gives exact comparison against 1.
    pub fn direction(&self, tolerance: f64) -> SpeedDirection {
        let tolerance = tolerance.abs();
        if self.0 > 1.0 + tolerance {
            SpeedDirection::SpeedUp
        } else if self.0 < 1.0 - tolerance {
            SpeedDirection::SlowDown
        } else {
            SpeedDirection::Unchanged
        }
    }

    /// Video filter graph that rescales the first input's video stream.
    ///
    /// The output pad is labelled `[v]` for stream mapping.
    pub fn setpts_filter(&self) -> String {
        format!("[0:v]setpts=PTS/{}[v]", self.0)
    }
}

impl std::fmt::Display for SpeedFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

fn check_duration(which: &'static str, value: f64) -> Result<(), SpeedError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SpeedError::InvalidDuration { which, value })
    }
}
