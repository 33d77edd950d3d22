//! Run outputs: the remux report and the produced artifact.

use serde::{Deserialize, Serialize};

use super::enums::SpeedDirection;
use super::media::ProbeResult;

/// Media type of every artifact produced by a run.
pub const OUTPUT_MEDIA_TYPE: &str = "video/mp4";

/// Identifier of a produced artifact, unique within one workbench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(pub u64);

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "artifact-{}", self.0)
    }
}

/// What a successful run measured and asked the engine to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemuxReport {
    /// Probe result for the video input.
    pub video: ProbeResult,
    /// Probe result for the audio input.
    pub audio: ProbeResult,
    /// `video / audio` duration ratio.
    pub speed_factor: f64,
    /// Classification of the speed factor.
    pub direction: SpeedDirection,
    /// Engine arguments of the transcode request.
    pub engine_args: Vec<String>,
}

impl RemuxReport {
    /// Pretty JSON rendering, as written next to the output by the CLI.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Playable output of a successful run.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    /// Unique identifier (used when releasing).
    pub id: ArtifactId,
    /// Suggested file name for download.
    pub file_name: String,
    /// Declared media type, always [`OUTPUT_MEDIA_TYPE`].
    pub media_type: &'static str,
    /// Encoded output bytes.
    pub bytes: Vec<u8>,
    /// Details of the run that produced it.
    pub report: RemuxReport,
}

impl OutputArtifact {
    /// Size of the encoded output.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
