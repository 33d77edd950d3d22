//! Engine storage names and guaranteed cleanup.

use crate::engine::{EngineResult, MediaEngine};
use crate::logging::RunLogger;
use crate::models::{MediaHandle, Slot};
use crate::probe::SlotNames;

/// Collision-free engine storage names for one run.
///
/// Inputs are staged as `<slot>-<sanitized name>`. When one staged input
/// name contains the other, no log line could be attributed to a single
/// input, so both fall back to `<slot>-input<.ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPlan {
    video: String,
    audio: String,
    output: String,
}

impl StagingPlan {
    pub fn new(video: &MediaHandle, audio: &MediaHandle, output_name: &str) -> Self {
        let mut video_name = staged_name(Slot::Video, video.name());
        let mut audio_name = staged_name(Slot::Audio, audio.name());

        if video_name.contains(&audio_name) || audio_name.contains(&video_name) {
            video_name = fallback_name(Slot::Video, video);
            audio_name = fallback_name(Slot::Audio, audio);
        }

        let mut output = sanitize_component(output_name);
        if output.is_empty() {
            output = "output.mp4".to_string();
        }
        if output == video_name || output == audio_name {
            output = format!("output-{}", output);
        }

        Self {
            video: video_name,
            audio: audio_name,
            output,
        }
    }

    /// Staged name of the input in `slot`.
    pub fn name(&self, slot: Slot) -> &str {
        match slot {
            Slot::Video => &self.video,
            Slot::Audio => &self.audio,
        }
    }

    /// Staged name of the transcode output.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Names handed to duration sources for attribution.
    pub fn slot_names(&self) -> SlotNames {
        SlotNames::new(self.video.clone(), self.audio.clone())
    }
}

fn staged_name(slot: Slot, original: &str) -> String {
    let clean = sanitize_component(original);
    if clean.is_empty() {
        format!("{}-input", slot.as_str())
    } else {
        format!("{}-{}", slot.as_str(), clean)
    }
}

fn fallback_name(slot: Slot, handle: &MediaHandle) -> String {
    let ext = handle
        .extension()
        .map(|e| sanitize_component(&e))
        .filter(|e| !e.is_empty());
    match ext {
        Some(ext) => format!("{}-input.{}", slot.as_str(), ext),
        None => format!("{}-input", slot.as_str()),
    }
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Leading dots are dropped so a name can never be hidden or relative.
fn sanitize_component(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

/// Names staged into an engine during one run.
///
/// Every registered name is unstaged when the area is dropped, whichever
/// step the run stopped at. Cleanup failures are logged and never change
/// the run's result.
pub struct StagingArea<'a> {
    engine: &'a mut dyn MediaEngine,
    logger: &'a RunLogger,
    staged: Vec<String>,
}

impl<'a> StagingArea<'a> {
    pub fn new(engine: &'a mut dyn MediaEngine, logger: &'a RunLogger) -> Self {
        Self {
            engine,
            logger,
            staged: Vec::new(),
        }
    }

    /// The engine, for operations that do not create files.
    pub fn engine(&mut self) -> &mut dyn MediaEngine {
        &mut *self.engine
    }

    /// Write `bytes` under `name`.
    ///
    /// The name is registered before the write, so a partial write is
    /// cleaned up as well.
    pub fn stage(&mut self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        self.track(name);
        self.engine.stage(name, bytes)
    }

    /// Register a name the engine will create (e.g. a transcode output).
    pub fn track(&mut self, name: &str) {
        if !self.staged.iter().any(|n| n == name) {
            self.staged.push(name.to_string());
        }
    }

    pub fn staged(&self) -> &[String] {
        &self.staged
    }

    /// Unstage every registered name now.
    pub fn cleanup(&mut self) {
        for name in std::mem::take(&mut self.staged) {
            match self.engine.unstage(&name) {
                Ok(()) => tracing::debug!("Unstaged {}", name),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("{} was never created, nothing to unstage", name);
                }
                Err(e) => {
                    tracing::warn!("Failed to unstage {}: {}", name, e);
                    self.logger
                        .warn(&format!("Error cleaning up {}: {}", name, e));
                }
            }
        }
    }
}

impl Drop for StagingArea<'_> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
