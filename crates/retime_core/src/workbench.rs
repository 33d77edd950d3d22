//! Caller-facing surface: two input slots, a run trigger, and the live
//! output artifact.
//!
//! A presentation layer owns one [`Workbench`]. It fills the slots with
//! [`select_input`](Workbench::select_input), calls [`run`](Workbench::run)
//! and shows the returned artifact until the next run or a
//! [`reset`](Workbench::reset).

use crate::config::Settings;
use crate::engine::EngineSession;
use crate::logging::RunLogger;
use crate::models::{ArtifactId, MediaHandle, OutputArtifact, Slot, OUTPUT_MEDIA_TYPE};
use crate::orchestrator::{
    ProcessingError, ProcessingResult, ProgressCallback, RemuxOrchestrator, RunContext,
};

/// Called once for every artifact that stops being live.
///
/// This is where a presentation layer revokes the reference it handed out
/// (a player source, a download link, a temp file).
pub type ReleaseHook = Box<dyn Fn(&OutputArtifact) + Send + Sync>;

pub struct Workbench {
    session: EngineSession,
    orchestrator: RemuxOrchestrator,
    video: Option<MediaHandle>,
    audio: Option<MediaHandle>,
    artifact: Option<OutputArtifact>,
    next_artifact: u64,
    release_hook: Option<ReleaseHook>,
    progress_callback: Option<ProgressCallback>,
}

impl Workbench {
    /// Create a workbench driving `session` with the given settings.
    pub fn new(session: EngineSession, settings: &Settings) -> Self {
        Self::with_orchestrator(session, RemuxOrchestrator::new(settings))
    }

    pub fn with_orchestrator(session: EngineSession, orchestrator: RemuxOrchestrator) -> Self {
        Self {
            session,
            orchestrator,
            video: None,
            audio: None,
            artifact: None,
            next_artifact: 1,
            release_hook: None,
            progress_callback: None,
        }
    }

    pub fn with_release_hook(mut self, hook: ReleaseHook) -> Self {
        self.release_hook = Some(hook);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Put `handle` into `slot`, returning the handle it replaces.
    ///
    /// Does not start processing.
    pub fn select_input(&mut self, slot: Slot, handle: MediaHandle) -> Option<MediaHandle> {
        tracing::info!("{} file selected: {}", capitalize(slot), handle.name());
        self.slot_mut(slot).replace(handle)
    }

    /// Empty `slot`, returning its handle.
    pub fn clear_input(&mut self, slot: Slot) -> Option<MediaHandle> {
        let previous = self.slot_mut(slot).take();
        if previous.is_some() {
            tracing::info!("{} file selected: None", capitalize(slot));
        }
        previous
    }

    pub fn input(&self, slot: Slot) -> Option<&MediaHandle> {
        match slot {
            Slot::Video => self.video.as_ref(),
            Slot::Audio => self.audio.as_ref(),
        }
    }

    /// Both slots are filled.
    pub fn is_ready(&self) -> bool {
        self.video.is_some() && self.audio.is_some()
    }

    /// The engine session is held by a run (this or another workbench's).
    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }

    pub fn orchestrator(&self) -> &RemuxOrchestrator {
        &self.orchestrator
    }

    /// The artifact of the last successful run, until replaced or reset.
    pub fn live_artifact(&self) -> Option<&OutputArtifact> {
        self.artifact.as_ref()
    }

    /// Process the selected inputs.
    ///
    /// Fails with `MissingInput`, without any engine call, unless both
    /// slots are filled. On success the previous artifact is released
    /// before the new one becomes live; on failure it stays live.
    pub fn run(&mut self, logger: &RunLogger) -> ProcessingResult<&OutputArtifact> {
        let (video, audio) = match (&self.video, &self.audio) {
            (Some(video), Some(audio)) => (video, audio),
            _ => {
                let missing: Vec<Slot> = Slot::ALL
                    .into_iter()
                    .filter(|slot| self.input(*slot).is_none())
                    .collect();
                let err = ProcessingError::missing_input(missing);
                logger.error(&err.to_string());
                return Err(err);
            }
        };

        let mut ctx = RunContext::new(logger);
        if let Some(ref callback) = self.progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }
        let output = self.orchestrator.run(&self.session, video, audio, &ctx)?;

        self.release_artifact();

        let id = ArtifactId(self.next_artifact);
        self.next_artifact += 1;
        let artifact = OutputArtifact {
            id,
            file_name: self.orchestrator.output_name().to_string(),
            media_type: OUTPUT_MEDIA_TYPE,
            bytes: output.bytes,
            report: output.report,
        };
        tracing::debug!("{} is live ({} bytes)", id, artifact.len());

        let live = self.artifact.insert(artifact);
        Ok(&*live)
    }

    /// Clear both slots and release the live artifact.
    pub fn reset(&mut self) {
        self.video = None;
        self.audio = None;
        self.release_artifact();
        tracing::info!("Application reset. Ready for new files.");
    }

    fn release_artifact(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            tracing::debug!("Releasing {}", artifact.id);
            if let Some(ref hook) = self.release_hook {
                hook(&artifact);
            }
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<MediaHandle> {
        match slot {
            Slot::Video => &mut self.video,
            Slot::Audio => &mut self.audio,
        }
    }
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("session", &self.session)
            .field("video", &self.video)
            .field("audio", &self.audio)
            .field("artifact", &self.artifact.as_ref().map(|a| a.id))
            .finish()
    }
}

fn capitalize(slot: Slot) -> &'static str {
    match slot {
        Slot::Video => "Video",
        Slot::Audio => "Audio",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{EngineCall, FailPoint, FakeEngine};
    use crate::logging::LogConfig;
    use crate::models::DurationSourceKind;
    use crate::orchestrator::ProcessingErrorKind;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn scrape_settings() -> Settings {
        let mut settings = Settings::default();
        settings.sync.duration_source = DurationSourceKind::LogScrape;
        settings
    }

    fn clip() -> MediaHandle {
        MediaHandle::new("clip.mp4", b"video".to_vec())
    }

    fn dub() -> MediaHandle {
        MediaHandle::new("dub.mp3", b"audio".to_vec())
    }

    fn logger() -> RunLogger {
        RunLogger::detached(LogConfig::default())
    }

    fn healthy() -> FakeEngine {
        FakeEngine::new().with_stamps(Some("00:00:20.00"), Some("00:00:10.00"))
    }

    /// Workbench whose release hook records artifact ids.
    fn recording(engine: FakeEngine) -> (Workbench, Arc<Mutex<Vec<ArtifactId>>>) {
        let released = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&released);
        let bench = Workbench::new(EngineSession::new(engine), &scrape_settings())
            .with_release_hook(Box::new(move |artifact| sink.lock().push(artifact.id)));
        (bench, released)
    }

    #[test]
    fn run_with_one_slot_is_missing_input_without_engine_calls() {
        let engine = healthy();
        let calls = engine.calls();
        let mut bench = Workbench::new(EngineSession::new(engine), &scrape_settings());
        bench.select_input(Slot::Video, clip());
        assert!(!bench.is_ready());

        let err = bench.run(&logger()).unwrap_err();

        assert_eq!(err.kind(), ProcessingErrorKind::MissingInput);
        match err {
            ProcessingError::MissingInput { slots } => assert_eq!(slots, vec![Slot::Audio]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn successful_run_produces_mp4_artifact() {
        let (mut bench, released) = recording(healthy().with_output(b"mp4-bytes"));
        bench.select_input(Slot::Video, clip());
        bench.select_input(Slot::Audio, dub());
        assert!(bench.is_ready());

        let artifact = bench.run(&logger()).unwrap();

        assert_eq!(artifact.id, ArtifactId(1));
        assert_eq!(artifact.media_type, "video/mp4");
        assert_eq!(artifact.file_name, "synced_output.mp4");
        assert_eq!(artifact.bytes, b"mp4-bytes");
        assert_eq!(artifact.report.speed_factor, 2.0);
        assert!(released.lock().is_empty());
        assert_eq!(bench.live_artifact().map(|a| a.id), Some(ArtifactId(1)));
    }

    #[test]
    fn reset_releases_artifact_exactly_once() {
        let (mut bench, released) = recording(healthy());
        bench.select_input(Slot::Video, clip());
        bench.select_input(Slot::Audio, dub());
        bench.run(&logger()).unwrap();

        bench.reset();
        bench.reset();

        assert_eq!(*released.lock(), vec![ArtifactId(1)]);
        assert!(bench.live_artifact().is_none());
        assert!(bench.input(Slot::Video).is_none());
        assert!(bench.input(Slot::Audio).is_none());
    }

    #[test]
    fn new_artifact_releases_previous_one() {
        let (mut bench, released) = recording(healthy());
        bench.select_input(Slot::Video, clip());
        bench.select_input(Slot::Audio, dub());

        bench.run(&logger()).unwrap();
        let second = bench.run(&logger()).unwrap().id;

        assert_eq!(second, ArtifactId(2));
        assert_eq!(*released.lock(), vec![ArtifactId(1)]);
    }

    #[test]
    fn failed_run_keeps_previous_artifact() {
        let (mut bench, released) = recording(healthy());
        bench.select_input(Slot::Video, clip());
        bench.select_input(Slot::Audio, dub());
        bench.run(&logger()).unwrap();

        let held = bench.session().clone();
        let guard = held.try_acquire().unwrap();
        assert!(bench.is_busy());
        let err = bench.run(&logger()).unwrap_err();
        drop(guard);

        assert_eq!(err.kind(), ProcessingErrorKind::Busy);
        assert!(released.lock().is_empty());
        assert_eq!(bench.live_artifact().map(|a| a.id), Some(ArtifactId(1)));
    }

    #[test]
    fn engine_failure_surfaces_kind_and_keeps_slots() {
        let (mut bench, _released) = recording(healthy().failing_on(FailPoint::Transcode));
        bench.select_input(Slot::Video, clip());
        bench.select_input(Slot::Audio, dub());

        let err = bench.run(&logger()).unwrap_err();

        assert_eq!(err.kind(), ProcessingErrorKind::TranscodeError);
        assert!(bench.is_ready());
        assert!(bench.live_artifact().is_none());
    }

    #[test]
    fn select_replaces_and_clear_empties() {
        let mut bench = Workbench::new(EngineSession::new(FakeEngine::new()), &scrape_settings());

        assert!(bench.select_input(Slot::Video, clip()).is_none());
        let previous = bench.select_input(Slot::Video, MediaHandle::new("b.mp4", b"b".to_vec()));
        assert_eq!(previous.map(|h| h.name().to_string()), Some("clip.mp4".to_string()));

        assert!(bench.clear_input(Slot::Video).is_some());
        assert!(bench.input(Slot::Video).is_none());
    }

    #[test]
    fn select_does_not_touch_engine() {
        let engine = FakeEngine::new();
        let calls = engine.calls();
        let mut bench = Workbench::new(EngineSession::new(engine), &scrape_settings());

        bench.select_input(Slot::Video, clip());
        bench.select_input(Slot::Audio, dub());

        assert!(calls.lock().is_empty());
    }

    #[test]
    fn progress_reaches_completion() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut bench = Workbench::new(EngineSession::new(healthy()), &scrape_settings())
            .with_progress_callback(Box::new(move |stage, percent, _| {
                sink.lock().push((stage.to_string(), percent));
            }));
        bench.select_input(Slot::Video, clip());
        bench.select_input(Slot::Audio, dub());

        bench.run(&logger()).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.first().map(|(s, _)| s.as_str()), Some("Initialize"));
        assert_eq!(seen.last(), Some(&("Complete".to_string(), 100)));
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn cleanup_runs_after_every_run() {
        let engine = healthy();
        let calls = engine.calls();
        let mut bench = Workbench::new(EngineSession::new(engine), &scrape_settings());
        bench.select_input(Slot::Video, clip());
        bench.select_input(Slot::Audio, dub());

        bench.run(&logger()).unwrap();

        let unstaged = calls
            .lock()
            .iter()
            .filter(|c| matches!(c, EngineCall::Unstage(_)))
            .count();
        assert_eq!(unstaged, 3);
    }
}
