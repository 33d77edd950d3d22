//! Scripted in-memory engine for tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DiagnosticLine, EngineError, EngineResult, MediaEngine, TranscodeArgs};

/// A recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineCall {
    Initialize,
    Stage(String),
    Probe(String),
    QueryDuration(String),
    Transcode(TranscodeArgs),
    ReadOutput(String),
    Unstage(String),
}

/// Operation that the fake engine should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailPoint {
    Initialize,
    Stage,
    Transcode,
    /// Transcode succeeds but writes no output file.
    NoOutput,
    ReadOutput,
    Unstage,
}

type ProbeScript = Box<dyn Fn(&str) -> Vec<DiagnosticLine> + Send>;

/// ffmpeg-like probe output for `name` that reports `stamp`.
///
/// The duration line carries the file name so that the log scraper can
/// attribute it.
pub(crate) fn duration_lines(name: &str, stamp: &str) -> Vec<DiagnosticLine> {
    vec![
        DiagnosticLine::stderr("ffmpeg version 4.3.1 Copyright (c) 2000-2020 the FFmpeg developers"),
        DiagnosticLine::stderr(format!("Input #0, mov,mp4,m4a,3gp,3g2,mj2, from '{}':", name)),
        DiagnosticLine::stderr(format!(
            "  Duration: {}, start: 0.000000, bitrate: 1205 kb/s ({})",
            stamp, name
        )),
        DiagnosticLine::stderr("    Stream #0:0(und): Video: h264 (High), yuv420p, 1280x720"),
        DiagnosticLine::stderr("At least one output file must be specified"),
    ]
}

pub(crate) struct FakeEngine {
    initialized: bool,
    storage: HashMap<String, Vec<u8>>,
    probe_script: ProbeScript,
    query_durations: Vec<(String, Option<f64>)>,
    output_bytes: Vec<u8>,
    fail_on: Option<FailPoint>,
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self {
            initialized: false,
            storage: HashMap::new(),
            probe_script: Box::new(|_| Vec::new()),
            query_durations: Vec::new(),
            output_bytes: b"ftypisom-fake-output".to_vec(),
            fail_on: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Probe output produced for each staged name.
    pub(crate) fn with_probe_script<F>(mut self, script: F) -> Self
    where
        F: Fn(&str) -> Vec<DiagnosticLine> + Send + 'static,
    {
        self.probe_script = Box::new(script);
        self
    }

    /// Report `video` for names starting with `video-` and `audio` for
    /// names starting with `audio-`. `None` produces no duration line.
    pub(crate) fn with_stamps(self, video: Option<&str>, audio: Option<&str>) -> Self {
        let video = video.map(str::to_string);
        let audio = audio.map(str::to_string);
        self.with_probe_script(move |name| {
            let stamp = if name.starts_with("video-") {
                video.as_deref()
            } else if name.starts_with("audio-") {
                audio.as_deref()
            } else {
                None
            };
            match stamp {
                Some(stamp) => duration_lines(name, stamp),
                None => vec![
                    DiagnosticLine::stderr(format!("{}: Invalid data found when processing input", name)),
                ],
            }
        })
    }

    /// Structured durations for names starting with `prefix`.
    pub(crate) fn with_query_duration(mut self, prefix: &str, duration: Option<f64>) -> Self {
        self.query_durations.push((prefix.to_string(), duration));
        self
    }

    pub(crate) fn with_output(mut self, bytes: &[u8]) -> Self {
        self.output_bytes = bytes.to_vec();
        self
    }

    pub(crate) fn failing_on(mut self, point: FailPoint) -> Self {
        self.fail_on = Some(point);
        self
    }

    /// Shared view of the call log.
    pub(crate) fn calls(&self) -> Arc<Mutex<Vec<EngineCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }

    fn fails(&self, point: FailPoint) -> bool {
        self.fail_on == Some(point)
    }

    fn require_init(&self) -> EngineResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(EngineError::NotInitialized("fake".to_string()))
        }
    }
}

impl MediaEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self) -> EngineResult<()> {
        self.record(EngineCall::Initialize);
        if self.fails(FailPoint::Initialize) {
            return Err(EngineError::other("core script failed to load"));
        }
        self.initialized = true;
        Ok(())
    }

    fn stage(&mut self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        self.record(EngineCall::Stage(name.to_string()));
        self.require_init()?;
        if self.fails(FailPoint::Stage) {
            return Err(EngineError::other("storage exhausted"));
        }
        self.storage.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn probe(&mut self, name: &str) -> EngineResult<Vec<DiagnosticLine>> {
        self.record(EngineCall::Probe(name.to_string()));
        self.require_init()?;
        Ok((self.probe_script)(name))
    }

    fn query_duration(&mut self, name: &str) -> EngineResult<Option<f64>> {
        self.record(EngineCall::QueryDuration(name.to_string()));
        self.require_init()?;
        if !self.storage.contains_key(name) {
            return Err(EngineError::NotFound(name.to_string()));
        }
        Ok(self
            .query_durations
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix.as_str()))
            .and_then(|(_, d)| *d))
    }

    fn transcode(&mut self, args: &TranscodeArgs) -> EngineResult<Vec<DiagnosticLine>> {
        self.record(EngineCall::Transcode(args.clone()));
        self.require_init()?;
        for input in [&args.video_input, &args.audio_input] {
            if !self.storage.contains_key(input.as_str()) {
                return Err(EngineError::NotFound(input.clone()));
            }
        }
        if self.fails(FailPoint::Transcode) {
            return Err(EngineError::command_failed("fake", 1, "Conversion failed!"));
        }
        if !self.fails(FailPoint::NoOutput) {
            self.storage
                .insert(args.output.clone(), self.output_bytes.clone());
        }
        Ok(vec![DiagnosticLine::stderr(format!(
            "Output #0, mp4, to '{}':",
            args.output
        ))])
    }

    fn read_output(&mut self, name: &str) -> EngineResult<Vec<u8>> {
        self.record(EngineCall::ReadOutput(name.to_string()));
        if self.fails(FailPoint::ReadOutput) {
            return Err(EngineError::other("read failed"));
        }
        self.storage
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    fn unstage(&mut self, name: &str) -> EngineResult<()> {
        self.record(EngineCall::Unstage(name.to_string()));
        if self.fails(FailPoint::Unstage) {
            return Err(EngineError::other("unlink failed"));
        }
        self.storage
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }
}
