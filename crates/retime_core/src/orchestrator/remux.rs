//! The remux run: probe both inputs, compute the speed factor, retime.

use crate::config::{EncodingSettings, Settings};
use crate::engine::{EngineSession, MediaEngine, TranscodeArgs};
use crate::models::{DurationSourceKind, MediaHandle, ProbeResult, RemuxReport, Slot};
use crate::probe::{source_for, DurationSource};
use crate::speed::SpeedFactor;

use super::errors::{ProcessingError, ProcessingResult};
use super::staging::{StagingArea, StagingPlan};
use super::types::{RemuxOutput, RemuxStage, RunContext};

/// Drives one engine through a complete retime + remux run.
///
/// Runs are strictly sequential: each engine call completes before the
/// next starts. Inputs are staged under collision-free names and removed
/// again however the run ends.
pub struct RemuxOrchestrator {
    encoding: EncodingSettings,
    output_name: String,
    tolerance: f64,
    show_command: bool,
    duration_source: Box<dyn DurationSource>,
}

impl RemuxOrchestrator {
    /// Create an orchestrator from settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            encoding: settings.encoding.clone(),
            output_name: settings.paths.output_file_name.clone(),
            tolerance: settings.sync.unchanged_tolerance,
            show_command: settings.logging.show_command,
            duration_source: source_for(settings.sync.duration_source),
        }
    }

    /// Replace the duration source.
    pub fn with_duration_source(mut self, source: Box<dyn DurationSource>) -> Self {
        self.duration_source = source;
        self
    }

    pub fn duration_source_kind(&self) -> DurationSourceKind {
        self.duration_source.kind()
    }

    /// Tolerance around 1.0 for the "unchanged" classification.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Name the produced file is staged and offered under.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Run the full pipeline against the session's engine.
    ///
    /// Fails with `Busy` without touching the engine when another run
    /// holds the session.
    pub fn run(
        &self,
        session: &EngineSession,
        video: &MediaHandle,
        audio: &MediaHandle,
        ctx: &RunContext<'_>,
    ) -> ProcessingResult<RemuxOutput> {
        let Some(mut guard) = session.try_acquire() else {
            let err = ProcessingError::busy(session.engine_name());
            ctx.logger.error(&err.to_string());
            return Err(err);
        };

        ctx.logger.section("Starting Processing");
        tracing::info!(
            video = video.name(),
            audio = audio.name(),
            source = %self.duration_source.kind(),
            "Starting remux run"
        );

        let engine: &mut dyn MediaEngine = &mut **guard;
        let result = self.run_locked(engine, video, audio, ctx);

        match &result {
            Ok(output) => {
                ctx.report_progress("Complete", 100, "Run finished");
                tracing::info!(
                    speed_factor = output.report.speed_factor,
                    bytes = output.bytes.len(),
                    "Remux run finished"
                );
            }
            Err(e) => {
                ctx.logger.error(&e.to_string());
                ctx.logger.show_tail(session.engine_name());
                tracing::warn!(kind = %e.kind(), "Remux run failed: {}", e);
            }
        }
        ctx.logger.section("Processing Finished");

        result
    }

    fn run_locked(
        &self,
        engine: &mut dyn MediaEngine,
        video: &MediaHandle,
        audio: &MediaHandle,
        ctx: &RunContext<'_>,
    ) -> ProcessingResult<RemuxOutput> {
        let engine_name = engine.name().to_string();

        ctx.enter(RemuxStage::Initialize);
        if engine.is_initialized() {
            ctx.logger.info(&format!("{} already loaded.", engine_name));
        } else {
            ctx.logger.info(&format!("Loading {}...", engine_name));
            engine
                .initialize()
                .map_err(|e| ProcessingError::engine_init(&engine_name, e))?;
            ctx.logger.info(&format!("{} loaded.", engine_name));
        }

        let plan = StagingPlan::new(video, audio, &self.output_name);
        let mut area = StagingArea::new(engine, ctx.logger);
        let result = self.process(&mut area, &plan, &engine_name, video, audio, ctx);

        ctx.enter(RemuxStage::Cleanup);
        area.cleanup();
        result
    }

    fn process(
        &self,
        area: &mut StagingArea<'_>,
        plan: &StagingPlan,
        engine_name: &str,
        video: &MediaHandle,
        audio: &MediaHandle,
        ctx: &RunContext<'_>,
    ) -> ProcessingResult<RemuxOutput> {
        let logger = ctx.logger;

        ctx.enter(RemuxStage::Stage);
        for (slot, handle) in [(Slot::Video, video), (Slot::Audio, audio)] {
            let name = plan.name(slot);
            logger.info(&format!(
                "Writing {} file ({}) to engine storage as {}...",
                slot,
                handle.name(),
                name
            ));
            area.stage(name, handle.bytes())
                .map_err(|e| ProcessingError::stage_failed(slot, handle.name(), e))?;
        }

        ctx.enter(RemuxStage::Probe);
        logger.info("Analyzing video and audio durations...");
        let (video_result, audio_result) = self.probe_inputs(area, plan, video, audio, ctx)?;
        logger.info(&format!(
            "Original Video Duration: {:.2} seconds",
            video_result.duration_seconds
        ));
        logger.info(&format!(
            "Audio Duration: {:.2} seconds",
            audio_result.duration_seconds
        ));

        ctx.enter(RemuxStage::Compute);
        let factor =
            SpeedFactor::compute(video_result.duration_seconds, audio_result.duration_seconds)?;
        let direction = factor.direction(self.tolerance);
        logger.info(&format!("Calculated speed factor for video: {}", factor));
        logger.info(direction.summary());

        ctx.enter(RemuxStage::Transcode);
        let args = TranscodeArgs::retime(
            plan.name(Slot::Video),
            plan.name(Slot::Audio),
            factor,
            &self.encoding,
            plan.output(),
        );
        let tokens = args.to_tokens();
        let command = format!("{} {}", engine_name, tokens.join(" "));
        if self.show_command {
            logger.command(&command);
        } else {
            logger.debug(&command);
        }
        logger.info("Processing video and audio...");

        area.track(plan.output());
        let diagnostics = area
            .engine()
            .transcode(&args)
            .map_err(ProcessingError::transcode_engine)?;
        logger.diagnostics(&diagnostics);
        logger.info("Processing complete!");

        ctx.enter(RemuxStage::ReadOutput);
        logger.info("Reading output file from engine storage...");
        let bytes = area.engine().read_output(plan.output()).map_err(|e| {
            if e.is_not_found() {
                ProcessingError::transcode(format!(
                    "engine produced no output file '{}'",
                    plan.output()
                ))
            } else {
                ProcessingError::transcode_engine(e)
            }
        })?;
        if bytes.is_empty() {
            return Err(ProcessingError::transcode(format!(
                "output file '{}' is empty",
                plan.output()
            )));
        }
        logger.success("Video ready for playback and download.");

        Ok(RemuxOutput {
            bytes,
            report: RemuxReport {
                video: video_result,
                audio: audio_result,
                speed_factor: factor.value(),
                direction,
                engine_args: tokens,
            },
        })
    }

    /// Probe both inputs, then fail listing every input without a duration.
    fn probe_inputs(
        &self,
        area: &mut StagingArea<'_>,
        plan: &StagingPlan,
        video: &MediaHandle,
        audio: &MediaHandle,
        ctx: &RunContext<'_>,
    ) -> ProcessingResult<(ProbeResult, ProbeResult)> {
        let names = plan.slot_names();
        let mut found = [None, None];
        let mut failures: Vec<(Slot, String)> = Vec::new();

        for (i, (slot, handle)) in [(Slot::Video, video), (Slot::Audio, audio)]
            .into_iter()
            .enumerate()
        {
            match self.duration_source.probe(area.engine(), slot, &names) {
                Ok(outcome) => {
                    ctx.logger.diagnostics(&outcome.diagnostics);
                    match outcome.duration {
                        Some(seconds) => match ProbeResult::new(handle.name(), seconds) {
                            Some(result) => found[i] = Some(result),
                            None => failures
                                .push((slot, format!("invalid duration {} seconds", seconds))),
                        },
                        None => {
                            failures.push((slot, "no duration in engine output".to_string()))
                        }
                    }
                }
                Err(e) => failures.push((slot, e.to_string())),
            }
        }

        match found {
            [Some(video_result), Some(audio_result)] => Ok((video_result, audio_result)),
            _ => {
                let slots = failures.iter().map(|(slot, _)| *slot).collect();
                let detail = failures
                    .iter()
                    .map(|(slot, reason)| format!("{}: {}", slot, reason))
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(ProcessingError::probe_failed(
                    slots,
                    format!("{}. Files might be corrupted or unsupported.", detail),
                ))
            }
        }
    }
}
