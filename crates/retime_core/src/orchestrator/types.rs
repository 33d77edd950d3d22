//! Types shared by the remux run.

use crate::logging::RunLogger;
use crate::models::RemuxReport;

/// Progress callback type for reporting run progress.
///
/// Arguments: (stage_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Stages of a remux run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemuxStage {
    Initialize,
    Stage,
    Probe,
    Compute,
    Transcode,
    ReadOutput,
    Cleanup,
}

impl RemuxStage {
    pub const ALL: [RemuxStage; 7] = [
        RemuxStage::Initialize,
        RemuxStage::Stage,
        RemuxStage::Probe,
        RemuxStage::Compute,
        RemuxStage::Transcode,
        RemuxStage::ReadOutput,
        RemuxStage::Cleanup,
    ];

    /// Phase name shown in the run log.
    pub fn name(&self) -> &'static str {
        match self {
            RemuxStage::Initialize => "Initialize",
            RemuxStage::Stage => "Stage",
            RemuxStage::Probe => "Probe",
            RemuxStage::Compute => "Compute",
            RemuxStage::Transcode => "Transcode",
            RemuxStage::ReadOutput => "Read output",
            RemuxStage::Cleanup => "Cleanup",
        }
    }

    /// Overall progress when this stage starts.
    pub fn start_percent(&self) -> u32 {
        match self {
            RemuxStage::Initialize => 0,
            RemuxStage::Stage => 10,
            RemuxStage::Probe => 20,
            RemuxStage::Compute => 35,
            RemuxStage::Transcode => 40,
            RemuxStage::ReadOutput => 90,
            RemuxStage::Cleanup => 95,
        }
    }
}

impl std::fmt::Display for RemuxStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-run context: where log lines and progress go.
pub struct RunContext<'a> {
    pub logger: &'a RunLogger,
    progress_callback: Option<&'a ProgressCallback>,
}

impl<'a> RunContext<'a> {
    pub fn new(logger: &'a RunLogger) -> Self {
        Self {
            logger,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: &'a ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set) and the run log.
    pub fn report_progress(&self, stage: &str, percent: u32, message: &str) {
        self.logger.progress(percent);
        if let Some(callback) = self.progress_callback {
            callback(stage, percent, message);
        }
    }

    /// Log the phase marker for `stage` and report its start.
    pub fn enter(&self, stage: RemuxStage) {
        self.logger.phase(stage.name());
        self.report_progress(
            stage.name(),
            stage.start_percent(),
            &format!("Starting {}", stage.name()),
        );
    }
}

/// Output bytes and report of a successful run.
#[derive(Debug, Clone)]
pub struct RemuxOutput {
    pub bytes: Vec<u8>,
    pub report: RemuxReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn stage_percentages_increase() {
        let percents: Vec<u32> = RemuxStage::ALL.iter().map(|s| s.start_percent()).collect();
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(RemuxStage::ReadOutput.name(), "Read output");
    }

    #[test]
    fn context_forwards_progress() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Box::new(move |stage, percent, _msg| {
            sink.lock().push((stage.to_string(), percent));
        });
        let logger = RunLogger::detached(LogConfig::default());

        let ctx = RunContext::new(&logger).with_progress_callback(&callback);
        ctx.enter(RemuxStage::Probe);
        ctx.report_progress("Complete", 100, "done");

        assert_eq!(
            *seen.lock(),
            vec![("Probe".to_string(), 20), ("Complete".to_string(), 100)]
        );
    }
}
