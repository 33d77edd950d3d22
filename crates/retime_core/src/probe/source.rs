//! Duration source strategies.

use crate::engine::{DiagnosticLine, EngineResult, MediaEngine};
use crate::models::{DurationSourceKind, Slot};

use super::duration::{DurationExtractor, SlotNames};

/// Result of probing one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeOutcome {
    /// Duration attributed to the probed input, if any.
    pub duration: Option<f64>,
    /// Diagnostic output of the probe, for the caller to log.
    pub diagnostics: Vec<DiagnosticLine>,
}

/// Strategy for learning the duration of a staged input.
///
/// Implementations only talk to the engine; deciding what a missing
/// duration means is left to the caller.
pub trait DurationSource: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> DurationSourceKind;

    /// Probe the input in `slot`.
    ///
    /// `names` holds the staging names of both inputs.
    fn probe(
        &self,
        engine: &mut dyn MediaEngine,
        slot: Slot,
        names: &SlotNames,
    ) -> EngineResult<ProbeOutcome>;
}

/// Scrapes `Duration:` lines from the engine's info-mode output.
///
/// Only stderr lines are scanned. When several lines are attributed to the
/// probed input the last one wins; lines attributed to the other input are
/// skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogScrapeSource;

impl DurationSource for LogScrapeSource {
    fn kind(&self) -> DurationSourceKind {
        DurationSourceKind::LogScrape
    }

    fn probe(
        &self,
        engine: &mut dyn MediaEngine,
        slot: Slot,
        names: &SlotNames,
    ) -> EngineResult<ProbeOutcome> {
        let diagnostics = engine.probe(names.name(slot))?;
        let extractor = DurationExtractor::new(names.clone());

        let mut duration = None;
        for line in diagnostics.iter().filter(|l| l.is_stderr()) {
            match extractor.extract(&line.message) {
                Some((found, seconds)) if found == slot => duration = Some(seconds),
                Some((found, _)) => {
                    tracing::debug!("Probe of {} reported a {} duration, skipping", slot, found);
                }
                None => {}
            }
        }

        Ok(ProbeOutcome {
            duration,
            diagnostics,
        })
    }
}

/// Uses the engine's structured duration query.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredDurationSource;

impl DurationSource for StructuredDurationSource {
    fn kind(&self) -> DurationSourceKind {
        DurationSourceKind::Structured
    }

    fn probe(
        &self,
        engine: &mut dyn MediaEngine,
        slot: Slot,
        names: &SlotNames,
    ) -> EngineResult<ProbeOutcome> {
        let name = names.name(slot);
        let duration = engine.query_duration(name)?;
        let message = match duration {
            Some(d) => format!("{}: duration {:.3}s", name, d),
            None => format!("{}: no duration reported", name),
        };

        Ok(ProbeOutcome {
            duration,
            diagnostics: vec![DiagnosticLine::info(message)],
        })
    }
}

/// Duration source implementing `kind`.
pub fn source_for(kind: DurationSourceKind) -> Box<dyn DurationSource> {
    match kind {
        DurationSourceKind::LogScrape => Box::new(LogScrapeSource),
        DurationSourceKind::Structured => Box::new(StructuredDurationSource),
    }
}
