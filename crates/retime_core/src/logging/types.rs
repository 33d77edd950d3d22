//! Logging types and configuration.

use serde::{Deserialize, Serialize};

/// Severity of a run log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level for a `-v` count on the command line.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// `EnvFilter` directive for this level.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// How a [`RunLogger`](super::RunLogger) filters and decorates messages.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Messages below this level are dropped.
    pub level: LogLevel,
    /// Keep engine output out of the log (tail buffer only) and thin out
    /// progress lines.
    pub compact: bool,
    /// In compact mode, progress is logged once per this many percent.
    pub progress_step: u32,
    /// Engine lines kept for the failure dump.
    pub error_tail: usize,
    /// Prefix each line with `[HH:MM:SS]`.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: 20,
            error_tail: 20,
            show_timestamps: true,
        }
    }
}

impl LogConfig {
    /// Every engine line, every progress step.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            compact: false,
            progress_step: 1,
            error_tail: 50,
            ..Self::default()
        }
    }
}

/// Receives each formatted run log line (the presentation layer's log pane).
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Markers that make the run log scannable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// `$ ffmpeg -i ...`
    Command,
    /// `=== Probe ===`
    Phase,
    /// `--- Starting Processing ---`
    Section,
    Success,
    Warning,
    Error,
}

impl MessagePrefix {
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Section => format!("--- {} ---", message),
            MessagePrefix::Success => format!("[SUCCESS] {}", message),
            MessagePrefix::Warning => format!("[WARNING] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
        }
    }
}
