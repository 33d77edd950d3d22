//! Per-run logger with file and callback output.
//!
//! The run log is what a user reads to follow (or debug) one remux run.
//! Lines go to an optional log file and an optional callback. Engine
//! output is always kept in a bounded tail buffer; outside compact mode it
//! is also written to the log as it arrives.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};
use crate::engine::{DiagnosticKind, DiagnosticLine};

/// The most recent engine lines, oldest first.
#[derive(Debug)]
struct TailBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl TailBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    fn push(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

/// Log for one remux run.
pub struct RunLogger {
    run_name: String,
    log_path: Option<PathBuf>,
    file: Mutex<Option<BufWriter<File>>>,
    callback: Option<LogCallback>,
    config: LogConfig,
    tail: Mutex<TailBuffer>,
    last_progress: Mutex<Option<u32>>,
}

impl RunLogger {
    pub fn builder(run_name: impl Into<String>) -> RunLoggerBuilder {
        RunLoggerBuilder::new(run_name)
    }

    /// A logger with neither file nor callback. Only the tail buffer
    /// keeps anything.
    pub fn detached(config: LogConfig) -> Self {
        Self::with_sinks("detached".to_string(), None, None, config)
    }

    fn with_sinks(
        run_name: String,
        file: Option<(PathBuf, BufWriter<File>)>,
        callback: Option<LogCallback>,
        config: LogConfig,
    ) -> Self {
        let (log_path, writer) = file.map_or((None, None), |(p, w)| (Some(p), Some(w)));
        Self {
            run_name,
            log_path,
            file: Mutex::new(writer),
            callback,
            tail: Mutex::new(TailBuffer::new(config.error_tail)),
            config,
            last_progress: Mutex::new(None),
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Path of the log file, if this logger writes one.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Log `message` if `level` passes the configured minimum.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level >= self.config.level {
            self.emit(message);
        }
    }

    fn marked(&self, level: LogLevel, prefix: MessagePrefix, message: &str) {
        self.log(level, &prefix.format(message));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.marked(LogLevel::Warn, MessagePrefix::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.marked(LogLevel::Error, MessagePrefix::Error, message);
    }

    /// An engine command about to run.
    pub fn command(&self, command: &str) {
        self.marked(LogLevel::Info, MessagePrefix::Command, command);
    }

    pub fn phase(&self, name: &str) {
        self.marked(LogLevel::Info, MessagePrefix::Phase, name);
    }

    pub fn section(&self, name: &str) {
        self.marked(LogLevel::Info, MessagePrefix::Section, name);
    }

    pub fn success(&self, message: &str) {
        self.marked(LogLevel::Info, MessagePrefix::Success, message);
    }

    /// Log overall progress. In compact mode only one line per
    /// `progress_step` percent (and 100% once) gets through.
    ///
    /// Returns whether a line was logged.
    pub fn progress(&self, percent: u32) -> bool {
        let percent = percent.min(100);
        if self.config.compact && !self.progress_due(percent) {
            return false;
        }
        self.info(&format!("Progress: {}%", percent));
        true
    }

    fn progress_due(&self, percent: u32) -> bool {
        let step = self.config.progress_step.max(1);
        let mut last = self.last_progress.lock();
        let due = match *last {
            None => true,
            Some(previous) if percent == 100 => previous != 100,
            Some(previous) => percent / step > previous / step,
        };
        if due {
            *last = Some(percent);
        }
        due
    }

    /// Record one line of engine output.
    pub fn engine_line(&self, line: &DiagnosticLine) {
        self.tail.lock().push(&line.message);
        if self.config.compact {
            return;
        }
        let tag = match line.kind {
            DiagnosticKind::Stderr => "[stderr] ",
            DiagnosticKind::Stdout => "",
            DiagnosticKind::Info => "[probe] ",
        };
        self.emit(&format!("{}{}", tag, line.message));
    }

    /// Record every line of an engine diagnostic stream.
    pub fn diagnostics(&self, lines: &[DiagnosticLine]) {
        for line in lines {
            self.engine_line(line);
        }
    }

    /// Dump the tail buffer under a `[<header>/tail]` marker, whatever the
    /// level or mode.
    pub fn show_tail(&self, header: &str) {
        let lines = self.tail.lock().snapshot();
        if lines.is_empty() {
            return;
        }
        self.emit(&format!("[{}/tail]", header));
        for line in &lines {
            self.emit(line);
        }
    }

    pub fn clear_tail(&self) {
        self.tail.lock().lines.clear();
    }

    pub fn tail_lines(&self) -> Vec<String> {
        self.tail.lock().snapshot()
    }

    pub fn flush(&self) {
        if let Some(writer) = self.file.lock().as_mut() {
            let _ = writer.flush();
        }
    }

    /// Flush and close the log file. The callback keeps receiving lines.
    pub fn close(&self) {
        if let Some(mut writer) = self.file.lock().take() {
            let _ = writer.flush();
        }
    }

    fn emit(&self, message: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        };

        if let Some(writer) = self.file.lock().as_mut() {
            let _ = writeln!(writer, "{}", line);
        }
        if let Some(ref callback) = self.callback {
            callback(&line);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RunLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLogger")
            .field("run_name", &self.run_name)
            .field("log_path", &self.log_path)
            .field("compact", &self.config.compact)
            .finish()
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect()
}

/// Builder for [`RunLogger`].
pub struct RunLoggerBuilder {
    run_name: String,
    log_dir: Option<PathBuf>,
    config: LogConfig,
    callback: Option<LogCallback>,
}

impl RunLoggerBuilder {
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            log_dir: None,
            config: LogConfig::default(),
            callback: None,
        }
    }

    /// Also write `<run_name>.log` into `dir`.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.config.compact = compact;
        self
    }

    pub fn progress_step(mut self, step: u32) -> Self {
        self.config.progress_step = step;
        self
    }

    pub fn timestamps(mut self, show: bool) -> Self {
        self.config.show_timestamps = show;
        self
    }

    pub fn callback(mut self, callback: LogCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Build the logger, creating the log directory and file if one was
    /// requested.
    pub fn build(self) -> std::io::Result<RunLogger> {
        let file = match self.log_dir {
            Some(dir) => {
                fs::create_dir_all(&dir)?;
                let path = dir.join(format!("{}.log", sanitize_filename(&self.run_name)));
                let writer = BufWriter::new(File::create(&path)?);
                Some((path, writer))
            }
            None => None,
        };
        Ok(RunLogger::with_sinks(
            self.run_name,
            file,
            self.callback,
            self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Logger without timestamps whose lines are collected.
    fn collecting(config: LogConfig) -> (RunLogger, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let logger = RunLogger::builder("run")
            .config(config)
            .timestamps(false)
            .callback(Box::new(move |msg| sink.lock().push(msg.to_string())))
            .build()
            .unwrap();
        (logger, lines)
    }

    #[test]
    fn file_gets_run_name() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::builder("retime_clip:1")
            .log_dir(dir.path().join("logs"))
            .build()
            .unwrap();

        let path = logger.log_path().unwrap().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "retime_clip_1.log");
    }

    #[test]
    fn file_and_callback_see_the_same_lines() {
        let dir = tempdir().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let logger = RunLogger::builder("run")
            .log_dir(dir.path())
            .callback(Box::new(move |msg| sink.lock().push(msg.to_string())))
            .build()
            .unwrap();

        logger.phase("Probe");
        logger.info("Analyzing video and audio durations...");
        logger.close();

        let content = fs::read_to_string(logger.log_path().unwrap()).unwrap();
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        for line in seen.iter() {
            assert!(content.contains(line.as_str()));
        }
        assert!(content.contains("=== Probe ==="));
    }

    #[test]
    fn no_file_without_log_dir() {
        let logger = RunLogger::builder("memory").build().unwrap();
        assert!(logger.log_path().is_none());
        logger.info("goes nowhere");
    }

    #[test]
    fn below_level_is_dropped() {
        let (logger, lines) = collecting(LogConfig::default());

        logger.debug("hidden");
        logger.warn("shown");
        logger.command("ffmpeg -version");

        assert_eq!(
            *lines.lock(),
            vec!["[WARNING] shown".to_string(), "$ ffmpeg -version".to_string()]
        );
    }

    #[test]
    fn timestamps_prefix_lines() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let logger = RunLogger::builder("run")
            .callback(Box::new(move |msg| sink.lock().push(msg.to_string())))
            .build()
            .unwrap();

        logger.success("done");

        let line = seen.lock()[0].clone();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] [SUCCESS] done"));
    }

    #[test]
    fn compact_progress_is_thinned_to_steps() {
        let logger = RunLogger::builder("run")
            .compact(true)
            .progress_step(20)
            .build()
            .unwrap();

        assert!(logger.progress(0));
        assert!(!logger.progress(5));
        assert!(!logger.progress(15));
        assert!(logger.progress(20));
        assert!(!logger.progress(25));
        assert!(logger.progress(40));
        assert!(logger.progress(100));
        assert!(!logger.progress(100));
    }

    #[test]
    fn verbose_progress_logs_everything() {
        let (logger, lines) = collecting(LogConfig::verbose());

        assert!(logger.progress(1));
        assert!(logger.progress(2));
        assert_eq!(lines.lock().len(), 2);
    }

    #[test]
    fn compact_engine_output_only_reaches_tail() {
        let (logger, lines) = collecting(LogConfig::default());

        logger.diagnostics(&[
            DiagnosticLine::stderr("  Duration: 00:00:20.00"),
            DiagnosticLine::stdout("frame=1"),
        ]);
        assert!(lines.lock().is_empty());
        assert_eq!(logger.tail_lines().len(), 2);

        logger.show_tail("ffmpeg");
        let shown = lines.lock().clone();
        assert_eq!(
            shown,
            vec![
                "[ffmpeg/tail]".to_string(),
                "  Duration: 00:00:20.00".to_string(),
                "frame=1".to_string(),
            ]
        );
    }

    #[test]
    fn verbose_engine_output_is_tagged_by_stream() {
        let (logger, lines) = collecting(LogConfig::verbose());

        logger.engine_line(&DiagnosticLine::stderr("Input #0"));
        logger.engine_line(&DiagnosticLine::stdout("plain"));
        logger.engine_line(&DiagnosticLine::info("video-a.mp4: duration 20.000s"));

        assert_eq!(
            *lines.lock(),
            vec![
                "[stderr] Input #0".to_string(),
                "plain".to_string(),
                "[probe] video-a.mp4: duration 20.000s".to_string(),
            ]
        );
    }

    #[test]
    fn tail_keeps_most_recent_lines() {
        let config = LogConfig {
            error_tail: 5,
            ..LogConfig::default()
        };
        let logger = RunLogger::detached(config);

        for i in 0..10 {
            logger.engine_line(&DiagnosticLine::stderr(format!("Line {}", i)));
        }

        let tail = logger.tail_lines();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], "Line 5");
        assert_eq!(tail[4], "Line 9");

        logger.clear_tail();
        assert!(logger.tail_lines().is_empty());
    }

    #[test]
    fn zero_tail_keeps_nothing() {
        let config = LogConfig {
            error_tail: 0,
            ..LogConfig::default()
        };
        let logger = RunLogger::detached(config);
        logger.engine_line(&DiagnosticLine::stderr("dropped"));
        assert!(logger.tail_lines().is_empty());
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
    }
}
