//! Subprocess-backed engine using the `ffmpeg` and `ffprobe` executables.
//!
//! Working storage is a private temporary directory created on
//! `initialize` and removed when the engine is dropped.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

use super::{DiagnosticLine, EngineError, EngineResult, MediaEngine, TranscodeArgs};
use crate::config::EngineSettings;

/// Number of trailing stderr lines kept in a command failure message.
const FAILURE_TAIL_LINES: usize = 5;

/// Engine that shells out to ffmpeg.
pub struct FfmpegEngine {
    /// Path to ffmpeg executable.
    ffmpeg_path: PathBuf,
    /// Path to ffprobe executable.
    ffprobe_path: PathBuf,
    /// Working storage (None until initialized).
    work_dir: Option<TempDir>,
}

impl FfmpegEngine {
    /// Engine using `ffmpeg` and `ffprobe` from PATH.
    pub fn new() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            work_dir: None,
        }
    }

    /// Engine using the executables named in the settings.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        let mut engine = Self::new();
        if !settings.ffmpeg_path.is_empty() {
            engine.ffmpeg_path = PathBuf::from(&settings.ffmpeg_path);
        }
        if !settings.ffprobe_path.is_empty() {
            engine.ffprobe_path = PathBuf::from(&settings.ffprobe_path);
        }
        engine
    }

    /// Set a custom path to the ffmpeg executable.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Set a custom path to the ffprobe executable.
    pub fn with_ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe_path = path.into();
        self
    }

    /// Working directory, if initialized.
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_ref().map(|d| d.path())
    }

    /// Resolve a staging name to a path inside the working directory.
    fn staged_path(&self, name: &str) -> EngineResult<PathBuf> {
        let dir = self
            .work_dir
            .as_ref()
            .ok_or_else(|| EngineError::NotInitialized(self.name().to_string()))?;
        validate_name(name)?;
        Ok(dir.path().join(name))
    }

    fn spawn_output(&self, tool: &Path, cmd: &mut Command) -> EngineResult<Output> {
        tracing::debug!("Running {:?}", cmd);
        cmd.stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    EngineError::tool_not_found(tool.display().to_string(), e.to_string())
                }
                _ => EngineError::io(format!("running {}", tool.display()), e),
            })
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn is_initialized(&self) -> bool {
        self.work_dir.is_some()
    }

    fn initialize(&mut self) -> EngineResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let ffmpeg = self.ffmpeg_path.clone();
        let output = self.spawn_output(&ffmpeg, Command::new(&ffmpeg).arg("-version"))?;
        if !output.status.success() {
            return Err(EngineError::command_failed(
                ffmpeg.display().to_string(),
                output.status.code().unwrap_or(-1),
                "version check failed",
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        tracing::info!("Using {}", version.lines().next().unwrap_or("ffmpeg"));

        let dir = tempfile::Builder::new()
            .prefix("retime-")
            .tempdir()
            .map_err(|e| EngineError::io("creating working directory", e))?;
        tracing::debug!("Engine working directory: {}", dir.path().display());
        self.work_dir = Some(dir);
        Ok(())
    }

    fn stage(&mut self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        let path = self.staged_path(name)?;
        std::fs::write(&path, bytes).map_err(|e| EngineError::io(format!("staging {}", name), e))
    }

    fn probe(&mut self, name: &str) -> EngineResult<Vec<DiagnosticLine>> {
        let path = self.staged_path(name)?;
        let ffmpeg = self.ffmpeg_path.clone();
        let output = self.spawn_output(
            &ffmpeg,
            Command::new(&ffmpeg)
                .arg("-hide_banner")
                .arg("-nostdin")
                .arg("-i")
                .arg(&path),
        )?;

        // Info mode has no output file, so ffmpeg always exits non-zero here.
        Ok(collect_lines(&output))
    }

    fn query_duration(&mut self, name: &str) -> EngineResult<Option<f64>> {
        let path = self.staged_path(name)?;
        let ffprobe = self.ffprobe_path.clone();
        let output = self.spawn_output(
            &ffprobe,
            Command::new(&ffprobe)
                .arg("-v")
                .arg("error")
                .arg("-show_entries")
                .arg("format=duration")
                .arg("-of")
                .arg("default=noprint_wrappers=1:nokey=1")
                .arg(&path),
        )?;

        if !output.status.success() {
            return Err(EngineError::command_failed(
                "ffprobe",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(parse_probe_duration(&String::from_utf8_lossy(&output.stdout)))
    }

    fn transcode(&mut self, args: &TranscodeArgs) -> EngineResult<Vec<DiagnosticLine>> {
        let dir = self
            .work_dir
            .as_ref()
            .ok_or_else(|| EngineError::NotInitialized(self.name().to_string()))?
            .path()
            .to_path_buf();
        for name in [&args.video_input, &args.audio_input, &args.output] {
            validate_name(name)?;
        }

        let tokens = args.to_tokens_with(|name| dir.join(name).to_string_lossy().to_string());
        let ffmpeg = self.ffmpeg_path.clone();
        let output = self.spawn_output(
            &ffmpeg,
            Command::new(&ffmpeg)
                .arg("-hide_banner")
                .arg("-nostdin")
                .arg("-y")
                .args(&tokens),
        )?;

        let lines = collect_lines(&output);
        if !output.status.success() {
            let start = lines.len().saturating_sub(FAILURE_TAIL_LINES);
            let tail: Vec<&str> = lines[start..].iter().map(|l| l.message.as_str()).collect();
            return Err(EngineError::command_failed(
                "ffmpeg",
                output.status.code().unwrap_or(-1),
                tail.join("\n"),
            ));
        }

        Ok(lines)
    }

    fn read_output(&mut self, name: &str) -> EngineResult<Vec<u8>> {
        let path = self.staged_path(name)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EngineError::NotFound(name.to_string()),
            _ => EngineError::io(format!("reading {}", name), e),
        })
    }

    fn unstage(&mut self, name: &str) -> EngineResult<()> {
        let path = self.staged_path(name)?;
        std::fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EngineError::NotFound(name.to_string()),
            _ => EngineError::io(format!("removing {}", name), e),
        })
    }
}

/// Reject names that would escape the working directory.
fn validate_name(name: &str) -> EngineResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        Err(EngineError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Split captured process output into diagnostic lines (stdout first).
fn collect_lines(output: &Output) -> Vec<DiagnosticLine> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(DiagnosticLine::stdout)
        .chain(
            stderr
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(DiagnosticLine::stderr),
        )
        .collect()
}

/// Parse ffprobe's bare `format=duration` value ("N/A" when unknown).
fn parse_probe_duration(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}
