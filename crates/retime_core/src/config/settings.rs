//! Settings struct with TOML-based sections.
//!
//! Each section maps to a TOML table and can be updated independently.

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};
use crate::models::DurationSourceKind;
use crate::speed::DEFAULT_UNCHANGED_TOLERANCE;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Output locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Output codec parameters.
    #[serde(default)]
    pub encoding: EncodingSettings,

    /// Duration discovery and speed classification.
    #[serde(default)]
    pub sync: SyncSettings,

    /// Engine executables.
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Path configuration for outputs and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder the CLI writes synced files to.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Name of the produced file (also its staging name).
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,
}

fn default_output_folder() -> String {
    "synced".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_output_file_name() -> String {
    "synced_output.mp4".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
            output_file_name: default_output_file_name(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Keep raw engine output out of the log unless a run fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of engine lines to show when a run fails.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log the full engine command of the transcode.
    #[serde(default = "default_true")]
    pub show_command: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_command: true,
        }
    }
}

impl LoggingSettings {
    /// Run logger configuration at the given level.
    pub fn to_log_config(&self, level: LogLevel) -> LogConfig {
        LogConfig {
            level,
            compact: self.compact,
            progress_step: self.progress_step.max(1),
            error_tail: self.error_tail as usize,
            show_timestamps: true,
        }
    }
}

/// Output codec parameters for the retimed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSettings {
    /// Video encoder.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder preset name.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant rate factor (lower is higher quality).
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio encoder.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Stop at the end of the shorter mapped stream.
    #[serde(default = "default_true")]
    pub shortest: bool,
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            shortest: true,
        }
    }
}

/// Duration discovery and speed classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// How input durations are discovered.
    ///
    /// ffmpeg prints `Duration:` without the file name, so scraping only
    /// works with engines that name the input on that line.
    #[serde(default = "default_duration_source")]
    pub duration_source: DurationSourceKind,

    /// Distance from 1.0 under which the factor counts as unchanged.
    #[serde(default = "default_tolerance")]
    pub unchanged_tolerance: f64,
}

fn default_duration_source() -> DurationSourceKind {
    DurationSourceKind::Structured
}

fn default_tolerance() -> f64 {
    DEFAULT_UNCHANGED_TOLERANCE
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            duration_source: default_duration_source(),
            unchanged_tolerance: default_tolerance(),
        }
    }
}

/// Engine executable locations (empty = look up in PATH).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub ffmpeg_path: String,

    #[serde(default)]
    pub ffprobe_path: String,
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Encoding,
    Sync,
    Engine,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Encoding,
        ConfigSection::Sync,
        ConfigSection::Engine,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Sync => "sync",
            ConfigSection::Engine => "engine",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and log locations",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Encoding => "Codec parameters of the synced output",
            ConfigSection::Sync => "Duration discovery and speed classification",
            ConfigSection::Engine => "ffmpeg/ffprobe executables (empty = search PATH)",
        }
    }
}
