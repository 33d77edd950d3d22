//! Values exchanged with an engine.

use serde::{Deserialize, Serialize};

use crate::config::EncodingSettings;
use crate::speed::SpeedFactor;

/// Which output channel a diagnostic line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Engine error/info stream (where ffmpeg prints stream information).
    Stderr,
    /// Engine standard output.
    Stdout,
    /// Messages produced by the engine wrapper itself.
    Info,
}

/// One line of free-form engine output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLine {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl DiagnosticLine {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn stderr(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Stderr, message)
    }

    pub fn stdout(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Stdout, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, message)
    }

    /// Whether this line is on the stream scanned for durations.
    pub fn is_stderr(&self) -> bool {
        self.kind == DiagnosticKind::Stderr
    }
}

/// Structured retime + remux request.
///
/// Input 0 is the video, input 1 the audio. The video stream of input 0
/// is rescaled by `1 / speed_factor` and mapped together with the
/// untouched audio stream of input 1 into a single output.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeArgs {
    /// Staged name of the video input.
    pub video_input: String,
    /// Staged name of the audio input.
    pub audio_input: String,
    /// Speed factor the filter graph applies.
    pub speed_factor: SpeedFactor,
    /// Filter graph producing the `[v]` pad.
    pub filter_complex: String,
    /// Stream map for the rescaled video.
    pub video_map: String,
    /// Stream map for the original audio.
    pub audio_map: String,
    /// Output codec parameters.
    pub encoding: EncodingSettings,
    /// Staged name of the output file.
    pub output: String,
}

impl TranscodeArgs {
    /// Build the request that retimes `video_input` by `speed_factor`.
    pub fn retime(
        video_input: impl Into<String>,
        audio_input: impl Into<String>,
        speed_factor: SpeedFactor,
        encoding: &EncodingSettings,
        output: impl Into<String>,
    ) -> Self {
        Self {
            video_input: video_input.into(),
            audio_input: audio_input.into(),
            speed_factor,
            filter_complex: speed_factor.setpts_filter(),
            video_map: "[v]".to_string(),
            audio_map: "1:a".to_string(),
            encoding: encoding.clone(),
            output: output.into(),
        }
    }

    /// ffmpeg-style argument tokens using staged names as paths.
    pub fn to_tokens(&self) -> Vec<String> {
        self.to_tokens_with(|name| name.to_string())
    }

    /// ffmpeg-style argument tokens, resolving staged names through `resolve`.
    pub fn to_tokens_with<F>(&self, resolve: F) -> Vec<String>
    where
        F: Fn(&str) -> String,
    {
        let enc = &self.encoding;
        let mut tokens = vec![
            "-i".to_string(),
            resolve(&self.video_input),
            "-i".to_string(),
            resolve(&self.audio_input),
            "-filter_complex".to_string(),
            self.filter_complex.clone(),
            "-map".to_string(),
            self.video_map.clone(),
            "-map".to_string(),
            self.audio_map.clone(),
            "-c:v".to_string(),
            enc.video_codec.clone(),
            "-preset".to_string(),
            enc.preset.clone(),
            "-crf".to_string(),
            enc.crf.to_string(),
            "-c:a".to_string(),
            enc.audio_codec.clone(),
            "-b:a".to_string(),
            enc.audio_bitrate.clone(),
        ];

        if enc.shortest {
            tokens.push("-shortest".to_string());
        }

        tokens.push(resolve(&self.output));
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(factor: f64) -> TranscodeArgs {
        let speed = SpeedFactor::compute(factor * 10.0, 10.0).unwrap();
        TranscodeArgs::retime(
            "video-clip.mp4",
            "audio-dub.mp3",
            speed,
            &EncodingSettings::default(),
            "synced_output.mp4",
        )
    }

    #[test]
    fn tokens_match_reference_command() {
        let tokens = args(2.0).to_tokens();
        let expected: Vec<String> = [
            "-i",
            "video-clip.mp4",
            "-i",
            "audio-dub.mp3",
            "-filter_complex",
            "[0:v]setpts=PTS/2[v]",
            "-map",
            "[v]",
            "-map",
            "1:a",
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "23",
            "-c:a",
            "aac",
            "-b:a",
            "128k",
            "-shortest",
            "synced_output.mp4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(tokens, expected);
    }

    #[test]
    fn shortest_flag_is_optional() {
        let mut a = args(1.5);
        a.encoding.shortest = false;
        let tokens = a.to_tokens();
        assert!(!tokens.iter().any(|t| t == "-shortest"));
        assert_eq!(tokens.last().map(String::as_str), Some("synced_output.mp4"));
    }

    #[test]
    fn resolver_only_touches_file_names() {
        let tokens = args(2.0).to_tokens_with(|name| format!("/work/{}", name));
        assert_eq!(tokens[1], "/work/video-clip.mp4");
        assert_eq!(tokens[3], "/work/audio-dub.mp3");
        assert_eq!(tokens.last().map(String::as_str), Some("/work/synced_output.mp4"));
        assert!(tokens.contains(&"1:a".to_string()));
    }

    #[test]
    fn diagnostic_constructors_set_kind() {
        assert!(DiagnosticLine::stderr("x").is_stderr());
        assert!(!DiagnosticLine::stdout("x").is_stderr());
        assert_eq!(DiagnosticLine::info("x").kind, DiagnosticKind::Info);
    }
}
