// Common data models for the download workflow

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::credentials;

/// Download mode chosen in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Audio,
    Video,
}

/// Quality preset; only affects the audio bitrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
    M4a,
    Flac,
    Opus,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::M4a => "m4a",
            Self::Flac => "flac",
            Self::Opus => "opus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Webm,
    Mkv,
}

impl VideoFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mkv => "mkv",
        }
    }
}

/// One user-initiated download request. Created fresh per click,
/// immutable for the duration of the job, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub url: String,
    pub mode: Mode,
    pub quality: Quality,
    pub audio_format: AudioFormat,
    pub video_format: VideoFormat,
}

/// Application configuration, resolved once at startup and passed into
/// the orchestrator at construction. Nothing reads the environment at
/// call time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory downloads land in
    pub output_dir: PathBuf,

    /// Flat key=value file holding the credential blob
    pub env_file: PathBuf,

    /// Whether cookie-based requests are attempted
    pub use_cookies: bool,
}

impl AppConfig {
    /// Key gating cookie use; value "True" enables it.
    pub const USE_COOKIES_KEY: &'static str = "USE_FIREFOX_COOKIES";

    /// Resolve configuration from the app base directory: `outputs/` and
    /// `.env` live next to the executable's working directory. The flag is
    /// read from the .env file first, the process environment second.
    pub fn load() -> Self {
        let base = std::env::current_dir()
            .unwrap_or_else(|_| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        let env_file = base.join(".env");

        let flag = credentials::read_env_value(&env_file, Self::USE_COOKIES_KEY)
            .or_else(|| std::env::var(Self::USE_COOKIES_KEY).ok());
        let use_cookies = flag.as_deref() == Some("True");

        Self {
            output_dir: base.join("outputs"),
            env_file,
            use_cookies,
        }
    }
}

/// Progress update pushed to the UI while a job is downloading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Cumulative bytes received so far
    pub downloaded_bytes: u64,

    /// Total size, once the engine has reported it
    pub total_bytes: Option<u64>,

    /// "downloading" or "finished"
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_names() {
        let payload = r#"{
            "url": "https://youtube.com/watch?v=abc123",
            "mode": "audio",
            "quality": "high",
            "audio_format": "flac",
            "video_format": "mp4"
        }"#;

        let request: JobRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(request.mode, Mode::Audio);
        assert_eq!(request.quality, Quality::High);
        assert_eq!(request.audio_format, AudioFormat::Flac);
        assert_eq!(request.video_format, VideoFormat::Mp4);
    }

    #[test]
    fn test_format_names_match_engine_values() {
        assert_eq!(AudioFormat::Opus.as_str(), "opus");
        assert_eq!(VideoFormat::Webm.as_str(), "webm");
    }
}
