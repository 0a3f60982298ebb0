// Job configuration builder - maps a JobRequest onto engine options
//
// Pure translation layer: no I/O, no state. The orchestrator feeds the
// result to exactly one engine invocation and drops it.

use std::path::{Path, PathBuf};

use super::models::{AudioFormat, JobRequest, Mode, Quality, VideoFormat};

/// How the engine should authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookiePolicy {
    /// Explicitly no cookie jar
    Disabled,

    /// Netscape cookie file on disk
    File(PathBuf),
}

/// Audio transcode step appended after download (audio mode only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPostprocessor {
    pub codec: AudioFormat,
    pub bitrate_kbps: u32,
}

/// The option set consumed by one engine invocation.
///
/// Invariants: audio mode never sets `merge_output_format`; video mode
/// never sets `audio_extraction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub format_selector: String,
    pub output_template: String,
    pub restrict_filenames: bool,
    pub windows_filenames: bool,
    pub quiet: bool,
    pub audio_extraction: Option<AudioPostprocessor>,
    pub merge_output_format: Option<VideoFormat>,
    /// ffmpeg args for the merge step; stream copy, no re-encode
    pub merge_args: Option<String>,
    pub cookies: CookiePolicy,
}

/// Build the option set for one request. `cookie_file` is the materialized
/// temp cookie path when credential use is enabled.
pub fn build_engine_options(
    request: &JobRequest,
    cookie_file: Option<&Path>,
    output_dir: &Path,
) -> EngineOptions {
    let output_template = output_dir
        .join("%(title)s.%(ext)s")
        .to_string_lossy()
        .to_string();

    let cookies = match cookie_file {
        Some(path) => CookiePolicy::File(path.to_path_buf()),
        None => CookiePolicy::Disabled,
    };

    match request.mode {
        Mode::Audio => EngineOptions {
            format_selector: "bestaudio/best".to_string(),
            output_template,
            restrict_filenames: true,
            windows_filenames: true,
            quiet: true,
            audio_extraction: Some(AudioPostprocessor {
                codec: request.audio_format,
                bitrate_kbps: match request.quality {
                    Quality::High => 320,
                    Quality::Medium => 192,
                },
            }),
            merge_output_format: None,
            merge_args: None,
            cookies,
        },
        Mode::Video => EngineOptions {
            format_selector: video_format_selector(request.video_format).to_string(),
            output_template,
            restrict_filenames: true,
            windows_filenames: true,
            quiet: true,
            audio_extraction: None,
            merge_output_format: Some(request.video_format),
            merge_args: Some("Merger:-c:v copy -c:a copy".to_string()),
            cookies,
        },
    }
}

/// Container-first fallback cascade for video mode.
fn video_format_selector(format: VideoFormat) -> &'static str {
    match format {
        VideoFormat::Mp4 => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
        VideoFormat::Webm => "bestvideo[ext=webm]+bestaudio[ext=webm]/best[ext=webm]/best",
        VideoFormat::Mkv => "bestvideo+bestaudio/best",
    }
}

impl EngineOptions {
    /// Render the options as yt-dlp CLI arguments. The engine appends its
    /// own plumbing (progress template, title print) and the URL.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.format_selector.clone()];

        args.push("-o".to_string());
        args.push(self.output_template.clone());

        if self.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }
        if self.windows_filenames {
            args.push("--windows-filenames".to_string());
        }
        if self.quiet {
            args.push("--quiet".to_string());
            args.push("--no-warnings".to_string());
        }

        if let Some(audio) = &self.audio_extraction {
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push(audio.codec.as_str().to_string());
            args.push("--audio-quality".to_string());
            args.push(format!("{}K", audio.bitrate_kbps));
        }

        if let Some(container) = self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.as_str().to_string());
        }
        if let Some(merge_args) = &self.merge_args {
            args.push("--postprocessor-args".to_string());
            args.push(merge_args.clone());
        }

        match &self.cookies {
            CookiePolicy::File(path) => {
                args.push("--cookies".to_string());
                args.push(path.to_string_lossy().to_string());
            }
            CookiePolicy::Disabled => {
                args.push("--no-cookies".to_string());
            }
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: Mode, quality: Quality, video_format: VideoFormat) -> JobRequest {
        JobRequest {
            url: "https://youtube.com/watch?v=abc123".to_string(),
            mode,
            quality,
            audio_format: AudioFormat::Mp3,
            video_format,
        }
    }

    #[test]
    fn test_audio_high_bitrate() {
        let options = build_engine_options(
            &request(Mode::Audio, Quality::High, VideoFormat::Mp4),
            None,
            Path::new("outputs"),
        );
        let audio = options.audio_extraction.unwrap();
        assert_eq!(audio.bitrate_kbps, 320);
        assert_eq!(audio.codec, AudioFormat::Mp3);
    }

    #[test]
    fn test_audio_medium_bitrate() {
        let options = build_engine_options(
            &request(Mode::Audio, Quality::Medium, VideoFormat::Mp4),
            None,
            Path::new("outputs"),
        );
        assert_eq!(options.audio_extraction.unwrap().bitrate_kbps, 192);
    }

    #[test]
    fn test_audio_never_sets_merge_format() {
        let options = build_engine_options(
            &request(Mode::Audio, Quality::High, VideoFormat::Mkv),
            None,
            Path::new("outputs"),
        );
        assert_eq!(options.format_selector, "bestaudio/best");
        assert!(options.merge_output_format.is_none());
        assert!(options.merge_args.is_none());
        assert!(!options
            .to_args()
            .iter()
            .any(|a| a == "--merge-output-format"));
    }

    #[test]
    fn test_video_never_sets_audio_postprocessor() {
        let options = build_engine_options(
            &request(Mode::Video, Quality::High, VideoFormat::Mp4),
            None,
            Path::new("outputs"),
        );
        assert!(options.audio_extraction.is_none());
        assert!(!options.to_args().iter().any(|a| a == "-x"));
    }

    #[test]
    fn test_mp4_fallback_cascade() {
        let options = build_engine_options(
            &request(Mode::Video, Quality::High, VideoFormat::Mp4),
            None,
            Path::new("outputs"),
        );
        assert_eq!(
            options.format_selector,
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"
        );
        assert_eq!(options.merge_output_format, Some(VideoFormat::Mp4));
    }

    #[test]
    fn test_webm_fallback_cascade() {
        let options = build_engine_options(
            &request(Mode::Video, Quality::High, VideoFormat::Webm),
            None,
            Path::new("outputs"),
        );
        assert_eq!(
            options.format_selector,
            "bestvideo[ext=webm]+bestaudio[ext=webm]/best[ext=webm]/best"
        );
    }

    #[test]
    fn test_mkv_has_no_container_preference() {
        let options = build_engine_options(
            &request(Mode::Video, Quality::High, VideoFormat::Mkv),
            None,
            Path::new("outputs"),
        );
        assert_eq!(options.format_selector, "bestvideo+bestaudio/best");
        assert_eq!(options.merge_output_format, Some(VideoFormat::Mkv));
    }

    #[test]
    fn test_video_requests_stream_copy() {
        let options = build_engine_options(
            &request(Mode::Video, Quality::High, VideoFormat::Mp4),
            None,
            Path::new("outputs"),
        );
        let args = options.to_args();
        let idx = args
            .iter()
            .position(|a| a == "--postprocessor-args")
            .unwrap();
        assert_eq!(args[idx + 1], "Merger:-c:v copy -c:a copy");
    }

    #[test]
    fn test_cookie_policy_rendering() {
        let with_file = build_engine_options(
            &request(Mode::Audio, Quality::High, VideoFormat::Mp4),
            Some(Path::new("/tmp/cookies.txt")),
            Path::new("outputs"),
        );
        let args = with_file.to_args();
        let idx = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[idx + 1], "/tmp/cookies.txt");

        let without = build_engine_options(
            &request(Mode::Audio, Quality::High, VideoFormat::Mp4),
            None,
            Path::new("outputs"),
        );
        assert!(without.to_args().iter().any(|a| a == "--no-cookies"));
    }

    #[test]
    fn test_output_template_targets_output_dir() {
        let options = build_engine_options(
            &request(Mode::Audio, Quality::High, VideoFormat::Mp4),
            None,
            Path::new("/srv/outputs"),
        );
        assert_eq!(options.output_template, "/srv/outputs/%(title)s.%(ext)s");
        assert!(options.restrict_filenames);
        assert!(options.windows_filenames);
    }
}
