// Extraction engine boundary - yt-dlp behind a trait
//
// The engine is a black box: given a URL and options, fetch and optionally
// transcode media, emit progress events, and report the canonical title.
// The production implementation drives the yt-dlp binary with a
// machine-readable progress template so byte counts come through exactly
// as the progress hooks report them.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

use super::options::EngineOptions;

/// Events mirrored from the engine's progress hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Downloading {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
    },
    Finished,
    Errored(String),
}

/// What the engine reports on success.
#[derive(Debug, Clone)]
pub struct EngineReport {
    /// Canonical media title, used to locate the output file
    pub title: String,
}

/// Raw engine failure; the orchestrator translates the message.
#[derive(Debug, Clone)]
pub struct EngineFailure {
    pub message: String,
}

impl EngineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EngineFailure {}

#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Fetch `url` with `options`, pushing progress events into `events`.
    /// Blocks (awaits) for the full download+transcode duration.
    async fn download(
        &self,
        url: &str,
        options: &EngineOptions,
        events: UnboundedSender<EngineEvent>,
    ) -> Result<EngineReport, EngineFailure>;
}

const PROGRESS_TAG: &str = "YF_PROGRESS";
const TITLE_TAG: &str = "YF_TITLE";

lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(
        r"^YF_PROGRESS\|(\w+)\|(\S+)\|(\S+)\|(\S+)$"
    )
    .unwrap();
}

/// A parsed stdout line from the yt-dlp process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    Progress(EngineEvent),
    Title(String),
}

/// Parse one stdout line. Lines that are neither tagged progress nor the
/// tagged title (ffmpeg chatter, blank lines) yield None.
pub fn parse_engine_line(line: &str) -> Option<EngineLine> {
    if let Some(rest) = line.strip_prefix(TITLE_TAG) {
        let title = rest.strip_prefix('|').unwrap_or(rest).trim();
        if title.is_empty() {
            return None;
        }
        return Some(EngineLine::Title(title.to_string()));
    }

    let caps = PROGRESS_RE.captures(line)?;
    let status = caps.get(1)?.as_str();
    match status {
        "downloading" => {
            let downloaded = parse_bytes(caps.get(2)?.as_str()).unwrap_or(0);
            let total =
                parse_bytes(caps.get(3)?.as_str()).or_else(|| parse_bytes(caps.get(4)?.as_str()));
            Some(EngineLine::Progress(EngineEvent::Downloading {
                downloaded_bytes: downloaded,
                total_bytes: total,
            }))
        }
        "finished" => Some(EngineLine::Progress(EngineEvent::Finished)),
        "error" => Some(EngineLine::Progress(EngineEvent::Errored(
            "download hook reported an error".to_string(),
        ))),
        _ => None,
    }
}

/// Byte counts come through as integers, floats (estimates), or "NA".
fn parse_bytes(raw: &str) -> Option<u64> {
    if raw == "NA" || raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().map(|v| v as u64)
}

/// Find the yt-dlp executable in common install locations, then PATH.
pub fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
    ];

    for path in common_paths {
        if std::path::Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = std::process::Command::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    // Last resort: hope it's in PATH
    "yt-dlp".to_string()
}

/// Production engine wrapping the yt-dlp binary.
pub struct YtDlpEngine {
    binary: String,
}

impl YtDlpEngine {
    pub fn new() -> Self {
        Self {
            binary: find_ytdlp(),
        }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(
        &self,
        url: &str,
        options: &EngineOptions,
        events: UnboundedSender<EngineEvent>,
    ) -> Result<EngineReport, EngineFailure> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(options.to_args())
            .arg("--newline")
            .arg("--progress")
            .arg("--progress-template")
            .arg(format!(
                "download:{}|%(progress.status)s|%(progress.downloaded_bytes|0)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s",
                PROGRESS_TAG
            ))
            .arg("--no-simulate")
            .arg("--print")
            .arg(format!("{}|%(title)s", TITLE_TAG))
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| EngineFailure::new(format!("Failed to start yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineFailure::new("Failed to capture yt-dlp stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineFailure::new("Failed to capture yt-dlp stderr"))?;

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut collected = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                collected.push(line);
            }
            collected.join("\n")
        });

        let mut title: Option<String> = None;
        let mut stdout_lines = BufReader::new(stdout).lines();
        while let Some(line) = stdout_lines
            .next_line()
            .await
            .map_err(|e| EngineFailure::new(format!("Failed to read yt-dlp output: {}", e)))?
        {
            match parse_engine_line(&line) {
                Some(EngineLine::Progress(event)) => {
                    let _ = events.send(event);
                }
                Some(EngineLine::Title(t)) => title = Some(t),
                None => {}
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineFailure::new(format!("Failed to wait for yt-dlp: {}", e)))?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let _ = events.send(EngineEvent::Errored(
                stderr_text
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("yt-dlp exited with an error")
                    .to_string(),
            ));
            return Err(EngineFailure::new(stderr_text));
        }

        let title =
            title.ok_or_else(|| EngineFailure::new("yt-dlp did not report a media title"))?;
        Ok(EngineReport { title })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_downloading_line() {
        let line = "YF_PROGRESS|downloading|1048576|4194304|NA";
        assert_eq!(
            parse_engine_line(line),
            Some(EngineLine::Progress(EngineEvent::Downloading {
                downloaded_bytes: 1_048_576,
                total_bytes: Some(4_194_304),
            }))
        );
    }

    #[test]
    fn test_parse_estimate_fallback() {
        let line = "YF_PROGRESS|downloading|512|NA|2048.5";
        assert_eq!(
            parse_engine_line(line),
            Some(EngineLine::Progress(EngineEvent::Downloading {
                downloaded_bytes: 512,
                total_bytes: Some(2048),
            }))
        );
    }

    #[test]
    fn test_parse_unknown_total() {
        let line = "YF_PROGRESS|downloading|512|NA|NA";
        assert_eq!(
            parse_engine_line(line),
            Some(EngineLine::Progress(EngineEvent::Downloading {
                downloaded_bytes: 512,
                total_bytes: None,
            }))
        );
    }

    #[test]
    fn test_parse_finished_line() {
        let line = "YF_PROGRESS|finished|4194304|4194304|NA";
        assert_eq!(
            parse_engine_line(line),
            Some(EngineLine::Progress(EngineEvent::Finished))
        );
    }

    #[test]
    fn test_parse_title_line() {
        let line = "YF_TITLE|My Video | Part 2";
        assert_eq!(
            parse_engine_line(line),
            Some(EngineLine::Title("My Video | Part 2".to_string()))
        );
    }

    #[test]
    fn test_ffmpeg_chatter_ignored() {
        assert_eq!(parse_engine_line("[Merger] Merging formats"), None);
        assert_eq!(parse_engine_line(""), None);
    }
}
