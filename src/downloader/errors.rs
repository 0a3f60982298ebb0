// Error types for the download workflow

use std::fmt;

/// Errors raised by the credential store
#[derive(Debug, Clone)]
pub enum CredentialError {
    /// Cookie file could not be opened or read
    Read(String),

    /// Cookie or .env file could not be written
    Write(String),

    /// Blob does not look like a KEY="value" line
    Format(String),

    /// FIREFOX_COOKIES key absent or empty in the .env file
    Missing,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "Error reading cookie file: {}", msg),
            Self::Write(msg) => write!(f, "Error writing cookie file: {}", msg),
            Self::Format(msg) => write!(f, "Invalid cookie blob format: {}", msg),
            Self::Missing => write!(f, "FIREFOX_COOKIES not found in .env file"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Errors surfaced by one download job, flattened to a plain string
/// at the command boundary.
#[derive(Debug, Clone)]
pub enum DownloadError {
    /// Empty or missing URL
    InvalidInput,

    /// Credential materialization failed
    Credential(CredentialError),

    /// The extraction engine failed; message already translated
    Engine(String),

    /// No usable file found in the output directory
    FileResolution(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "Please enter a valid URL"),
            Self::Credential(e) => write!(f, "{}", e),
            Self::Engine(msg) => write!(f, "{}", msg),
            Self::FileResolution(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

impl From<CredentialError> for DownloadError {
    fn from(e: CredentialError) -> Self {
        Self::Credential(e)
    }
}

/// Marker yt-dlp puts in front of extractor errors.
const ENGINE_ERROR_MARKER: &str = "ERROR: [youtube]";

/// Flatten a raw engine error into the message shown to the user.
///
/// yt-dlp prefixes extractor failures with "ERROR: [youtube]"; everything
/// before the marker is noise (tracebacks, retry chatter). When the marker
/// is present the message is truncated to the text following it, with the
/// separating colon stripped. The boundary only emits strings, so this
/// substring heuristic stays isolated here.
pub fn translate_engine_error(raw: &str) -> String {
    match raw.find(ENGINE_ERROR_MARKER) {
        Some(idx) => raw[idx + ENGINE_ERROR_MARKER.len()..]
            .trim_start_matches(':')
            .trim()
            .to_string(),
        None => raw.trim().to_string(),
    }
}

/// Coarse classification of raw engine errors, for logging only.
/// The returned contract never exposes these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    VideoUnavailable,
    GeoBlocked,
    RateLimited,
    NetworkTimeout,
    UnsupportedUrl,
    Unknown,
}

impl EngineErrorKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::VideoUnavailable => "Video unavailable",
            Self::GeoBlocked => "Geographic restriction",
            Self::RateLimited => "Rate limited",
            Self::NetworkTimeout => "Network timeout",
            Self::UnsupportedUrl => "Unsupported URL",
            Self::Unknown => "Unknown engine error",
        }
    }
}

/// Analyze a raw engine error message and name the likely cause.
pub fn classify_engine_error(error: &str) -> EngineErrorKind {
    let lower = error.to_lowercase();

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
        || lower.contains("private video")
    {
        return EngineErrorKind::VideoUnavailable;
    }

    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geographic restriction")
    {
        return EngineErrorKind::GeoBlocked;
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
    {
        return EngineErrorKind::RateLimited;
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network unreachable")
    {
        return EngineErrorKind::NetworkTimeout;
    }

    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return EngineErrorKind::UnsupportedUrl;
    }

    EngineErrorKind::Unknown
}
