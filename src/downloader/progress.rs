// Progress tracking - single-writer bridge from engine events to the UI
//
// The orchestrator owns one tracker per job. Engine events arrive on a
// channel; the tracker folds them into a byte-count indicator and pushes
// updates into whatever sink the caller subscribed. Rendering concerns
// (Tauri events, test buffers) stay behind the sink trait.

use super::engine::EngineEvent;
use super::models::DownloadProgress;

/// Where progress updates go. Implemented by the Tauri event emitter in
/// the command layer and by buffering sinks in tests.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, update: DownloadProgress);
}

/// Byte-count indicator for one job. Single writer; advances by the delta
/// between each newly reported count and the last observed one, and adopts
/// the total when the engine first knows it.
pub struct ProgressTracker {
    downloaded_bytes: u64,
    total_bytes: Option<u64>,
    closed: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            downloaded_bytes: 0,
            total_bytes: None,
            closed: false,
        }
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Fold one engine event into the indicator and notify the sink.
    pub fn observe(&mut self, event: EngineEvent, sink: &dyn ProgressSink) {
        match event {
            EngineEvent::Downloading {
                downloaded_bytes,
                total_bytes,
            } => {
                if self.closed {
                    // A new file started (e.g. audio after video); reopen.
                    self.closed = false;
                    self.downloaded_bytes = 0;
                    self.total_bytes = None;
                }
                if let Some(total) = total_bytes {
                    self.total_bytes = Some(total);
                }
                let delta = downloaded_bytes.saturating_sub(self.downloaded_bytes);
                self.downloaded_bytes += delta;

                sink.progress(DownloadProgress {
                    downloaded_bytes: self.downloaded_bytes,
                    total_bytes: self.total_bytes,
                    status: "downloading".to_string(),
                });
            }
            EngineEvent::Finished => {
                self.closed = true;
                sink.progress(DownloadProgress {
                    downloaded_bytes: self.downloaded_bytes,
                    total_bytes: self.total_bytes,
                    status: "finished".to_string(),
                });
            }
            EngineEvent::Errored(message) => {
                // Logged only; job failure is decided by the engine result.
                self.closed = true;
                eprintln!("[Downloader] Download error: {}", message);
            }
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
