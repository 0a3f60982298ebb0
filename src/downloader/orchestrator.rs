// Download orchestrator - one job from URL to status string
//
// State machine per job:
//   Idle -> Validating -> Configuring -> Downloading -> Locating
//        -> {Succeeded, Failed}
//
// One job at a time per session; the command layer awaits the whole thing.
// Reentrancy is only prevented by the UI, and the title-prefix scan below
// is undefined when two jobs for similarly named media run at once.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use super::credentials::CookieStore;
use super::engine::ExtractionEngine;
use super::errors::{classify_engine_error, translate_engine_error, DownloadError};
use super::models::{AppConfig, JobRequest};
use super::options::build_engine_options;
use super::progress::{ProgressSink, ProgressTracker};

pub struct DownloadOrchestrator {
    config: AppConfig,
    store: CookieStore,
    engine: Box<dyn ExtractionEngine>,
}

impl DownloadOrchestrator {
    pub fn new(config: AppConfig, engine: Box<dyn ExtractionEngine>) -> Self {
        let store = CookieStore::new(config.env_file.clone());
        Self {
            config,
            store,
            engine,
        }
    }

    pub fn cookie_store(&self) -> &CookieStore {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one download job to completion. Returns the user-facing success
    /// string; every failure kind is flattened into `DownloadError`.
    pub async fn run(
        &self,
        request: &JobRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<String, DownloadError> {
        // Validating
        let url = request.url.trim();
        if url.is_empty() {
            return Err(DownloadError::InvalidInput);
        }
        eprintln!(
            "[Downloader] Downloading {} in {:?} mode with {:?} quality, audio format {}, video format {}",
            url,
            request.mode,
            request.quality,
            request.audio_format.as_str(),
            request.video_format.as_str(),
        );

        // Configuring
        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            DownloadError::FileResolution(format!("Failed to create output directory: {}", e))
        })?;

        let cookie_file = if self.config.use_cookies {
            eprintln!("[Cookies] Cookie use enabled, materializing cookie file");
            Some(self.store.materialize_temp_cookie_file()?)
        } else {
            None
        };
        let options = build_engine_options(request, cookie_file.as_deref(), &self.config.output_dir);

        // Downloading
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let tracker_sink = sink.clone();
        let tracker_task = tokio::spawn(async move {
            let mut tracker = ProgressTracker::new();
            while let Some(event) = events_rx.recv().await {
                tracker.observe(event, tracker_sink.as_ref());
            }
        });

        // Backed off slightly so coarse filesystem mtime granularity cannot
        // push a fresh download behind the watermark.
        let watermark = SystemTime::now() - Duration::from_secs(2);
        let started_at = OffsetDateTime::now_utc();
        let started = Instant::now();

        let result = self.engine.download(url, &options, events_tx).await;
        let _ = tracker_task.await;

        let report = match result {
            Ok(report) => report,
            Err(failure) => {
                let kind = classify_engine_error(&failure.message);
                eprintln!(
                    "[Downloader] {} failed ({}): {}",
                    self.engine.name(),
                    kind.description(),
                    failure.message
                );
                return Err(DownloadError::Engine(translate_engine_error(
                    &failure.message,
                )));
            }
        };

        let finished_at = OffsetDateTime::now_utc();
        eprintln!(
            "[Downloader] Download started at: {}",
            started_at.format(&Rfc3339).ok().unwrap_or_default()
        );
        eprintln!(
            "[Downloader] Download completed at: {}",
            finished_at.format(&Rfc3339).ok().unwrap_or_default()
        );
        eprintln!(
            "[Downloader] Download time: {:.2} seconds",
            started.elapsed().as_secs_f64()
        );

        // Locating
        let file = resolve_output(&self.config.output_dir, &report.title, watermark)?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        eprintln!("[Downloader] Downloaded file: {}", name);

        Ok(format!(
            "Successfully converted: {} saved to outputs folder",
            name
        ))
    }
}

/// Pick the job's output file: among entries modified at or after the
/// watermark whose name starts with the reported title, the most recently
/// modified one wins. Which file is returned when several share the prefix
/// is deliberately no stronger a guarantee than that.
pub fn resolve_output(
    output_dir: &Path,
    title: &str,
    watermark: SystemTime,
) -> Result<PathBuf, DownloadError> {
    let no_files = || {
        DownloadError::FileResolution(
            "Download failed - no files found in output directory".to_string(),
        )
    };

    let entries = fs::read_dir(output_dir).map_err(|_| no_files())?;

    let mut selected: Option<(PathBuf, SystemTime)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(title) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if modified < watermark {
            continue;
        }
        match &selected {
            Some((_, best)) if *best >= modified => {}
            _ => selected = Some((entry.path(), modified)),
        }
    }

    let (path, _) = selected.ok_or_else(no_files)?;
    if !path.exists() {
        return Err(DownloadError::FileResolution(
            "File download in output directory failed".to_string(),
        ));
    }
    Ok(path)
}
