// Tauri command surface - thin glue between the webview and the orchestrator

use std::sync::Arc;

use serde::Serialize;
use tauri::{AppHandle, Emitter, State};
use tauri_plugin_dialog::DialogExt;

use crate::downloader::{
    credentials, DownloadOrchestrator, DownloadProgress, JobRequest, ProgressSink,
};

pub struct AppState {
    pub orchestrator: DownloadOrchestrator,
}

/// Forwards progress updates to the webview as "download-progress" events.
struct EventEmitterSink {
    app_handle: AppHandle,
}

impl ProgressSink for EventEmitterSink {
    fn progress(&self, update: DownloadProgress) {
        let _ = self.app_handle.emit("download-progress", update);
    }
}

/// Settings snapshot for UI display.
#[derive(Debug, Clone, Serialize)]
pub struct AppSettings {
    pub output_dir: String,
    pub cookies_enabled: bool,
}

// Run one download job. Blocks until the download and transcode finish;
// the UI disables the button while a job is in flight.
#[tauri::command]
pub async fn download_media(
    request: JobRequest,
    state: State<'_, AppState>,
    app_handle: AppHandle,
) -> Result<String, String> {
    let sink = Arc::new(EventEmitterSink { app_handle });
    state
        .orchestrator
        .run(&request, sink)
        .await
        .map_err(|e| e.to_string())
}

// Pick a Netscape cookie file, fold it into the blob form, and persist it.
#[tauri::command]
pub async fn import_cookie_file(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let picked = app_handle
        .dialog()
        .file()
        .add_filter("Cookie files", &["txt"])
        .blocking_pick_file();

    let Some(file_path) = picked else {
        return Err("No cookie file selected".to_string());
    };
    let path = file_path.into_path().map_err(|e| e.to_string())?;

    let blob = credentials::blob_from_cookie_file(&path).map_err(|e| e.to_string())?;
    state
        .orchestrator
        .cookie_store()
        .persist_blob(&blob)
        .map_err(|e| e.to_string())?;

    eprintln!("[Cookies] Imported cookie file: {}", path.display());
    Ok("Cookies imported".to_string())
}

// Reveal the outputs folder in the system file manager.
#[tauri::command]
pub async fn open_outputs_folder(state: State<'_, AppState>) -> Result<(), String> {
    let dir = state.orchestrator.config().output_dir.clone();
    std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    tauri_plugin_opener::open_path(dir, None::<&str>).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_app_settings(state: State<'_, AppState>) -> Result<AppSettings, String> {
    let config = state.orchestrator.config();
    Ok(AppSettings {
        output_dir: config.output_dir.to_string_lossy().to_string(),
        cookies_enabled: config.use_cookies,
    })
}
