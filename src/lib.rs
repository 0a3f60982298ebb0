mod commands;
mod downloader;

use commands::{
    download_media, get_app_settings, import_cookie_file, open_outputs_folder, AppState,
};
use downloader::{AppConfig, DownloadOrchestrator, YtDlpEngine};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let config = AppConfig::load();
    eprintln!(
        "[App] Output directory: {} (cookies: {})",
        config.output_dir.display(),
        config.use_cookies
    );
    let orchestrator = DownloadOrchestrator::new(config, Box::new(YtDlpEngine::new()));

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(AppState { orchestrator })
        .invoke_handler(tauri::generate_handler![
            download_media,
            import_cookie_file,
            open_outputs_folder,
            get_app_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
