// Download workflow - credential store, option builder, engine boundary,
// progress tracking, and the per-job orchestrator

pub mod credentials;
pub mod engine;
pub mod errors;
pub mod models;
pub mod options;
pub mod orchestrator;
pub mod progress;

pub use engine::{ExtractionEngine, YtDlpEngine};
pub use errors::{CredentialError, DownloadError};
pub use models::{AppConfig, DownloadProgress, JobRequest};
pub use orchestrator::DownloadOrchestrator;
pub use progress::ProgressSink;
