//! Docflow engine: HTTP client, poll loop and effect execution.
mod api;
mod engine;
mod persist;
mod poller;
mod types;

pub use api::{ApiSettings, JobApi, ReqwestJobApi};
pub use engine::{EngineError, EngineHandle, EngineSettings};
pub use persist::{ensure_output_dir, is_safe_artifact_name, ArtifactStore, PersistError};
pub use poller::{spawn_poller, PollHandle, DEFAULT_POLL_INTERVAL};
pub use types::{
    ApiError, DownloadError, EngineEvent, FailureKind, HistoryLoadError, SavedArtifact,
    SubmissionError, TransientPollError, GENERIC_UPLOAD_FAILURE,
};
