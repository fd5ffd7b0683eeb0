//! Docflow core: pure session state machine and view-model helpers.
mod effect;
mod msg;
mod poll;
mod selection;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use poll::{
    classify, Job, JobId, JobPoller, JobStatus, PollOutcome, PollPhase, StatusReport,
    COMPLETE_LABEL, ERROR_PREFIX,
};
pub use selection::{PickedFile, ProcessingOptions, Selection, SelectionStore};
pub use state::{AppState, DownloadState, Generation, HistoryEntry, HistoryRequest, UiState};
pub use update::update;
pub use view_model::{download_path, AppViewModel, HistoryRowView, Panel};
