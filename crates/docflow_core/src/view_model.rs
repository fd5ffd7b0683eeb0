use crate::{DownloadState, JobId, ProcessingOptions, UiState};

/// Which of the three panels is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Upload,
    Processing,
    Success,
}

impl Panel {
    /// Submitting already shows the processing panel, before the upload
    /// resolves. A failed job keeps it until the alert is dismissed.
    pub fn for_state(state: UiState) -> Self {
        match state {
            UiState::AwaitingSelection | UiState::Ready => Panel::Upload,
            UiState::Submitting | UiState::Tracking | UiState::Failed => Panel::Processing,
            UiState::Succeeded => Panel::Success,
        }
    }
}

/// Server-relative link for an artifact name.
pub fn download_path(name: &str) -> String {
    format!("/download/{name}")
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub ui_state: UiState,
    pub panel: Panel,
    pub file_name: Option<String>,
    pub options: ProcessingOptions,
    pub submit_enabled: bool,
    pub job_id: Option<JobId>,
    pub status_text: String,
    pub progress: u8,
    pub result_file: Option<String>,
    pub download_link: Option<String>,
    pub notice: Option<String>,
    pub history: Vec<HistoryRowView>,
    pub history_loading: bool,
    /// Why the latest history refresh failed, if it did.
    pub history_error: Option<String>,
    pub download: DownloadState,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub file_name: String,
    pub date: String,
    pub archive_name: String,
    pub download_link: String,
}
