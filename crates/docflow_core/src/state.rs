use std::path::PathBuf;

use crate::view_model::{download_path, AppViewModel, HistoryRowView, Panel};
use crate::{
    JobId, JobPoller, PickedFile, PollOutcome, ProcessingOptions, Selection, SelectionStore,
    StatusReport,
};

/// Where the session is. Drives which panel is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    AwaitingSelection,
    Ready,
    Submitting,
    Tracking,
    Succeeded,
    Failed,
}

/// Marks one submission/poll cycle. Bumped on every submit and every reset so
/// that late responses from an earlier cycle can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Orders history refreshes. Refreshes can overlap, so an answer only lands
/// if it is newer than the list already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HistoryRequest(u64);

impl HistoryRequest {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for HistoryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "h{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub file_name: String,
    pub date: String,
    pub archive_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DownloadState {
    #[default]
    Idle,
    InFlight { name: String },
    Saved { name: String, path: PathBuf },
    Failed { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    ui: UiState,
    selection: SelectionStore,
    poller: Option<JobPoller>,
    generation: Generation,
    notice: Option<String>,
    history: Vec<HistoryEntry>,
    /// Request the shown list came from.
    history_shown: HistoryRequest,
    /// Latest refresh issued, while it has not answered yet.
    history_pending: Option<HistoryRequest>,
    history_latest: HistoryRequest,
    history_error: Option<String>,
    download: DownloadState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh session whose option defaults come from configuration.
    pub fn with_default_options(options: ProcessingOptions) -> Self {
        Self {
            selection: SelectionStore::with_defaults(options),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let job = self.poller.as_ref().map(JobPoller::job);
        let status_text = match (self.ui, job) {
            (UiState::Submitting, _) => "Uploading...".to_string(),
            (_, Some(job)) => job.status_text.clone(),
            (_, None) => String::new(),
        };
        let result_file = job.and_then(|job| job.result_file.clone());

        AppViewModel {
            ui_state: self.ui,
            panel: Panel::for_state(self.ui),
            file_name: self.selection.file_name().map(ToOwned::to_owned),
            options: self.selection.options().clone(),
            submit_enabled: self.ui == UiState::Ready,
            job_id: job.map(|job| job.job_id.clone()),
            status_text,
            progress: job.map_or(0, |job| job.progress),
            download_link: result_file.as_deref().map(download_path),
            result_file,
            notice: self.notice.clone(),
            history: self
                .history
                .iter()
                .map(|entry| HistoryRowView {
                    file_name: entry.file_name.clone(),
                    date: entry.date.clone(),
                    archive_name: entry.archive_name.clone(),
                    download_link: download_path(&entry.archive_name),
                })
                .collect(),
            history_loading: self.history_pending.is_some(),
            history_error: self.history_error.clone(),
            download: self.download.clone(),
            dirty: self.dirty,
        }
    }

    pub fn ui_state(&self) -> UiState {
        self.ui
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Returns whether state changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn select(&mut self, file: Option<PickedFile>) -> bool {
        if !self.selection.select(file) {
            return false;
        }
        self.ui = UiState::Ready;
        self.notice = None;
        self.mark_dirty();
        true
    }

    pub(crate) fn set_options(&mut self, options: ProcessingOptions) {
        self.selection.set_options(options);
        self.mark_dirty();
    }

    /// Ready -> Submitting. Opens a new generation for the submission.
    pub(crate) fn begin_submission(&mut self) -> Option<(Generation, Selection)> {
        let selection = self.selection.selection()?;
        self.generation = self.generation.next();
        self.ui = UiState::Submitting;
        self.mark_dirty();
        Some((self.generation, selection))
    }

    /// Submitting -> Tracking with a fresh job.
    pub(crate) fn start_tracking(&mut self, job_id: JobId) {
        self.poller = Some(JobPoller::new(job_id));
        self.ui = UiState::Tracking;
        self.mark_dirty();
    }

    pub(crate) fn apply_status(&mut self, report: StatusReport) -> Option<PollOutcome> {
        let outcome = self.poller.as_mut()?.apply(report)?;
        match &outcome {
            PollOutcome::Continue => {}
            PollOutcome::Succeeded { .. } => self.ui = UiState::Succeeded,
            PollOutcome::Failed { message } => {
                self.ui = UiState::Failed;
                self.notice = Some(message.clone());
            }
        }
        self.mark_dirty();
        Some(outcome)
    }

    /// Back to a clean slate: selection and job are dropped and the generation
    /// moves on so nothing in flight can touch the new session.
    pub(crate) fn reset_session(&mut self) {
        self.selection.clear();
        self.poller = None;
        self.generation = self.generation.next();
        self.ui = UiState::AwaitingSelection;
        self.mark_dirty();
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        if self.notice != notice {
            self.notice = notice;
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_history_refresh(&mut self) -> HistoryRequest {
        self.history_latest = self.history_latest.next();
        self.history_pending = Some(self.history_latest);
        self.mark_dirty();
        self.history_latest
    }

    /// Returns false when the answer is older than the list already shown.
    pub(crate) fn replace_history(
        &mut self,
        request: HistoryRequest,
        entries: Vec<HistoryEntry>,
    ) -> bool {
        self.settle_history_request(request);
        if request <= self.history_shown {
            return false;
        }
        self.history = entries;
        self.history_shown = request;
        if request == self.history_latest {
            self.history_error = None;
        }
        self.mark_dirty();
        true
    }

    /// The previous list stays visible. Only a failure of the latest refresh
    /// is surfaced.
    pub(crate) fn fail_history_refresh(&mut self, request: HistoryRequest, reason: String) {
        if request == self.history_latest {
            self.history_error = Some(reason);
            self.mark_dirty();
        }
        self.settle_history_request(request);
    }

    fn settle_history_request(&mut self, request: HistoryRequest) {
        if self.history_pending == Some(request) {
            self.history_pending = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_download(&mut self, name: String) -> bool {
        if matches!(self.download, DownloadState::InFlight { .. }) {
            return false;
        }
        self.download = DownloadState::InFlight { name };
        self.mark_dirty();
        true
    }

    pub(crate) fn finish_download(&mut self, name: String, result: Result<PathBuf, String>) {
        match &self.download {
            DownloadState::InFlight { name: current } if *current == name => {}
            _ => return,
        }
        self.download = match result {
            Ok(path) => DownloadState::Saved { name, path },
            Err(reason) => DownloadState::Failed { name, reason },
        };
        self.mark_dirty();
    }
}
