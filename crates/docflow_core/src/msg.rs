use std::path::PathBuf;

use crate::{Generation, HistoryEntry, HistoryRequest, JobId, PickedFile, ProcessingOptions, StatusReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The front end is up; triggers the initial history load.
    Started,
    /// User picked a file (or dismissed the picker with nothing).
    FileSelected(Option<PickedFile>),
    /// User changed the processing options.
    OptionsChanged(ProcessingOptions),
    /// User clicked the submit control.
    SubmitClicked,
    /// The creation request returned a job id.
    SubmissionAccepted { generation: Generation, job_id: JobId },
    /// The creation request failed; `message` is shown to the user verbatim.
    SubmissionRejected { generation: Generation, message: String },
    /// A status poll answered successfully.
    StatusReceived {
        generation: Generation,
        report: StatusReport,
    },
    /// User acknowledged an alert.
    AlertDismissed,
    /// User asked for a fresh session.
    ResetClicked,
    HistoryLoaded {
        request: HistoryRequest,
        entries: Vec<HistoryEntry>,
    },
    HistoryLoadFailed {
        request: HistoryRequest,
        reason: String,
    },
    /// User asked to save an artifact (a job result or a history archive).
    DownloadRequested { name: String },
    DownloadFinished {
        name: String,
        result: Result<PathBuf, String>,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
