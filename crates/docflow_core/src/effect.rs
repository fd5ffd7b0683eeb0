use crate::{Generation, HistoryRequest, JobId, Selection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the creation request for this selection.
    SubmitJob {
        generation: Generation,
        selection: Selection,
    },
    /// Start the fixed-interval status poll for a job, replacing any running cycle.
    StartPolling { generation: Generation, job_id: JobId },
    /// Stop the poll cycle started for `generation`, if it is still running.
    StopPolling { generation: Generation },
    /// Fetch the history list; answered with the same `request` token.
    RefreshHistory { request: HistoryRequest },
    /// Show a message the user must acknowledge; answered with `Msg::AlertDismissed`.
    ShowAlert { message: String },
    /// Fetch `/download/{name}` and save it locally.
    Download { name: String },
}
