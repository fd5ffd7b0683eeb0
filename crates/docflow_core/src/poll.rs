//! Job status classification and the per-job poll state machine.

/// Status label the server reports once the result archive is ready.
pub const COMPLETE_LABEL: &str = "Complete";
/// Any status label starting with this prefix is a terminal failure.
pub const ERROR_PREFIX: &str = "Error";

/// Server-assigned job identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One successful answer to a status request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: String,
    /// Raw progress as sent by the server; not yet clamped.
    pub progress: i64,
    pub result_file: Option<String>,
}

impl StatusReport {
    pub fn new(status: impl Into<String>, progress: i64) -> Self {
        Self {
            status: status.into(),
            progress,
            result_file: None,
        }
    }

    pub fn with_result_file(mut self, result_file: impl Into<String>) -> Self {
        self.result_file = Some(result_file.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Complete,
    Error(String),
}

impl JobStatus {
    pub fn from_label(label: &str) -> Self {
        if label == COMPLETE_LABEL {
            JobStatus::Complete
        } else if label.starts_with(ERROR_PREFIX) {
            JobStatus::Error(label.to_string())
        } else if label == "Queued" || label == "Unknown" {
            JobStatus::Pending
        } else {
            JobStatus::Processing
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error(_))
    }
}

/// What the poll loop should do after a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    Succeeded { result_file: Option<String> },
    Failed { message: String },
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Continue)
    }
}

/// Classifies a report by its status label alone.
///
/// The `"Error"` check is a plain prefix match, so a progress label that
/// happens to start with "Error" is treated as fatal.
pub fn classify(report: &StatusReport) -> PollOutcome {
    match JobStatus::from_label(&report.status) {
        JobStatus::Complete => PollOutcome::Succeeded {
            result_file: report.result_file.clone(),
        },
        JobStatus::Error(message) => PollOutcome::Failed { message },
        JobStatus::Pending | JobStatus::Processing => PollOutcome::Continue,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Polling,
    Succeeded,
    Failed,
}

/// The job as the client sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    pub status_text: String,
    pub progress: u8,
    pub result_file: Option<String>,
}

impl Job {
    fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            status_text: String::new(),
            progress: 0,
            result_file: None,
        }
    }

    /// Progress is clamped to 0..=100 and never moves backwards.
    fn apply_progress(&mut self, raw: i64) {
        let clamped = raw.clamp(0, 100) as u8;
        self.progress = self.progress.max(clamped);
    }
}

/// Tracks one job from its first poll to a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPoller {
    job: Job,
    phase: PollPhase,
}

impl JobPoller {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job: Job::new(job_id),
            phase: PollPhase::Polling,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Applies a report. Returns `None` once the poller is terminal; terminal
    /// states are never left.
    pub fn apply(&mut self, report: StatusReport) -> Option<PollOutcome> {
        if self.phase != PollPhase::Polling {
            return None;
        }

        let outcome = classify(&report);
        self.job.status = JobStatus::from_label(&report.status);
        self.job.status_text = report.status;
        match &outcome {
            PollOutcome::Continue => {
                self.job.apply_progress(report.progress);
            }
            PollOutcome::Succeeded { result_file } => {
                self.job.apply_progress(report.progress);
                self.job.result_file = result_file.clone();
                self.phase = PollPhase::Succeeded;
            }
            PollOutcome::Failed { .. } => {
                self.phase = PollPhase::Failed;
            }
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_to_statuses() {
        assert_eq!(JobStatus::from_label("Queued"), JobStatus::Pending);
        assert_eq!(JobStatus::from_label("Unknown"), JobStatus::Pending);
        assert_eq!(
            JobStatus::from_label("Partitioning PDF (hi_res)... this may take time"),
            JobStatus::Processing
        );
        assert_eq!(JobStatus::from_label("Complete"), JobStatus::Complete);
        assert_eq!(
            JobStatus::from_label("Error: boom"),
            JobStatus::Error("Error: boom".into())
        );
        // Exact match only for completion.
        assert_eq!(JobStatus::from_label("complete"), JobStatus::Processing);
    }

    #[test]
    fn non_terminal_labels_keep_polling() {
        let mut poller = JobPoller::new(JobId::new("abc"));
        for (label, progress) in [("Queued", 0), ("Initializing...", 10), ("Formatting Output...", 60)] {
            let outcome = poller.apply(StatusReport::new(label, progress));
            assert_eq!(outcome, Some(PollOutcome::Continue));
            assert_eq!(poller.phase(), PollPhase::Polling);
            assert_eq!(poller.job().status_text, label);
            assert_eq!(i64::from(poller.job().progress), progress);
        }
    }

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let mut poller = JobPoller::new(JobId::new("abc"));
        poller.apply(StatusReport::new("Working", 60));
        poller.apply(StatusReport::new("Working", 20));
        assert_eq!(poller.job().progress, 60);
        poller.apply(StatusReport::new("Working", 250));
        assert_eq!(poller.job().progress, 100);
    }

    #[test]
    fn terminal_phase_ignores_later_reports() {
        let mut poller = JobPoller::new(JobId::new("abc"));
        let outcome = poller.apply(StatusReport::new("Error: corrupt file", 0));
        assert_eq!(
            outcome,
            Some(PollOutcome::Failed {
                message: "Error: corrupt file".into()
            })
        );
        assert_eq!(poller.apply(StatusReport::new("Complete", 100)), None);
        assert_eq!(poller.phase(), PollPhase::Failed);
    }

    #[test]
    fn completion_records_result_file() {
        let mut poller = JobPoller::new(JobId::new("abc"));
        let outcome = poller.apply(StatusReport::new("Complete", 100).with_result_file("r.zip"));
        assert!(outcome.unwrap().is_terminal());
        assert_eq!(poller.job().result_file.as_deref(), Some("r.zip"));
        assert_eq!(poller.job().progress, 100);
    }
}
