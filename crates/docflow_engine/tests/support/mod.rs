#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use docflow_core::{HistoryEntry, JobId, Selection, StatusReport};
use docflow_engine::{
    ApiError, FailureKind, HistoryLoadError, JobApi, SubmissionError, TransientPollError,
};

/// Scripted `JobApi`. Status answers are served in order; once the script
/// runs out every poll answers "Processing".
#[derive(Default)]
pub struct FakeApi {
    pub submit_result: Mutex<Option<Result<JobId, SubmissionError>>>,
    statuses: Mutex<VecDeque<Result<StatusReport, TransientPollError>>>,
    status_delay: Option<Duration>,
    status_calls: AtomicUsize,
    download_calls: AtomicUsize,
    pub history: Mutex<Vec<HistoryEntry>>,
    pub artifact: Mutex<Vec<u8>>,
}

impl FakeApi {
    pub fn with_statuses(statuses: Vec<Result<StatusReport, TransientPollError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn accepting(self, job_id: &str) -> Self {
        *self.submit_result.lock().unwrap() = Some(Ok(JobId::new(job_id)));
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

pub fn network_error() -> TransientPollError {
    TransientPollError(ApiError {
        kind: FailureKind::Network,
        message: "connection refused".into(),
    })
}

#[async_trait::async_trait]
impl JobApi for FakeApi {
    async fn submit(&self, _selection: &Selection) -> Result<JobId, SubmissionError> {
        self.submit_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(JobId::new("job")))
    }

    async fn status(&self, _job_id: &JobId) -> Result<StatusReport, TransientPollError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(StatusReport::new("Processing", 50)))
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, HistoryLoadError> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn download(&self, _name: &str) -> Result<Bytes, ApiError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(self.artifact.lock().unwrap().clone()))
    }
}
