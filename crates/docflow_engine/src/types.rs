use std::fmt;
use std::path::PathBuf;

use docflow_core::{Generation, HistoryEntry, HistoryRequest, JobId, StatusReport};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        generation: Generation,
        result: Result<JobId, SubmissionError>,
    },
    /// A successful status answer. Failed polls are logged, not reported.
    StatusReport {
        generation: Generation,
        report: StatusReport,
    },
    HistoryLoaded {
        request: HistoryRequest,
        result: Result<Vec<HistoryEntry>, HistoryLoadError>,
    },
    Downloaded {
        name: String,
        result: Result<SavedArtifact, DownloadError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub byte_len: u64,
    pub sha256: String,
}

/// Transport-level failure of one request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Message used when a rejected upload carries no readable `error` field.
pub const GENERIC_UPLOAD_FAILURE: &str = "Upload failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The server answered non-2xx; `message` is its `error` field or the
    /// generic fallback.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Transport(#[from] ApiError),
}

impl SubmissionError {
    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Rejected { message, .. } => message.clone(),
            SubmissionError::Transport(err) => err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status request failed: {0}")]
pub struct TransientPollError(#[from] pub ApiError);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("history load failed: {0}")]
pub struct HistoryLoadError(#[from] pub ApiError);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("refusing artifact name {0:?}")]
    InvalidName(String),
    #[error(transparent)]
    Transport(#[from] ApiError),
    #[error("could not save artifact: {0}")]
    Persist(String),
}
