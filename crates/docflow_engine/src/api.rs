use std::time::Duration;

use bytes::Bytes;
use docflow_core::{HistoryEntry, JobId, Selection, StatusReport};
use docflow_logging::flow_debug;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::types::GENERIC_UPLOAD_FAILURE;
use crate::{ApiError, FailureKind, HistoryLoadError, SubmissionError, TransientPollError};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl ApiSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_download_bytes: 512 * 1024 * 1024,
        }
    }

    pub fn parse(base_url: &str) -> Result<Self, ApiError> {
        let url = Url::parse(base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        Ok(Self::new(url))
    }
}

/// The four endpoints of the processing service.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    /// `POST /upload`.
    async fn submit(&self, selection: &Selection) -> Result<JobId, SubmissionError>;

    /// `GET /status/{job_id}`.
    async fn status(&self, job_id: &JobId) -> Result<StatusReport, TransientPollError>;

    /// `GET /history`.
    async fn history(&self) -> Result<Vec<HistoryEntry>, HistoryLoadError>;

    /// `GET /download/{name}`.
    async fn download(&self, name: &str) -> Result<Bytes, ApiError>;
}

#[derive(Debug, Deserialize)]
struct UploadAccepted {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadRejected {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: String,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    result_file: Option<String>,
}

impl From<StatusPayload> for StatusReport {
    fn from(payload: StatusPayload) -> Self {
        StatusReport {
            status: payload.status,
            progress: payload.progress.round() as i64,
            result_file: payload.result_file,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryPayload {
    filename: String,
    date: String,
    zip_name: String,
}

impl From<HistoryPayload> for HistoryEntry {
    fn from(payload: HistoryPayload) -> Self {
        HistoryEntry {
            file_name: payload.filename,
            date: payload.date,
            archive_name: payload.zip_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestJobApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.settings.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ApiError::new(FailureKind::InvalidUrl, "base url cannot carry a path")
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn get_ok(&self, url: Url) -> Result<reqwest::Response, ApiError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn submit(&self, selection: &Selection) -> Result<JobId, SubmissionError> {
        let url = self.endpoint(&["upload"])?;
        let file_name = selection.file.name.clone();
        let part = Part::bytes(selection.file.bytes.clone())
            .file_name(file_name.clone())
            .mime_str(content_type_for(&file_name))
            .map_err(map_reqwest_error)?;
        let options = &selection.options;
        let form = Form::new()
            .part("file", part)
            .text("strategy", options.strategy.clone())
            .text("model", options.model.clone())
            .text("infer_tables", options.infer_tables.to_string())
            .text("extract_images", options.extract_images.to_string());

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.ok();
            let message = body
                .as_deref()
                .and_then(rejection_message)
                .unwrap_or_else(|| GENERIC_UPLOAD_FAILURE.to_string());
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let accepted: UploadAccepted = response.json().await.map_err(map_reqwest_error)?;
        Ok(JobId::new(accepted.job_id))
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, TransientPollError> {
        let url = self.endpoint(&["status", job_id.as_str()])?;
        let response = self.get_ok(url).await?;
        let payload: StatusPayload = response.json().await.map_err(map_reqwest_error)?;
        flow_debug!(
            "Status for {}: {:?} ({})",
            job_id,
            payload.status,
            payload.progress
        );
        Ok(payload.into())
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, HistoryLoadError> {
        let url = self.endpoint(&["history"])?;
        let response = self.get_ok(url).await?;
        let payload: Vec<HistoryPayload> = response.json().await.map_err(map_reqwest_error)?;
        Ok(payload.into_iter().map(HistoryEntry::from).collect())
    }

    async fn download(&self, name: &str) -> Result<Bytes, ApiError> {
        let url = self.endpoint(&["download", name])?;
        let response = self.get_ok(url).await?;
        let max_bytes = self.settings.max_download_bytes;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(bytes))
    }
}

fn rejection_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<UploadRejected>(body)
        .ok()
        .and_then(|payload| payload.error)
        .filter(|message| !message.is_empty())
}

/// Content type announced for the file part. Informational only; unknown
/// extensions are still sent.
fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        _ => "application/octet-stream",
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
