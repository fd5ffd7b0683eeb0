use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use docflow_core::{Generation, HistoryRequest, JobId, Selection};
use docflow_logging::{flow_debug, flow_info, flow_warn};
use thiserror::Error;

use crate::api::{ApiSettings, JobApi, ReqwestJobApi};
use crate::persist::{is_safe_artifact_name, ArtifactStore};
use crate::poller::{spawn_poller, PollHandle, DEFAULT_POLL_INTERVAL};
use crate::{ApiError, DownloadError, EngineEvent};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub poll_interval: Duration,
    pub output_dir: PathBuf,
}

impl EngineSettings {
    pub fn new(api: ApiSettings, output_dir: PathBuf) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
            output_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

enum EngineCommand {
    Submit {
        generation: Generation,
        selection: Selection,
    },
    StartPolling {
        generation: Generation,
        job_id: JobId,
    },
    StopPolling {
        generation: Generation,
    },
    LoadHistory {
        request: HistoryRequest,
    },
    Download {
        name: String,
    },
}

/// Front door to the IO side. Commands go in, `EngineEvent`s come out; all
/// requests run on a private tokio runtime.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let api = Arc::new(ReqwestJobApi::new(settings.api.clone())?);
        Self::with_api(api, settings)
    }

    /// Runs against any `JobApi`, e.g. a scripted one in tests.
    pub fn with_api(api: Arc<dyn JobApi>, settings: EngineSettings) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let store = ArtifactStore::new(settings.output_dir.clone());
        let poll_interval = settings.poll_interval;

        thread::spawn(move || {
            let _guard = runtime.enter();
            // At most one poll cycle exists at any time.
            let mut active_poll: Option<PollHandle> = None;

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { generation, job_id } => {
                        if let Some(previous) = active_poll.take() {
                            flow_debug!("Replacing poll cycle {}", previous.generation());
                            previous.stop();
                        }
                        active_poll = Some(spawn_poller(
                            api.clone(),
                            generation,
                            job_id,
                            poll_interval,
                            event_tx.clone(),
                        ));
                    }
                    EngineCommand::StopPolling { generation } => {
                        if active_poll
                            .as_ref()
                            .is_some_and(|handle| handle.generation() == generation)
                        {
                            if let Some(handle) = active_poll.take() {
                                handle.stop();
                            }
                        }
                    }
                    other => {
                        let api = api.clone();
                        let store = store.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            handle_command(api.as_ref(), &store, other, event_tx).await;
                        });
                    }
                }
            }

            if let Some(handle) = active_poll.take() {
                handle.stop();
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn submit(&self, generation: Generation, selection: Selection) {
        self.send(EngineCommand::Submit {
            generation,
            selection,
        });
    }

    pub fn start_polling(&self, generation: Generation, job_id: JobId) {
        self.send(EngineCommand::StartPolling { generation, job_id });
    }

    pub fn stop_polling(&self, generation: Generation) {
        self.send(EngineCommand::StopPolling { generation });
    }

    pub fn load_history(&self, request: HistoryRequest) {
        self.send(EngineCommand::LoadHistory { request });
    }

    pub fn download(&self, name: impl Into<String>) {
        self.send(EngineCommand::Download { name: name.into() });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Blocks for up to `timeout` waiting for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            flow_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(
    api: &dyn JobApi,
    store: &ArtifactStore,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Submit {
            generation,
            selection,
        } => {
            let result = api.submit(&selection).await;
            match &result {
                Ok(job_id) => flow_info!("Upload accepted as job {} ({})", job_id, generation),
                Err(err) => flow_warn!("Upload rejected ({}): {}", generation, err),
            }
            EngineEvent::Submitted { generation, result }
        }
        EngineCommand::LoadHistory { request } => {
            let result = api.history().await;
            if let Err(err) = &result {
                flow_warn!("{} ({})", err, request);
            }
            EngineEvent::HistoryLoaded { request, result }
        }
        EngineCommand::Download { name } => {
            let result = download(api, store, &name).await;
            match &result {
                Ok(saved) => flow_info!(
                    "Saved {} to {:?} ({} bytes, sha256 {})",
                    name,
                    saved.path,
                    saved.byte_len,
                    saved.sha256
                ),
                Err(err) => flow_warn!("Download of {} failed: {}", name, err),
            }
            EngineEvent::Downloaded { name, result }
        }
        EngineCommand::StartPolling { .. } | EngineCommand::StopPolling { .. } => return,
    };
    let _ = event_tx.send(event);
}

async fn download(
    api: &dyn JobApi,
    store: &ArtifactStore,
    name: &str,
) -> Result<crate::SavedArtifact, DownloadError> {
    if !is_safe_artifact_name(name) {
        return Err(DownloadError::InvalidName(name.to_string()));
    }
    let bytes = api.download(name).await?;
    store
        .save(name, &bytes)
        .map_err(|err| DownloadError::Persist(err.to_string()))
}
