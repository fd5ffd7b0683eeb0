use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use docflow_core::{Effect, Msg};
use docflow_engine::{EngineError, EngineEvent, EngineHandle, EngineSettings};
use docflow_logging::{flow_debug, flow_info, flow_warn};

/// Executes effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings, msg_tx: mpsc::Sender<Msg>) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(settings)?;
        let runner = Self { engine, msg_tx };
        runner.spawn_event_loop();
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitJob {
                    generation,
                    selection,
                } => {
                    flow_info!(
                        "SubmitJob {} file={} strategy={} model={}",
                        generation,
                        selection.file.name,
                        selection.options.strategy,
                        selection.options.model
                    );
                    self.engine.submit(generation, selection);
                }
                Effect::StartPolling { generation, job_id } => {
                    self.engine.start_polling(generation, job_id);
                }
                Effect::StopPolling { generation } => {
                    self.engine.stop_polling(generation);
                }
                Effect::RefreshHistory { request } => {
                    self.engine.load_history(request);
                }
                Effect::ShowAlert { message } => {
                    // Terminal stand-in for a modal alert: print, then acknowledge.
                    eprintln!("Error: {message}");
                    let _ = self.msg_tx.send(Msg::AlertDismissed);
                }
                Effect::Download { name } => {
                    self.engine.download(name);
                }
            }
        }
    }

    fn spawn_event_loop(&self) {
        let engine = self.engine.clone();
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || loop {
            let Some(event) = engine.recv_timeout(Duration::from_millis(200)) else {
                continue;
            };
            if msg_tx.send(map_event(event)).is_err() {
                flow_debug!("Session loop closed; stopping event forwarding");
                break;
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Submitted { generation, result } => match result {
            Ok(job_id) => Msg::SubmissionAccepted { generation, job_id },
            Err(err) => Msg::SubmissionRejected {
                generation,
                message: err.user_message(),
            },
        },
        EngineEvent::StatusReport { generation, report } => {
            Msg::StatusReceived { generation, report }
        }
        EngineEvent::HistoryLoaded { request, result } => match result {
            Ok(entries) => Msg::HistoryLoaded { request, entries },
            Err(err) => {
                flow_warn!("Keeping previous history: {}", err);
                Msg::HistoryLoadFailed {
                    request,
                    reason: err.to_string(),
                }
            }
        },
        EngineEvent::Downloaded { name, result } => Msg::DownloadFinished {
            name,
            result: result
                .map(|saved| saved.path)
                .map_err(|err| err.to_string()),
        },
    }
}
