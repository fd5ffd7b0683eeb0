//! Fixed-interval status polling for one job.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use docflow_core::{classify, Generation, JobId};
use docflow_logging::{flow_debug, flow_info, flow_warn};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, JobApi};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Stop handle for a running poll cycle.
#[derive(Debug)]
pub struct PollHandle {
    generation: Generation,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Prevents further ticks. A request already in flight is abandoned and
    /// its answer is never reported.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// True once the loop has exited, either stopped or after a terminal report.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns the poll loop on the current tokio runtime.
///
/// The first request goes out one `period` after the call. Every successful
/// answer is sent as `EngineEvent::StatusReport`; the loop ends by itself
/// after a terminal one. Failed requests are logged and retried on the next
/// tick, indefinitely.
pub fn spawn_poller(
    api: Arc<dyn JobApi>,
    generation: Generation,
    job_id: JobId,
    period: Duration,
    events: mpsc::Sender<EngineEvent>,
) -> PollHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        flow_info!("Polling job {} every {:?} ({})", job_id, period, generation);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = token.cancelled() => break,
                result = api.status(&job_id) => result,
            };

            let report = match result {
                Ok(report) => report,
                Err(err) => {
                    flow_warn!("Poll for job {} failed, retrying: {}", job_id, err);
                    continue;
                }
            };

            let terminal = classify(&report).is_terminal();
            if events
                .send(EngineEvent::StatusReport { generation, report })
                .is_err()
            {
                break;
            }
            if terminal {
                flow_debug!("Job {} reached a terminal status; poll loop done", job_id);
                break;
            }
        }
    });

    PollHandle {
        generation,
        cancel,
        task,
    }
}
