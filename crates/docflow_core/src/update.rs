use docflow_logging::{flow_debug, flow_info};

use crate::{AppState, Effect, Generation, Msg, PollOutcome, UiState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => {
            let request = state.begin_history_refresh();
            vec![Effect::RefreshHistory { request }]
        }
        Msg::FileSelected(file) => {
            if accepts_selection(state.ui_state()) {
                state.select(file);
            }
            Vec::new()
        }
        Msg::OptionsChanged(options) => {
            if accepts_selection(state.ui_state()) {
                state.set_options(options);
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            // Only one submission at a time: anything but Ready is a no-op,
            // whatever the rendered control allowed.
            if state.ui_state() != UiState::Ready {
                return (state, Vec::new());
            }
            match state.begin_submission() {
                Some((generation, selection)) => {
                    flow_info!(
                        "Submitting {} ({} bytes) as {}",
                        selection.file.name,
                        selection.file.bytes.len(),
                        generation
                    );
                    vec![Effect::SubmitJob {
                        generation,
                        selection,
                    }]
                }
                None => Vec::new(),
            }
        }
        Msg::SubmissionAccepted { generation, job_id } => {
            if !is_live(&state, generation, UiState::Submitting) {
                return (state, Vec::new());
            }
            flow_info!("Job {} accepted for {}", job_id, generation);
            state.start_tracking(job_id.clone());
            vec![Effect::StartPolling { generation, job_id }]
        }
        Msg::SubmissionRejected {
            generation,
            message,
        } => {
            if !is_live(&state, generation, UiState::Submitting) {
                return (state, Vec::new());
            }
            // Undo the optimistic switch to the processing panel.
            state.reset_session();
            state.set_notice(Some(message.clone()));
            vec![Effect::ShowAlert { message }]
        }
        Msg::StatusReceived { generation, report } => {
            if !is_live(&state, generation, UiState::Tracking) {
                return (state, Vec::new());
            }
            match state.apply_status(report) {
                Some(PollOutcome::Continue) | None => Vec::new(),
                Some(PollOutcome::Succeeded { .. }) => {
                    let request = state.begin_history_refresh();
                    vec![
                        Effect::StopPolling { generation },
                        Effect::RefreshHistory { request },
                    ]
                }
                Some(PollOutcome::Failed { message }) => vec![
                    Effect::StopPolling { generation },
                    Effect::ShowAlert { message },
                ],
            }
        }
        Msg::AlertDismissed => {
            if state.ui_state() == UiState::Failed {
                state.reset_session();
            }
            Vec::new()
        }
        Msg::ResetClicked => {
            let previous = state.generation();
            let was_tracking = state.ui_state() == UiState::Tracking;
            state.reset_session();
            state.set_notice(None);
            if was_tracking {
                vec![Effect::StopPolling {
                    generation: previous,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::HistoryLoaded { request, entries } => {
            if !state.replace_history(request, entries) {
                flow_debug!("Dropping history answer {} older than the shown list", request);
            }
            Vec::new()
        }
        Msg::HistoryLoadFailed { request, reason } => {
            state.fail_history_refresh(request, reason);
            Vec::new()
        }
        Msg::DownloadRequested { name } => {
            if state.begin_download(name.clone()) {
                vec![Effect::Download { name }]
            } else {
                Vec::new()
            }
        }
        Msg::DownloadFinished { name, result } => {
            state.finish_download(name, result);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn accepts_selection(ui: UiState) -> bool {
    matches!(ui, UiState::AwaitingSelection | UiState::Ready)
}

/// A response only counts if it belongs to the current generation and the
/// session is still in the state that asked for it.
fn is_live(state: &AppState, generation: Generation, expected: UiState) -> bool {
    if !state.is_current(generation) || state.ui_state() != expected {
        flow_debug!(
            "Dropping response for {} (current {}, state {:?})",
            generation,
            state.generation(),
            state.ui_state()
        );
        return false;
    }
    true
}
