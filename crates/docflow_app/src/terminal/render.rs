use docflow_core::{AppViewModel, DownloadState, Panel, UiState};

const BAR_WIDTH: usize = 30;

/// Lines for the panel currently on screen.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    match view.panel {
        Panel::Upload => {
            match &view.file_name {
                Some(name) => lines.push(format!("Selected: {name}")),
                None => lines.push("Select a file to process".to_string()),
            }
            let options = &view.options;
            lines.push(format!(
                "Options: strategy={} model={} tables={} images={}",
                options.strategy, options.model, options.infer_tables, options.extract_images
            ));
            if view.submit_enabled {
                lines.push("[Start Processing]".to_string());
            }
            if let Some(notice) = &view.notice {
                lines.push(format!("Last error: {notice}"));
            }
        }
        Panel::Processing => {
            let label = match view.ui_state {
                UiState::Submitting => "Uploading",
                UiState::Failed => "Failed",
                _ => "Processing",
            };
            match &view.job_id {
                Some(job_id) => lines.push(format!("{label} job {job_id}")),
                None => lines.push(label.to_string()),
            }
            lines.push(format!(
                "{} {:>3}% {}",
                progress_bar(view.progress),
                view.progress,
                view.status_text
            ));
        }
        Panel::Success => {
            lines.push("Processing complete".to_string());
            if let Some(result_file) = &view.result_file {
                lines.push(format!("Result: {result_file}"));
            }
            if let Some(link) = &view.download_link {
                lines.push(format!("Download: {link}"));
            }
        }
    }

    match &view.download {
        DownloadState::Idle => {}
        DownloadState::InFlight { name } => lines.push(format!("Downloading {name}...")),
        DownloadState::Saved { path, .. } => lines.push(format!("Saved to {}", path.display())),
        DownloadState::Failed { name, reason } => {
            lines.push(format!("Download of {name} failed: {reason}"))
        }
    }

    lines
}

pub fn render_history(view: &AppViewModel) -> Vec<String> {
    let mut lines = if view.history.is_empty() && view.history_error.is_none() {
        vec!["History: (empty)".to_string()]
    } else {
        let mut lines = vec!["History:".to_string()];
        lines.extend(view.history.iter().map(|row| {
            format!(
                "  {}  {}  {}",
                row.date, row.file_name, row.download_link
            )
        }));
        lines
    };
    if let Some(reason) = &view.history_error {
        lines.push(format!("History unavailable: {reason}"));
    }
    lines
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_core::{
        update, AppState, Effect, HistoryEntry, HistoryRequest, JobId, Msg, PickedFile,
        StatusReport,
    };

    fn tracking_state() -> AppState {
        let (state, _) = update(
            AppState::new(),
            Msg::FileSelected(Some(PickedFile::new("report.pdf", b"x".to_vec()))),
        );
        let (state, _) = update(state, Msg::SubmitClicked);
        let generation = state.generation();
        let (state, _) = update(
            state,
            Msg::SubmissionAccepted {
                generation,
                job_id: JobId::new("abc"),
            },
        );
        let (state, _) = update(
            state,
            Msg::StatusReceived {
                generation,
                report: StatusReport::new("Formatting Output...", 60),
            },
        );
        state
    }

    #[test]
    fn processing_panel_shows_bar_and_status() {
        let lines = render(&tracking_state().view());
        assert_eq!(lines[0], "Processing job abc");
        assert_eq!(
            lines[1],
            format!("[{}{}]  60% Formatting Output...", "#".repeat(18), "-".repeat(12))
        );
    }

    #[test]
    fn success_panel_shows_download_link() {
        let state = tracking_state();
        let generation = state.generation();
        let (state, _) = update(
            state,
            Msg::StatusReceived {
                generation,
                report: StatusReport::new("Complete", 100).with_result_file("report_processed.zip"),
            },
        );
        let lines = render(&state.view());
        assert!(lines.contains(&"Download: /download/report_processed.zip".to_string()));
    }

    fn started() -> (AppState, HistoryRequest) {
        let (state, effects) = update(AppState::new(), Msg::Started);
        match effects.as_slice() {
            [Effect::RefreshHistory { request }] => (state, *request),
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn history_rows_list_archive_links() {
        let (state, request) = started();
        let (state, _) = update(
            state,
            Msg::HistoryLoaded {
                request,
                entries: vec![HistoryEntry {
                    file_name: "a.pdf".into(),
                    date: "2026-10-16 09:30".into(),
                    archive_name: "a_processed.zip".into(),
                }],
            },
        );
        assert_eq!(
            render_history(&state.view()),
            vec![
                "History:".to_string(),
                "  2026-10-16 09:30  a.pdf  /download/a_processed.zip".to_string(),
            ]
        );
    }

    #[test]
    fn failed_history_load_is_not_shown_as_empty() {
        let (state, request) = started();
        let (state, _) = update(
            state,
            Msg::HistoryLoadFailed {
                request,
                reason: "history load failed: network error: refused".into(),
            },
        );
        assert_eq!(
            render_history(&state.view()),
            vec![
                "History:".to_string(),
                "History unavailable: history load failed: network error: refused".to_string(),
            ]
        );
    }
}
