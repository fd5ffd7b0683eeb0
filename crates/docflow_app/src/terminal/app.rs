use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc;

use anyhow::{anyhow, Context};
use docflow_core::{
    update, AppState, AppViewModel, DownloadState, Msg, PickedFile, ProcessingOptions, UiState,
};
use docflow_logging::flow_info;

use super::effects::EffectRunner;
use super::render::{render, render_history};
use crate::cli::Command;
use crate::config::AppConfig;

/// Options given on the command line for one submission; unset fields keep
/// the configured defaults.
#[derive(Debug, Default)]
struct OptionOverrides {
    strategy: Option<String>,
    model: Option<String>,
    infer_tables: Option<bool>,
    extract_images: Option<bool>,
}

impl OptionOverrides {
    fn apply(self, mut options: ProcessingOptions) -> ProcessingOptions {
        if let Some(strategy) = self.strategy {
            options.strategy = strategy;
        }
        if let Some(model) = self.model {
            options.model = model;
        }
        if let Some(infer_tables) = self.infer_tables {
            options.infer_tables = infer_tables;
        }
        if let Some(extract_images) = self.extract_images {
            options.extract_images = extract_images;
        }
        options
    }
}

pub fn run(command: Command, config: AppConfig) -> anyhow::Result<ExitCode> {
    let mut app = App::new(&config)?;
    match command {
        Command::Submit {
            file,
            strategy,
            model,
            infer_tables,
            extract_images,
            download,
        } => {
            let overrides = OptionOverrides {
                strategy,
                model,
                infer_tables,
                extract_images,
            };
            let options = overrides.apply(config.default_options());
            app.submit(&file, options, download)
        }
        Command::History => {
            app.dispatch(Msg::Started);
            let view = app.run_until(|view| !view.history_loading)?;
            print_lines(&render_history(&view));
            Ok(history_exit_code(&view))
        }
        Command::Download { name } => {
            app.dispatch(Msg::DownloadRequested { name });
            let view = app.run_until(|view| !matches!(view.download, DownloadState::InFlight { .. }))?;
            Ok(download_exit_code(&view))
        }
    }
}

struct App {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
    last_lines: Vec<String>,
}

impl App {
    fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (msg_tx, msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(config.engine_settings()?, msg_tx)
            .context("failed to start the engine")?;
        Ok(Self {
            state: AppState::with_default_options(config.default_options()),
            runner,
            msg_rx,
            last_lines: Vec::new(),
        })
    }

    fn submit(
        &mut self,
        file: &Path,
        options: ProcessingOptions,
        download: bool,
    ) -> anyhow::Result<ExitCode> {
        let bytes =
            std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} does not name a file", file.display()))?;
        flow_info!("Picked {} ({} bytes)", name, bytes.len());

        self.dispatch(Msg::Started);
        self.dispatch(Msg::FileSelected(Some(PickedFile::new(name, bytes))));
        self.dispatch(Msg::OptionsChanged(options));
        self.dispatch(Msg::SubmitClicked);

        // A failed session lands back on AwaitingSelection with the error kept
        // as a notice.
        let view = self.run_until(|view| {
            view.ui_state == UiState::Succeeded
                || (view.ui_state == UiState::AwaitingSelection && view.notice.is_some())
        })?;
        if view.ui_state != UiState::Succeeded {
            return Ok(ExitCode::FAILURE);
        }

        if download {
            if let Some(result_file) = view.result_file.clone() {
                self.dispatch(Msg::DownloadRequested { name: result_file });
            }
        }
        let view = self.run_until(|view| {
            !view.history_loading && !matches!(view.download, DownloadState::InFlight { .. })
        })?;
        print_lines(&render_history(&view));
        Ok(download_exit_code(&view))
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if self.state.consume_dirty() {
            self.render();
        }
        self.runner.enqueue(effects);
    }

    /// Processes messages until `done` holds for the current view.
    fn run_until(&mut self, done: impl Fn(&AppViewModel) -> bool) -> anyhow::Result<AppViewModel> {
        loop {
            let view = self.state.view();
            if done(&view) {
                return Ok(view);
            }
            let msg = self
                .msg_rx
                .recv()
                .context("engine stopped before the session finished")?;
            self.dispatch(msg);
        }
    }

    fn render(&mut self) {
        let lines = render(&self.state.view());
        if lines != self.last_lines {
            print_lines(&lines);
            self.last_lines = lines;
        }
    }
}

fn history_exit_code(view: &AppViewModel) -> ExitCode {
    if view.history_error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn download_exit_code(view: &AppViewModel) -> ExitCode {
    match view.download {
        DownloadState::Failed { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
