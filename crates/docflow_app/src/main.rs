use std::process::ExitCode;

use clap::Parser;
use docflow_logging::flow_info;

mod cli;
mod config;
mod terminal;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("docflow: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: cli::Cli) -> anyhow::Result<ExitCode> {
    let mut config = config::load_config(cli.config.as_deref())?;
    config.apply_cli(&cli);
    docflow_logging::initialize(
        config.log_destination(),
        config.log_level(),
        &config.log.file,
    );
    flow_info!(
        "Using server {} (config {:?}), polling every {} ms",
        config.server_url,
        cli.config,
        config.poll_interval_ms
    );
    terminal::run(cli.command, config)
}
