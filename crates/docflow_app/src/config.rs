//! Configuration: an optional RON file, then command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use docflow_core::ProcessingOptions;
use docflow_engine::{ApiSettings, EngineSettings};
use docflow_logging::{LevelFilter, LogDestination};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILENAME: &str = "docflow.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_download_bytes: u64,
    pub output_dir: PathBuf,
    pub options: OptionsConfig,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            poll_interval_ms: 1000,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_download_bytes: 512 * 1024 * 1024,
            output_dir: PathBuf::from("downloads"),
            options: OptionsConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Default processing options for new sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    pub strategy: String,
    pub model: String,
    pub infer_tables: bool,
    pub extract_images: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        let options = ProcessingOptions::default();
        Self {
            strategy: options.strategy,
            model: options.model,
            infer_tables: options.infer_tables,
            extract_images: options.extract_images,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub destination: LogTarget,
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            destination: LogTarget::Terminal,
            level: "warn".to_string(),
            file: PathBuf::from("docflow.log"),
        }
    }
}

/// Loads `explicit` if given (it must exist), otherwise `./docflow.ron` if
/// present, otherwise defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
            if !default_path.exists() {
                return Ok(AppConfig::default());
            }
            default_path
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    ron::from_str(&content)
        .with_context(|| format!("failed to parse config from {}", path.display()))
}

impl AppConfig {
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(server) = &cli.server {
            self.server_url = server.clone();
        }
        if let Some(interval) = cli.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        match cli.verbose {
            0 => {}
            1 => self.log.level = "debug".to_string(),
            _ => self.log.level = "trace".to_string(),
        }
    }

    pub fn default_options(&self) -> ProcessingOptions {
        ProcessingOptions {
            strategy: self.options.strategy.clone(),
            model: self.options.model.clone(),
            infer_tables: self.options.infer_tables,
            extract_images: self.options.extract_images,
        }
    }

    pub fn engine_settings(&self) -> anyhow::Result<EngineSettings> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than zero"));
        }
        let mut api = ApiSettings::parse(&self.server_url)
            .with_context(|| format!("invalid server url {:?}", self.server_url))?;
        api.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        api.request_timeout = Duration::from_secs(self.request_timeout_secs);
        api.max_download_bytes = self.max_download_bytes;

        let mut settings = EngineSettings::new(api, self.output_dir.clone());
        settings.poll_interval = Duration::from_millis(self.poll_interval_ms);
        Ok(settings)
    }

    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log.level).unwrap_or(LevelFilter::Warn)
    }

    pub fn log_destination(&self) -> LogDestination {
        match self.log.destination {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}
