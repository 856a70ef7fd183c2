//! Optional RON configuration for the terminal host.
//!
//! Looked up at `$DEALFLOW_CONFIG`, else `./dealflow.ron`. Every field is
//! optional; durations are milliseconds.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use dealflow_engine::EngineConfig;
use engine_logging::{LevelFilter, LogDestination};
use serde::Deserialize;

pub const CONFIG_ENV: &str = "DEALFLOW_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "dealflow.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub relays: Option<Vec<String>>,
    pub api_scheme: Option<String>,
    pub page_size: Option<u32>,
    pub page_timeout_ms: Option<u64>,
    pub task_timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub job_delay_ms: Option<u64>,
    pub page_attempts: Option<u32>,
    pub page_backoff_step_ms: Option<u64>,
    pub queue_backoff_step_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub log_level: Option<String>,
    pub log_target: Option<LogTarget>,
}

impl FileConfig {
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        let ms = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_millis).unwrap_or(fallback)
        };
        EngineConfig {
            relays: self.relays.clone().unwrap_or(defaults.relays),
            api_scheme: self.api_scheme.clone().unwrap_or(defaults.api_scheme),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            page_timeout: ms(self.page_timeout_ms, defaults.page_timeout),
            task_timeout: ms(self.task_timeout_ms, defaults.task_timeout),
            connect_timeout: ms(self.connect_timeout_ms, defaults.connect_timeout),
            job_delay: ms(self.job_delay_ms, defaults.job_delay),
            page_attempts: self.page_attempts.unwrap_or(defaults.page_attempts),
            page_backoff_step: ms(self.page_backoff_step_ms, defaults.page_backoff_step),
            queue_backoff_step: ms(self.queue_backoff_step_ms, defaults.queue_backoff_step),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
        }
    }

    pub fn log_level(&self) -> anyhow::Result<LevelFilter> {
        match self.log_level.as_deref() {
            None => Ok(LevelFilter::Info),
            Some(raw) => LevelFilter::from_str(raw)
                .map_err(|_| anyhow::anyhow!("invalid log_level {raw:?}")),
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match self.log_target.unwrap_or(LogTarget::File) {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// A missing file yields defaults; an unreadable or malformed one is an error.
pub fn load(path: &Path) -> anyhow::Result<FileConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };
    ron::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
}
