//! Session settings.
//!
//! Values are resolved from built-in defaults, then the TOML config file,
//! then the `TASKFLOW_API_URL` environment variable, then launch flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::MAX_PAGE_SIZE;
use crate::cli::Cli;

pub const API_URL_ENV: &str = "TASKFLOW_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const DEFAULT_NOTIFICATION_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub page_size: u64,
    pub notification_ms: u64,
    pub log_file: PathBuf,
    /// The file the settings were read from, if any.
    pub source: Option<PathBuf>,
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    page_size: Option<u64>,
    notification_ms: Option<u64>,
    log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            notification_ms: DEFAULT_NOTIFICATION_MS,
            log_file: default_log_file(),
            source: None,
        }
    }
}

impl Config {
    /// Resolve the settings for this launch.
    ///
    /// A missing file at the default location is fine; a missing file named
    /// with `--config` is an error.
    pub fn load(cli: &Cli, env_api_url: Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Config::default();

        match &cli.config {
            Some(path) => cfg.merge_file(path)?,
            None => {
                if let Some(path) = default_config_path().filter(|p| p.exists()) {
                    cfg.merge_file(&path)?;
                }
            }
        }

        if let Some(url) = env_api_url.filter(|u| !u.trim().is_empty()) {
            debug!(%url, "api url from environment");
            cfg.api_url = url;
        }

        if let Some(url) = &cli.api_url {
            cfg.api_url = url.clone();
        }
        if let Some(size) = cli.page_size {
            cfg.page_size = size;
        }
        if let Some(path) = &cli.log_file {
            cfg.log_file = path.clone();
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn merge_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let file: FileConfig = toml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        info!(config = %path.display(), "loaded config file");

        if let Some(url) = file.api_url {
            self.api_url = url;
        }
        if let Some(size) = file.page_size {
            self.page_size = size;
        }
        if let Some(ms) = file.notification_ms {
            self.notification_ms = ms;
        }
        if let Some(log_file) = file.log_file {
            self.log_file = log_file;
        }
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("api_url must start with http:// or https://, got '{url}'");
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            bail!("page_size must be between 1 and {MAX_PAGE_SIZE}, got {}", self.page_size);
        }
        Ok(())
    }

    pub fn notice_lifetime(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

/// `<config dir>/taskflow/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskflow").join("config.toml"))
}

fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("taskflow")
        .join("taskflow.log")
}
