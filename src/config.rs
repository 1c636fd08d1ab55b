//! TOML configuration.
//!
//! Every section is optional; a missing file means "all defaults". See
//! `config/jarchive.example.toml` for an annotated example.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_first_id")]
    pub first_id: u32,
    #[serde(default = "default_last_id")]
    pub last_id: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            first_id: default_first_id(),
            last_id: default_last_id(),
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl ScrapeConfig {
    /// Inclusive id range to scrape. Empty when `last_id < first_id`.
    pub fn id_range(&self) -> RangeInclusive<u32> {
        self.first_id..=self.last_id
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

fn default_base_url() -> String {
    "https://j-archive.com/showgame.php".to_string()
}
fn default_first_id() -> u32 {
    1
}
fn default_last_id() -> u32 {
    9999
}
fn default_concurrency() -> usize {
    10
}
fn default_max_attempts() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_user_agent() -> String {
    format!("jarchive/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("jeopardy_games.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

impl ServerConfig {
    /// Resolve the listen address, letting `PORT` override the configured port.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind_addr_with_port(std::env::var("PORT").ok().as_deref())
    }

    fn bind_addr_with_port(&self, port: Option<&str>) -> Result<SocketAddr> {
        let mut addr: SocketAddr = self
            .bind
            .parse()
            .with_context(|| format!("Invalid server.bind address: {}", self.bind))?;
        if let Some(port) = port {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
            addr.set_port(port);
        }
        Ok(addr)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

/// One year.
const MAX_INTERVAL_HOURS: u64 = 24 * 366;

fn default_interval_hours() -> u64 {
    24
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(60 * 60))
    }
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.scrape.base_url.trim().is_empty() {
        bail!("scrape.base_url must not be empty");
    }
    if config.scrape.first_id == 0 {
        bail!("scrape.first_id must be >= 1");
    }
    if config.scrape.concurrency == 0 {
        bail!("scrape.concurrency must be >= 1");
    }
    if config.scrape.max_attempts == 0 {
        bail!("scrape.max_attempts must be >= 1");
    }
    if config.scrape.timeout_secs == 0 {
        bail!("scrape.timeout_secs must be > 0");
    }
    if config.schedule.interval_hours == 0 {
        bail!("schedule.interval_hours must be > 0");
    }
    if config.schedule.interval_hours > MAX_INTERVAL_HOURS {
        bail!("schedule.interval_hours must be <= {}", MAX_INTERVAL_HOURS);
    }
    Ok(())
}
