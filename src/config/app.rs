//! Application, scheduler and server configuration.
//!
//! Values come from defaults, then a JSON document or the environment
//! (`.env` is loaded first when present).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default concurrency bound.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

const ENV_HOST: &str = "TASK_QUEUE_HOST";
const ENV_PORT: &str = "TASK_QUEUE_PORT";
const ENV_MAX_CONCURRENCY: &str = "TASK_QUEUE_MAX_CONCURRENCY";
const ENV_WORKER_THREADS: &str = "TASK_QUEUE_WORKER_THREADS";

/// Load `.env` (silently ignored if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of tasks running at once.
    pub max_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Tokio worker threads.
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            worker_threads: num_cpus::get(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Server settings.
    pub server: ServerConfig,
}

impl SchedulerConfig {
    /// Validate scheduler configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message when `max_concurrency` is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".into());
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Validate server configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message when the host is empty or no worker threads are
    /// configured.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".into());
        }
        if self.worker_threads == 0 {
            return Err("worker_threads must be greater than 0".into());
        }
        Ok(())
    }

    /// `host:port` string suitable for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value, prefixed with its section.
    pub fn validate(&self) -> Result<(), String> {
        self.scheduler
            .validate()
            .map_err(|e| format!("scheduler: {e}"))?;
        self.server.validate().map_err(|e| format!("server: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message when the JSON is malformed or a value is invalid.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, after loading
    /// `.env`.
    ///
    /// # Errors
    ///
    /// Returns a message when a variable does not parse or a value is invalid.
    pub fn from_env() -> Result<Self, String> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source. Unset or empty
    /// variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message when a variable does not parse or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get(ENV_HOST) {
            cfg.server.host = host;
        }
        if let Some(port) = parse_var(ENV_PORT, get(ENV_PORT))? {
            cfg.server.port = port;
        }
        if let Some(threads) = parse_var(ENV_WORKER_THREADS, get(ENV_WORKER_THREADS))? {
            cfg.server.worker_threads = threads;
        }
        if let Some(max) = parse_var(ENV_MAX_CONCURRENCY, get(ENV_MAX_CONCURRENCY))? {
            cfg.scheduler.max_concurrency = max;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, value: Option<String>) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|e| format!("{key}={v:?} is invalid: {e}"))
        })
        .transpose()
}
