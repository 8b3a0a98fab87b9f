//! Configuration data structures for framewatch.
//!
//! This module defines the schema for the application settings: server
//! parameters, the Gemini connection, admission limits, cache and caption
//! session lifetimes, background maintenance, and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, workers).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Per-client admission limits.
    #[serde(default)]
    pub limits: RateLimitConfig,

    /// Verdict cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Caption history session settings.
    #[serde(default)]
    pub sessions: SessionConfig,

    /// Background sweep settings.
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `0.0.0.0`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8000`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads for the tokio runtime.
    /// Default: Number of logical CPU cores.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Settings for the upstream Gemini API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key sent as the `key` query parameter. Empty means unconfigured.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the Generative Language API models collection.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Vision model used for classification.
    /// Default: `gemini-2.0-flash-exp`
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds. Failed calls are never retried.
    /// Default: `30`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Sliding-window admission limits per client identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Default: `10`
    #[serde(default = "default_per_minute")]
    pub per_minute: usize,

    /// Default: `100`
    #[serde(default = "default_per_hour")]
    pub per_hour: usize,
}

/// Settings for the verdict cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of a cached verdict in seconds.
    /// Default: `300` (5 minutes)
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,

    /// Maximum number of verdicts held at once.
    /// Default: `10000`
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// Settings for per-(client, video) caption history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Idle time after which accumulated history is discarded.
    /// Default: `3600` (1 hour)
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,

    /// Maximum number of concurrently tracked sessions.
    /// Default: `10000`
    #[serde(default = "default_max_entries")]
    pub max_sessions: usize,
}

/// Settings for the background sweeper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaintenanceConfig {
    /// Seconds between sweeps of expired state. `0` disables the sweeper.
    /// Default: `300`
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: default_api_base_url(),
            model: default_model(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
            per_hour: default_per_hour(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl(),
            max_sessions: default_max_entries(),
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_per_minute() -> usize {
    10
}

fn default_per_hour() -> usize {
    100
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_session_ttl() -> u64 {
    3600 // 1 hour
}

fn default_max_entries() -> usize {
    10_000
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
