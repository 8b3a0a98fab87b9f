// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{DetectorError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

/// Prefix for namespaced environment overrides (`FRAMEWATCH__SERVER__PORT=9000`)
pub const ENV_PREFIX: &str = "FRAMEWATCH";

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. `FRAMEWATCH__*` environment variables
    /// 3. Legacy variables (`GEMINI_API_KEY`, `MAX_REQUESTS_PER_MINUTE`, ...)
    /// 4. Config file
    /// 5. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file; only an explicitly requested file is mandatory
            .add_source(File::from(file_path).required(path.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| DetectorError::Config(e.to_string()))?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| DetectorError::Config(e.to_string()))?;

        app_config.apply_legacy_env(|name| std::env::var(name).ok())?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Honour the plain variable names the extension's deployment docs use.
    ///
    /// A legacy variable only applies when the namespaced equivalent is unset.
    pub fn apply_legacy_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let legacy = |name: &str, namespaced: &str| -> Option<String> {
            if lookup(namespaced).is_some() {
                return None;
            }
            lookup(name).filter(|v| !v.trim().is_empty())
        };

        if let Some(key) = legacy("GEMINI_API_KEY", "FRAMEWATCH__GEMINI__API_KEY") {
            self.gemini.api_key = key;
        }
        if let Some(v) = legacy("MAX_REQUESTS_PER_MINUTE", "FRAMEWATCH__LIMITS__PER_MINUTE") {
            self.limits.per_minute = parse_legacy("MAX_REQUESTS_PER_MINUTE", &v)?;
        }
        if let Some(v) = legacy("MAX_REQUESTS_PER_HOUR", "FRAMEWATCH__LIMITS__PER_HOUR") {
            self.limits.per_hour = parse_legacy("MAX_REQUESTS_PER_HOUR", &v)?;
        }
        if let Some(v) = legacy("PORT", "FRAMEWATCH__SERVER__PORT") {
            self.server.port = parse_legacy("PORT", &v)?;
        }
        Ok(())
    }

    /// Reject settings that would make the service misbehave silently
    pub fn validate(&self) -> Result<()> {
        if self.gemini.timeout_seconds == 0 {
            return Err(DetectorError::Config(
                "gemini.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.cache.max_entries == 0 || self.sessions.max_sessions == 0 {
            return Err(DetectorError::Config(
                "cache.max_entries and sessions.max_sessions must be greater than zero".to_string(),
            ));
        }
        if self.server.workers == 0 {
            return Err(DetectorError::Config(
                "server.workers must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".framewatch")
            .join("config.toml")
    }
}

fn parse_legacy<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DetectorError::Config(format!("{} has an invalid value: {}", name, value)))
}
