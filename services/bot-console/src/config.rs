//! Console Configuration
//!
//! Layered from an optional YAML file, then `BOT_CONSOLE_*` environment
//! variables. Command line flags are applied on top by the binary.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix, e.g. `BOT_CONSOLE_SERVICE_URL`
pub const ENV_PREFIX: &str = "BOT_CONSOLE";

/// Console settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Base URL of the trading service
    #[serde(default = "default_service_url")]
    pub service_url: String,
    /// Per-request timeout in seconds; 0 disables it
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// tracing level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Run against the in-process paper service
    #[serde(default)]
    pub paper: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
            paper: false,
        }
    }
}

impl Settings {
    /// Load settings
    ///
    /// An explicit `path` must exist. Without one, the per-user file is used
    /// when present.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(default) = default_config_path() {
                    builder = builder.add_source(config::File::from(default).required(false));
                }
            }
        }

        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read console settings")?
            .try_deserialize()
            .context("Invalid console settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.service_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "service_url must be an http(s) URL, got '{}'",
                self.service_url
            ));
        }
        self.log_level()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn log_level(&self) -> anyhow::Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid log_level: {}", self.log_level))
    }
}

/// `<config dir>/bot-console/console.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bot-console").join("console.yaml"))
}

fn default_service_url() -> String { "http://localhost:4943".to_string() }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.service_url, "http://localhost:4943");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.log_level().unwrap(), tracing::Level::INFO);
        assert!(!settings.paper);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let file = yaml_file(
            "service_url: https://bot.example.com\nrequest_timeout_secs: 0\nlog_level: debug\npaper: true\n",
        );

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.service_url, "https://bot.example.com");
        assert_eq!(settings.request_timeout(), None);
        assert_eq!(settings.log_level().unwrap(), tracing::Level::DEBUG);
        assert!(settings.paper);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = yaml_file("log_level: warn\n");

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.service_url, "http://localhost:4943");
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.log_level().unwrap(), tracing::Level::WARN);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let file = yaml_file("service_url: localhost:4943\n");
        assert!(Settings::load(Some(file.path())).is_err());

        let file = yaml_file("log_level: chatty\n");
        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(Settings::load(Some(&missing)).is_err());
    }
}
