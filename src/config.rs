//! Session configuration, loaded from TOML
//!
//! Every key is optional:
//!
//! ```toml
//! [output]
//! device = "pulse"
//! channels = 2
//!
//! [pool]
//! release_margin_secs = 0.1
//!
//! [scope]
//! enabled = true
//! window = 1024
//! interval_ms = 16
//!
//! [log]
//! level = "info"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub scope: ScopeConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Output device selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Device name; the system default when unset
    #[serde(default)]
    pub device: Option<String>,

    /// Channel count; the device's own when unset
    #[serde(default)]
    pub channels: Option<usize>,
}

/// Voice pool tuning
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Seconds between the end of a fade ramp and the voice's release
    #[serde(default = "default_release_margin")]
    pub release_margin_secs: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            release_margin_secs: default_release_margin(),
        }
    }
}

/// Output-bus visualization
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Samples per scope frame
    #[serde(default = "default_window")]
    pub window: usize,

    /// Milliseconds between scope frames
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: default_window(),
            interval_ms: default_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_release_margin() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_window() -> usize {
    1024
}

fn default_interval_ms() -> u64 {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

impl SessionConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let margin = self.pool.release_margin_secs;
        if !(margin.is_finite() && margin > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "pool.release_margin_secs must be a positive number of seconds, got {margin}"
            )));
        }
        if self.output.channels == Some(0) {
            return Err(ConfigError::Invalid("output.channels must be at least 1".into()));
        }
        if self.scope.enabled && self.scope.window == 0 {
            return Err(ConfigError::Invalid("scope.window must be at least 1".into()));
        }
        if self.scope.enabled && self.scope.interval_ms == 0 {
            return Err(ConfigError::Invalid("scope.interval_ms must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config.output.device, None);
        assert_eq!(config.output.channels, None);
        assert_eq!(config.pool.release_margin_secs, 0.1);
        assert!(config.scope.enabled);
        assert_eq!(config.scope.window, 1024);
        assert_eq!(config.scope.interval_ms, 16);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SessionConfig::from_toml_str(
            r#"
            [output]
            device = "Speakers"

            [scope]
            window = 256
            "#,
        )
        .unwrap();
        assert_eq!(config.output.device.as_deref(), Some("Speakers"));
        assert_eq!(config.scope.window, 256);
        assert!(config.scope.enabled);
        assert_eq!(config.pool.release_margin_secs, 0.1);
    }

    #[test]
    fn rejects_non_positive_release_margin() {
        for margin in ["0.0", "-0.5"] {
            let err = SessionConfig::from_toml_str(&format!("[pool]\nrelease_margin_secs = {margin}"))
                .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
        }
    }

    #[test]
    fn rejects_zero_channels() {
        let err = SessionConfig::from_toml_str("[output]\nchannels = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn disabled_scope_skips_window_checks() {
        let config = SessionConfig::from_toml_str("[scope]\nenabled = false\nwindow = 0").unwrap();
        assert!(!config.scope.enabled);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SessionConfig::from_toml_str("[pool\nrelease_margin_secs = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlevel = \"debug\"\n[pool]\nrelease_margin_secs = 0.25").unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.pool.release_margin_secs, 0.25);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
