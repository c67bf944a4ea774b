//! Client configuration
//!
//! Defaults are compile-time constants. An optional TOML file can override
//! any subset of them; command-line flags are applied on top by the host.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::ConfigError;
use crate::reconnect::ReconnectPolicy;

/// Stream endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/pi-stream";

/// Fractional digits at which the computation counts as complete
pub const TARGET_PRECISION: usize = 100;

/// An error within this long after the last payload is treated as benign
pub const LIVENESS_WINDOW: Duration = Duration::from_millis(5000);

/// Time allowed for the HTTP connection to be established
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for any configured reconnect delay
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(3600);

/// Resolved configuration for a [`StreamClient`](crate::client::StreamClient)
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub endpoint: Url,
    pub target_precision: usize,
    pub liveness_window: Duration,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("DEFAULT_ENDPOINT is a valid URL"),
            target_precision: TARGET_PRECISION,
            liveness_window: LIVENESS_WINDOW,
            connect_timeout: CONNECT_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// On-disk shape; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    endpoint: Option<String>,
    target_precision: Option<usize>,
    liveness_window_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    #[serde(default)]
    reconnect: ReconnectFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReconnectFile {
    enabled: Option<bool>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
    max_attempts: Option<u32>,
}

impl StreamConfig {
    /// Default config file location (`<config dir>/pistream/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pistream").join("config.toml"))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// if present, otherwise the built-in defaults are returned.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load and merge a specific TOML file over the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded config file");
        Self::default().merge(file)
    }

    /// Parse a TOML document over the defaults (no file involved)
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Self::default().merge(file)
    }

    /// Replace the endpoint, validating the URL
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        self.endpoint = parse_endpoint(endpoint)?;
        Ok(self)
    }

    fn merge(mut self, file: ConfigFile) -> Result<Self, ConfigError> {
        if let Some(endpoint) = file.endpoint {
            self.endpoint = parse_endpoint(&endpoint)?;
        }
        if let Some(precision) = file.target_precision {
            if precision == 0 {
                return Err(ConfigError::ZeroPrecision);
            }
            self.target_precision = precision;
        }
        if let Some(ms) = file.liveness_window_ms {
            self.liveness_window = Duration::from_millis(ms);
        }
        if let Some(ms) = file.connect_timeout_ms {
            self.connect_timeout = Duration::from_millis(ms);
        }

        let r = file.reconnect;
        let policy = &mut self.reconnect;
        if let Some(enabled) = r.enabled {
            policy.enabled = enabled;
        }
        if let Some(ms) = r.initial_delay_ms {
            policy.initial_delay = Duration::from_millis(ms).min(MAX_RECONNECT_DELAY);
        }
        if let Some(ms) = r.max_delay_ms {
            policy.max_delay = Duration::from_millis(ms).min(MAX_RECONNECT_DELAY);
        }
        if let Some(multiplier) = r.multiplier {
            policy.multiplier = multiplier.max(1.0);
        }
        if let Some(jitter) = r.jitter {
            policy.jitter = jitter.clamp(0.0, 1.0);
        }
        if let Some(max_attempts) = r.max_attempts {
            policy.max_attempts = Some(max_attempts);
        }

        Ok(self)
    }
}

fn parse_endpoint(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|source| ConfigError::InvalidEndpoint {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.target_precision, 100);
        assert_eq!(config.liveness_window, Duration::from_millis(5000));
        assert!(!config.reconnect.enabled);
    }

    #[test]
    fn test_partial_override() {
        let config = StreamConfig::from_toml(
            r#"
            endpoint = "http://pi.example:9000/pi-stream"

            [reconnect]
            enabled = true
            max_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.host_str(), Some("pi.example"));
        assert_eq!(config.target_precision, TARGET_PRECISION);
        assert!(config.reconnect.enabled);
        assert_eq!(config.reconnect.max_attempts, Some(3));
    }

    #[test]
    fn test_reconnect_delays_clamped() {
        let config = StreamConfig::from_toml(&format!(
            "[reconnect]\ninitial_delay_ms = {max}\nmax_delay_ms = {max}\n",
            max = i64::MAX
        ))
        .unwrap();

        assert_eq!(config.reconnect.initial_delay, MAX_RECONNECT_DELAY);
        assert_eq!(config.reconnect.max_delay, MAX_RECONNECT_DELAY);
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = StreamConfig::from_toml(r#"endpoint = "not a url""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_zero_precision_rejected() {
        let err = StreamConfig::from_toml("target_precision = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroPrecision));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(StreamConfig::from_toml("colour = \"red\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "liveness_window_ms = 1500").unwrap();

        let config = StreamConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.liveness_window, Duration::from_millis(1500));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StreamConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_with_endpoint() {
        let config = StreamConfig::default()
            .with_endpoint("http://127.0.0.1:8000/pi-stream")
            .unwrap();
        assert_eq!(config.endpoint.port(), Some(8000));
        assert!(StreamConfig::default().with_endpoint("::").is_err());
    }
}
