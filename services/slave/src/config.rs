//! Slave configuration loading.
//!
//! TOML is the sole config source; no environment variable overrides.
//! Default config path: `/etc/rendezvous-bridge/slave.toml`.
//!
//! # Required fields
//! - `stream.name`
//! - `device.path`

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use bridge_proto::Priority;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SlaveConfig {
    pub stream_name: String,
    pub broker: BrokerConfig,
    pub device: DeviceConfig,
    pub priority: Priority,
    pub reconnect_interval: Duration,
    pub status_http: StatusHttpConfig,
    pub log_filter: String,
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub path: String,
    pub baud_rate: u32,
    pub reply_timeout: Duration,
    pub read_timeout: Duration,
    pub max_input: Option<i64>,
    pub terminator: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusHttpConfig {
    pub bind: String,
}

// ---------------------------------------------------------------------------
// Raw TOML deserialization types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawConfig {
    stream: Option<RawStreamConfig>,
    broker: Option<RawBrokerConfig>,
    device: Option<RawDeviceConfig>,
    priority: Option<String>,
    reconnect_interval_ms: Option<u64>,
    status_http: Option<RawStatusHttpConfig>,
    log_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStreamConfig {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBrokerConfig {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDeviceConfig {
    path: Option<String>,
    baud_rate: Option<u32>,
    reply_timeout_ms: Option<u64>,
    read_timeout_ms: Option<u64>,
    max_input: Option<i64>,
    terminator: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStatusHttpConfig {
    bind: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn load_config_from_path(path: &Path) -> Result<SlaveConfig, ConfigError> {
    let toml_str = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("reading config file '{}': {}", path.display(), e)))?;
    load_config_from_str(&toml_str)
}

pub fn load_config() -> Result<SlaveConfig, ConfigError> {
    load_config_from_path(Path::new("/etc/rendezvous-bridge/slave.toml"))
}

pub fn load_config_from_str(toml_str: &str) -> Result<SlaveConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let stream_name = raw
        .stream
        .and_then(|s| s.name)
        .ok_or_else(|| ConfigError::MissingField("stream.name".to_owned()))?;

    let broker = BrokerConfig {
        url: raw
            .broker
            .and_then(|b| b.url)
            .unwrap_or_else(|| "redis://127.0.0.1:6379/0".to_owned()),
    };

    let raw_device = raw
        .device
        .ok_or_else(|| ConfigError::MissingField("device".to_owned()))?;
    let path = raw_device
        .path
        .ok_or_else(|| ConfigError::MissingField("device.path".to_owned()))?;
    let device = DeviceConfig {
        path,
        baud_rate: raw_device.baud_rate.unwrap_or(9600),
        reply_timeout: Duration::from_millis(raw_device.reply_timeout_ms.unwrap_or(1_250)),
        read_timeout: Duration::from_millis(raw_device.read_timeout_ms.unwrap_or(500)),
        max_input: raw_device.max_input,
        terminator: raw_device.terminator,
    };

    let priority_text = raw.priority.unwrap_or_else(|| "low".to_owned());
    let priority = priority_text
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("priority must be \"high\" or \"low\", got \"{priority_text}\"")))?;

    let status_http = StatusHttpConfig {
        bind: raw
            .status_http
            .and_then(|s| s.bind)
            .unwrap_or_else(|| "127.0.0.1:8081".to_owned()),
    };

    Ok(SlaveConfig {
        stream_name,
        broker,
        device,
        priority,
        reconnect_interval: Duration::from_millis(raw.reconnect_interval_ms.unwrap_or(30_000)),
        status_http,
        log_filter: raw.log_filter.unwrap_or_else(|| "info".to_owned()),
    })
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    MissingField(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(s) => write!(f, "IO error: {s}"),
            ConfigError::Parse(s) => write!(f, "Parse error: {s}"),
            ConfigError::MissingField(s) => write!(f, "Missing required field: {s}"),
            ConfigError::InvalidValue(s) => write!(f, "Invalid config value: {s}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let cfg = load_config_from_str(
            r#"
            [stream]
            name = "analyzer1"

            [device]
            path = "/dev/ttyUSB0"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.stream_name, "analyzer1");
        assert_eq!(cfg.device.path, "/dev/ttyUSB0");
        assert_eq!(cfg.device.baud_rate, 9600);
        assert_eq!(cfg.device.reply_timeout, Duration::from_millis(1_250));
        assert_eq!(cfg.device.read_timeout, Duration::from_millis(500));
        assert_eq!(cfg.priority, Priority::Low);
        assert_eq!(cfg.reconnect_interval, Duration::from_secs(30));
    }

    #[test]
    fn rejects_missing_device_path() {
        let err = load_config_from_str(
            r#"
            [stream]
            name = "s"

            [device]
            baud_rate = 115200
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn parses_high_priority() {
        let cfg = load_config_from_str(
            r#"
            stream = { name = "s" }
            priority = "high"

            [device]
            path = "/dev/ttyUSB1"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.priority, Priority::High);
    }

    #[test]
    fn rejects_unknown_priority() {
        let err = load_config_from_str(
            r#"
            stream = { name = "s" }
            priority = "medium"

            [device]
            path = "/dev/ttyUSB1"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
