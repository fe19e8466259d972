//! Master configuration loading.
//!
//! TOML is the sole config source; no environment variable overrides.
//! Default config path: `/etc/rendezvous-bridge/master.toml`.
//!
//! # Required fields
//! - `stream.name`
//! - `socket.path`

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MasterConfig {
    pub stream_name: String,
    pub broker: BrokerConfig,
    pub socket: SocketConfig,
    pub framing: FramingConfig,
    pub status_http: StatusHttpConfig,
    pub log_filter: String,
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub path: String,
    /// Per-read timeout on the client connection.
    pub socket_timeout: Duration,
    /// How long to wait for a slave reply before writing `TOUT`.
    pub upstream_timeout: Duration,
}

/// Request framing and reply terminator configuration.
///
/// `terminator` always applies to the bytes the master writes back
/// (`reply + terminator` or `TOUT + terminator`), independent of
/// `read_mode` — only how a *request* is framed differs between the two
/// modes.
#[derive(Debug, Clone)]
pub struct FramingConfig {
    pub read_mode: ReadMode,
    pub terminator: String,
    pub buffer_size: usize,
    pub strip_terminator: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    LengthPrefixed,
    Terminated,
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
    socket: Option<RawSocketConfig>,
    framing: Option<RawFramingConfig>,
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
struct RawSocketConfig {
    path: Option<String>,
    socket_timeout_ms: Option<u64>,
    upstream_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawFramingConfig {
    mode: Option<String>,
    terminator: Option<String>,
    buffer_size: Option<usize>,
    strip_terminator: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawStatusHttpConfig {
    bind: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn load_config_from_path(path: &Path) -> Result<MasterConfig, ConfigError> {
    let toml_str = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("reading config file '{}': {}", path.display(), e)))?;
    load_config_from_str(&toml_str)
}

pub fn load_config() -> Result<MasterConfig, ConfigError> {
    load_config_from_path(Path::new("/etc/rendezvous-bridge/master.toml"))
}

pub fn load_config_from_str(toml_str: &str) -> Result<MasterConfig, ConfigError> {
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

    let raw_socket = raw
        .socket
        .ok_or_else(|| ConfigError::MissingField("socket".to_owned()))?;
    let path = raw_socket
        .path
        .ok_or_else(|| ConfigError::MissingField("socket.path".to_owned()))?;
    let socket = SocketConfig {
        path,
        socket_timeout: Duration::from_millis(raw_socket.socket_timeout_ms.unwrap_or(5_000)),
        upstream_timeout: Duration::from_millis(raw_socket.upstream_timeout_ms.unwrap_or(1_000)),
    };

    let framing = {
        let f = raw.framing.unwrap_or(RawFramingConfig {
            mode: None,
            terminator: None,
            buffer_size: None,
            strip_terminator: None,
        });
        let mode_text = f.mode.unwrap_or_else(|| "terminated".to_owned());
        let read_mode = match mode_text.as_str() {
            "length_prefixed" => ReadMode::LengthPrefixed,
            "terminated" => ReadMode::Terminated,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "framing.mode must be \"terminated\" or \"length_prefixed\", got \"{other}\""
                )))
            }
        };
        FramingConfig {
            read_mode,
            terminator: f.terminator.unwrap_or_else(|| "\n".to_owned()),
            buffer_size: f.buffer_size.unwrap_or(1),
            strip_terminator: f.strip_terminator.unwrap_or(false),
        }
    };

    let status_http = StatusHttpConfig {
        bind: raw
            .status_http
            .and_then(|s| s.bind)
            .unwrap_or_else(|| "127.0.0.1:8080".to_owned()),
    };

    Ok(MasterConfig {
        stream_name,
        broker,
        socket,
        framing,
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
