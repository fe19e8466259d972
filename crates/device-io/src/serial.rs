use std::time::{Duration, Instant};

use bridge_proto::DeviceSettings;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::warn;

use crate::DeviceAction;

/// Endpoint-level defaults for a serial device action. Any field here can
/// be overridden per-request via [`DeviceSettings`].
#[derive(Debug, Clone)]
pub struct SerialDeviceConfig {
    pub device_path: String,
    pub baud_rate: u32,
    /// Overall round-trip timeout (`ReplyTimeout`). Source default: 1250ms.
    pub reply_timeout: Duration,
    /// Per-byte read timeout (`ReadTimeout`). Source default: 500ms.
    pub read_timeout: Duration,
    /// Hard cap on reply length (`MaxInput`). `None` means unlimited.
    pub max_input: Option<i64>,
    /// Byte sequence ending a reply (`Terminator`). `None` means read until
    /// `ReplyTimeout` expires.
    pub terminator: Option<Vec<u8>>,
}

/// Drives a physical serial device: opens (and reopens, on error) the
/// configured port, and performs the write-then-read-until-done round trip
/// described in the slave endpoint's contract.
pub struct SerialDeviceAction {
    config: SerialDeviceConfig,
    port: Option<SerialStream>,
}

impl SerialDeviceAction {
    pub fn new(config: SerialDeviceConfig) -> Self {
        Self { config, port: None }
    }

    async fn ensure_open(&mut self) -> std::io::Result<()> {
        if self.port.is_none() {
            let port = tokio_serial::new(&self.config.device_path, self.config.baud_rate)
                .open_native_async()?;
            self.port = Some(port);
        }
        Ok(())
    }
}

impl DeviceAction for SerialDeviceAction {
    async fn act(&mut self, payload: &[u8], settings: &DeviceSettings) -> Vec<u8> {
        let reply_timeout = settings
            .reply_timeout()
            .unwrap_or(self.config.reply_timeout);
        let read_timeout = settings.read_timeout().unwrap_or(self.config.read_timeout);
        let max_input = settings.max_input.or(self.config.max_input);
        let terminator = settings
            .terminator_bytes()
            .or_else(|| self.config.terminator.clone());

        if let Err(e) = self.ensure_open().await {
            warn!(device = %self.config.device_path, error = %e, "failed to open serial device");
            return Vec::new();
        }

        if let Some(port) = self.port.as_mut() {
            if let Err(e) = port.clear(ClearBuffer::All) {
                warn!(error = %e, "failed to clear serial buffers, closing handle");
                self.port = None;
                return Vec::new();
            }
        }

        if let Some(port) = self.port.as_mut() {
            if let Err(e) = port.write_all(payload).await {
                warn!(error = %e, "serial write failed, closing handle");
                self.port = None;
                return Vec::new();
            }
        }

        self.read_reply(reply_timeout, read_timeout, max_input, terminator.as_deref())
            .await
    }
}

impl SerialDeviceAction {
    async fn read_reply(
        &mut self,
        reply_timeout: Duration,
        read_timeout: Duration,
        max_input: Option<i64>,
        terminator: Option<&[u8]>,
    ) -> Vec<u8> {
        let mut acc: Vec<u8> = Vec::new();
        let started = Instant::now();

        loop {
            if started.elapsed() >= reply_timeout {
                break;
            }
            if let Some(limit) = max_input {
                if limit >= 0 && acc.len() as i64 >= limit {
                    break;
                }
            }
            if let Some(term) = terminator {
                if !term.is_empty() && acc.ends_with(term) {
                    break;
                }
            }

            let Some(port) = self.port.as_mut() else {
                break;
            };

            let mut byte = [0u8; 1];
            match tokio::time::timeout(read_timeout, port.read(&mut byte)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(_)) => acc.push(byte[0]),
                Ok(Err(e)) => {
                    warn!(error = %e, "serial read failed, closing handle");
                    self.port = None;
                    break;
                }
                Err(_elapsed) => break,
            }
        }

        acc
    }
}
