//! In-memory [`BrokerFacade`] used by the protocol test suites — no real
//! broker process is needed to exercise the rendezvous state machines.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use bridge_proto::{DeviceSettings, Nonce, Priority};
use futures_util::stream::BoxStream;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::facade::{BrokerFacade, ElectionOutcome, SubmitStatus};

#[derive(Default)]
struct StreamState {
    down_data: Option<Vec<u8>>,
    up_data: Option<Vec<u8>>,
    up_listen: Option<String>,
    device_settings: Option<Vec<u8>>,
    slave_token: Option<String>,
}

/// Shared in-memory broker state, cloneable like a real connection handle.
#[derive(Clone)]
pub struct FakeBroker {
    streams: Arc<Mutex<HashMap<String, StreamState>>>,
    notify: Arc<Mutex<HashMap<String, broadcast::Sender<Nonce>>>>,
}

impl Default for FakeBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBroker {
    pub fn new() -> Self {
        Self {
            streams: Arc::new(Mutex::new(HashMap::new())),
            notify: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn notifier_for(&self, stream: &str) -> broadcast::Sender<Nonce> {
        let mut notify = self.notify.lock().await;
        notify
            .entry(stream.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }
}

impl BrokerFacade for FakeBroker {
    type Error = Infallible;

    async fn publish_request(
        &self,
        stream: &str,
        data: &[u8],
        settings: &DeviceSettings,
        nonce: &Nonce,
    ) -> Result<(), Self::Error> {
        {
            let mut streams = self.streams.lock().await;
            let state = streams.entry(stream.to_string()).or_default();
            state.up_data = None;
            state.up_listen = Some(nonce.as_str().to_string());
            state.down_data = Some(data.to_vec());
            state.device_settings = Some(settings.to_json_bytes());
        }
        let sender = self.notifier_for(stream).await;
        let _ = sender.send(nonce.clone());
        Ok(())
    }

    async fn await_reply(
        &self,
        stream: &str,
        nonce: &Nonce,
        timeout: Duration,
    ) -> Result<bool, Self::Error> {
        loop {
            {
                let streams = self.streams.lock().await;
                if streams.get(stream).is_some_and(|s| s.up_data.is_some()) {
                    return Ok(true);
                }
            }
            if nonce.elapsed() > timeout {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    async fn consume_reply(&self, stream: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut streams = self.streams.lock().await;
        let state = streams.entry(stream.to_string()).or_default();
        state.down_data = None;
        state.up_listen = None;
        Ok(state.up_data.take())
    }

    async fn pickup(
        &self,
        stream: &str,
        nonce: &Nonce,
        priority: Priority,
    ) -> Result<Option<(Vec<u8>, DeviceSettings)>, Self::Error> {
        let streams = self.streams.lock().await;
        let Some(state) = streams.get(stream) else {
            return Ok(None);
        };
        let Some(payload) = state.down_data.clone() else {
            return Ok(None);
        };
        if state.slave_token.as_deref() != Some(priority.as_str()) {
            return Ok(None);
        }
        if state.up_listen.as_deref() != Some(nonce.as_str()) {
            return Ok(None);
        }
        let settings = state
            .device_settings
            .as_deref()
            .and_then(|bytes| DeviceSettings::from_json_bytes(bytes).ok())
            .unwrap_or_else(DeviceSettings::empty);
        Ok(Some((payload, settings)))
    }

    async fn submit_reply(
        &self,
        stream: &str,
        nonce: &Nonce,
        payload: &[u8],
    ) -> Result<SubmitStatus, Self::Error> {
        let mut streams = self.streams.lock().await;
        let state = streams.entry(stream.to_string()).or_default();
        if state.up_listen.as_deref() != Some(nonce.as_str()) {
            return Ok(SubmitStatus::Stale);
        }
        if state.up_data.is_some() {
            return Ok(SubmitStatus::AlreadyAnswered);
        }
        state.up_data = Some(payload.to_vec());
        Ok(SubmitStatus::Accepted)
    }

    async fn refresh_slave_token(
        &self,
        stream: &str,
        priority: Priority,
    ) -> Result<ElectionOutcome, Self::Error> {
        let mut streams = self.streams.lock().await;
        let state = streams.entry(stream.to_string()).or_default();
        match &state.slave_token {
            None => {
                state.slave_token = Some(priority.as_str().to_string());
                Ok(ElectionOutcome::Granted)
            }
            Some(_) if priority == Priority::High => {
                state.slave_token = Some(priority.as_str().to_string());
                Ok(ElectionOutcome::Granted)
            }
            Some(_) => Ok(ElectionOutcome::Denied),
        }
    }

    async fn subscribe(&self, stream: &str) -> Result<BoxStream<'static, Nonce>, Self::Error> {
        let sender = self.notifier_for(stream).await;
        let receiver = sender.subscribe();
        let stream = BroadcastStream::new(receiver).filter_map(|item| item.ok());
        Ok(Box::pin(stream))
    }
}
