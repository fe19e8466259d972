//! Production [`BrokerFacade`] implementation backed by a `redis`-protocol
//! server, reached over an auto-reconnecting multiplexed connection.

use std::time::Duration;

use bridge_proto::{keys, DeviceSettings, Nonce, Priority};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use tracing::{debug, warn};

use crate::facade::{BrokerFacade, ElectionOutcome, SubmitStatus};

const DEFAULT_TICK: Duration = Duration::from_millis(1);
/// Active-slave token TTL, seconds. Matches the source's `EXPIRE_TIMER`.
const SLAVE_TOKEN_TTL_SECS: u64 = 2;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("device settings could not be serialized: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Atomic election script.
///
/// Replaces the source's malformed `SETEX key value seconds` call (which
/// transposes the value and TTL arguments) with the semantically intended
/// `SET key value EX seconds` for the HIGH-overwrite branch, and `SET key
/// value NX EX seconds` for the LOW claim branch.
const REFRESH_SLAVE_TOKEN_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if current == false then
    redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[3])
    return 1
end
if ARGV[1] == ARGV[2] then
    redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[3])
    return 1
end
return 0
"#;

/// Atomic pickup script: returns the pending request iff it exists, the
/// active-slave token matches our priority, and the listen nonce matches.
const PICKUP_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
local status = redis.call('GET', KEYS[3])
if status ~= ARGV[2] then
    return false
end
if redis.call('GET', KEYS[2]) ~= ARGV[1] then
    return false
end
return redis.call('GET', KEYS[1])
"#;

/// Atomic submit script: stale nonce -> -1, duplicate reply -> -2, else
/// stores the payload and returns 1.
const SUBMIT_REPLY_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) ~= ARGV[1] then
    return -1
end
if redis.call('EXISTS', KEYS[2]) == 1 then
    return -2
end
redis.call('SET', KEYS[2], ARGV[2])
return 1
"#;

#[derive(Clone)]
pub struct RedisBroker {
    client: Client,
    manager: ConnectionManager,
}

impl RedisBroker {
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self { client, manager })
    }
}

impl BrokerFacade for RedisBroker {
    type Error = BrokerError;

    async fn publish_request(
        &self,
        stream: &str,
        data: &[u8],
        settings: &DeviceSettings,
        nonce: &Nonce,
    ) -> Result<(), Self::Error> {
        let settings_bytes = settings.to_json_bytes();
        let mut conn = self.manager.clone();
        redis::pipe()
            .atomic()
            .del(keys::up_data(stream))
            .ignore()
            .set(keys::up_listen(stream), nonce.as_str())
            .ignore()
            .set(keys::down_data(stream), data)
            .ignore()
            .publish(keys::up_listen(stream), nonce.as_str())
            .ignore()
            .set(keys::device_comm_settings(stream), settings_bytes)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        debug!(%stream, %nonce, "published request");
        Ok(())
    }

    async fn await_reply(
        &self,
        stream: &str,
        nonce: &Nonce,
        timeout: Duration,
    ) -> Result<bool, Self::Error> {
        let mut conn = self.manager.clone();
        loop {
            let exists: bool = conn.exists(keys::up_data(stream)).await?;
            if exists {
                return Ok(true);
            }
            if nonce.elapsed() > timeout {
                return Ok(false);
            }
            tokio::time::sleep(DEFAULT_TICK).await;
        }
    }

    async fn consume_reply(&self, stream: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut conn = self.manager.clone();
        let (_, _, reply): (i64, i64, Option<Vec<u8>>) = redis::pipe()
            .atomic()
            .del(keys::down_data(stream))
            .del(keys::up_listen(stream))
            .get(keys::up_data(stream))
            .query_async(&mut conn)
            .await?;
        Ok(reply)
    }

    async fn pickup(
        &self,
        stream: &str,
        nonce: &Nonce,
        priority: Priority,
    ) -> Result<Option<(Vec<u8>, DeviceSettings)>, Self::Error> {
        let mut conn = self.manager.clone();
        let payload: Option<Vec<u8>> = Script::new(PICKUP_SCRIPT)
            .key(keys::down_data(stream))
            .key(keys::up_listen(stream))
            .key(keys::slave(stream))
            .arg(nonce.as_str())
            .arg(priority.as_str())
            .invoke_async(&mut conn)
            .await?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        let settings_bytes: Option<Vec<u8>> =
            conn.get(keys::device_comm_settings(stream)).await?;
        let settings = match settings_bytes {
            Some(bytes) => DeviceSettings::from_json_bytes(&bytes).unwrap_or_else(|e| {
                warn!(error = %e, "unparseable device settings, ignoring");
                DeviceSettings::empty()
            }),
            None => DeviceSettings::empty(),
        };

        Ok(Some((payload, settings)))
    }

    async fn submit_reply(
        &self,
        stream: &str,
        nonce: &Nonce,
        payload: &[u8],
    ) -> Result<SubmitStatus, Self::Error> {
        let mut conn = self.manager.clone();
        let status: i64 = Script::new(SUBMIT_REPLY_SCRIPT)
            .key(keys::up_listen(stream))
            .key(keys::up_data(stream))
            .arg(nonce.as_str())
            .arg(payload)
            .invoke_async(&mut conn)
            .await?;
        Ok(match status {
            1 => SubmitStatus::Accepted,
            -2 => SubmitStatus::AlreadyAnswered,
            _ => SubmitStatus::Stale,
        })
    }

    async fn refresh_slave_token(
        &self,
        stream: &str,
        priority: Priority,
    ) -> Result<ElectionOutcome, Self::Error> {
        let mut conn = self.manager.clone();
        let status: i64 = Script::new(REFRESH_SLAVE_TOKEN_SCRIPT)
            .key(keys::slave(stream))
            .arg(priority.as_str())
            .arg(Priority::High.as_str())
            .arg(SLAVE_TOKEN_TTL_SECS)
            .invoke_async(&mut conn)
            .await?;
        Ok(if status == 1 {
            ElectionOutcome::Granted
        } else {
            ElectionOutcome::Denied
        })
    }

    async fn subscribe(&self, stream: &str) -> Result<BoxStream<'static, Nonce>, Self::Error> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(keys::up_listen(stream)).await?;
        let nonces = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: redis::RedisResult<String> = msg.get_payload();
            match payload {
                Ok(text) => text.parse::<Nonce>().ok(),
                Err(e) => {
                    warn!(error = %e, "dropping unparseable pubsub payload");
                    None
                }
            }
        });
        Ok(Box::pin(nonces))
    }
}
