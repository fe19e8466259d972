use std::time::Duration;

use bridge_proto::{DeviceSettings, Nonce, Priority};
use futures_util::stream::BoxStream;

/// Outcome of [`BrokerFacade::submit_reply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Reply accepted and stored at `S#up#data`.
    Accepted,
    /// The request nonce no longer matches `S#up#listen`; dropped silently.
    Stale,
    /// A reply for this nonce was already stored; dropped silently.
    AlreadyAnswered,
}

/// Outcome of [`BrokerFacade::refresh_slave_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionOutcome {
    /// The token was unset and this slave claimed it, or this slave is
    /// `High` priority and unconditionally holds the token now.
    Granted,
    /// A `Low` priority slave found the token already held by someone else.
    Denied,
}

/// Typed wrapper over the broker's primitive operations, scoped to one
/// stream's key family (`S#down#data`, `S#up#data`, `S#up#listen`,
/// `S#device#comm#settings`, `S#slave`).
///
/// This is the only layer that knows broker key names or talks the wire
/// protocol; the rendezvous state machines and the slave arbiter are
/// generic over this trait, so they can run against a real broker in
/// production and an in-memory fake in tests.
pub trait BrokerFacade: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Atomically: delete `S#up#data`; set `S#up#listen := nonce`; set
    /// `S#down#data := data`; publish `nonce` on channel `S#up#listen`; set
    /// `S#device#comm#settings := settings`.
    async fn publish_request(
        &self,
        stream: &str,
        data: &[u8],
        settings: &DeviceSettings,
        nonce: &Nonce,
    ) -> Result<(), Self::Error>;

    /// Poll `EXISTS S#up#data` with a short tick interval until it exists or
    /// `now - nonce.wall_time() > timeout`. Returns whether a reply arrived.
    async fn await_reply(
        &self,
        stream: &str,
        nonce: &Nonce,
        timeout: Duration,
    ) -> Result<bool, Self::Error>;

    /// Atomically delete `S#down#data` and `S#up#listen`, and return the
    /// current value of `S#up#data` (possibly absent).
    async fn consume_reply(&self, stream: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Atomic pickup check: returns the pending request iff it exists, the
    /// active-slave token equals `priority`, and `S#up#listen == nonce`.
    async fn pickup(
        &self,
        stream: &str,
        nonce: &Nonce,
        priority: Priority,
    ) -> Result<Option<(Vec<u8>, DeviceSettings)>, Self::Error>;

    /// Atomic submit check: rejects a stale nonce or a duplicate reply,
    /// otherwise stores `payload` at `S#up#data`.
    async fn submit_reply(
        &self,
        stream: &str,
        nonce: &Nonce,
        payload: &[u8],
    ) -> Result<SubmitStatus, Self::Error>;

    /// Atomic election step for the active-slave token at `S#slave`. See
    /// `slave-arbiter` for the refresher task that calls this every second.
    async fn refresh_slave_token(
        &self,
        stream: &str,
        priority: Priority,
    ) -> Result<ElectionOutcome, Self::Error>;

    /// Open a subscription to `S#up#listen`, yielding nonces as they're
    /// published.
    async fn subscribe(&self, stream: &str) -> Result<BoxStream<'static, Nonce>, Self::Error>;
}
