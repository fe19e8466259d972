//! Typed wrapper over the broker's primitive operations.
//!
//! [`BrokerFacade`] is the only layer that knows the key-name scheme from
//! `bridge_proto::keys` or speaks to the broker directly. The rendezvous and
//! slave-arbiter crates are generic over this trait so the same protocol
//! code runs against [`RedisBroker`] in production and [`FakeBroker`] in
//! tests.

mod facade;
mod fake;
mod redis_backed;

pub use facade::{BrokerFacade, ElectionOutcome, SubmitStatus};
pub use fake::FakeBroker;
pub use redis_backed::{BrokerError, RedisBroker};
