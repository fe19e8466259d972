//! Shared test helpers for the rendezvous bridge's integration suites.
//!
//! Nothing here ships in production; it exists so `tests/integration/*`
//! and each crate's own test modules don't re-derive the same
//! subscribe-then-run-one-cycle boilerplate.

pub use bridge_proto::{DeviceSettings, Nonce, Priority};
pub use broker::FakeBroker;
pub use device_io::EchoDeviceAction;

use broker::BrokerFacade;
use device_io::DeviceAction;
use futures_util::StreamExt;
use rendezvous::SlaveStepOutcome;

/// Build the in-band settings-override frame a client sends ahead of a
/// request: `CFG|<json>|GFC`, terminated like an ordinary request.
pub fn cfg_frame(settings_json: &str, terminator: &[u8]) -> Vec<u8> {
    let mut frame = format!("CFG|{settings_json}|GFC").into_bytes();
    frame.extend_from_slice(terminator);
    frame
}

/// Wait for the next published nonce on `stream` and run exactly one slave
/// round-trip against it. Panics if no notification arrives — tests that
/// use this are asserting a slave *does* see the request.
pub async fn run_one_slave_cycle<B, D>(
    broker: &B,
    stream: &str,
    priority: Priority,
    device: &mut D,
) -> SlaveStepOutcome
where
    B: BrokerFacade,
    D: DeviceAction,
{
    let mut nonces = broker.subscribe(stream).await.expect("subscribe succeeds");
    let nonce = nonces
        .next()
        .await
        .expect("a nonce should have been published");
    rendezvous::run_slave_round_trip(broker, stream, nonce, priority, device).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cfg_frame_wraps_settings_json_with_markers() {
        let frame = cfg_frame(r#"{"Terminator":"\r"}"#, b"\n");
        let mut expected = br#"CFG|{"Terminator":"\r"}|GFC"#.to_vec();
        expected.push(b'\n');
        assert_eq!(frame, expected);
    }
}
