use bridge_proto::{Nonce, Priority};
use broker::{BrokerFacade, SubmitStatus};
use device_io::DeviceAction;
use futures_util::StreamExt;
use tracing::{debug, error, info};

/// Result of one slave-side round-trip attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaveStepOutcome {
    /// The atomic pickup check failed — no pending data, the active-slave
    /// token didn't match our priority, or the nonce was already stale.
    /// The source logs all three causes identically as a timeout; so do we.
    PickupMissed,
    /// The device action produced no bytes; nothing is submitted.
    NoReply,
    /// A reply was submitted; see [`SubmitStatus`] for the broker's
    /// acceptance verdict.
    Replied(SubmitStatus),
}

/// Handle one notification: PICKING_UP, PROCESSING, REPLYING.
pub async fn run_slave_round_trip<B, D>(
    broker: &B,
    stream: &str,
    nonce: Nonce,
    priority: Priority,
    device: &mut D,
) -> SlaveStepOutcome
where
    B: BrokerFacade,
    D: DeviceAction,
{
    let pickup = match broker.pickup(stream, &nonce, priority).await {
        Ok(pickup) => pickup,
        Err(e) => {
            error!(%stream, error = %e, "broker connection lost during pickup");
            None
        }
    };

    let Some((payload, settings)) = pickup else {
        info!(%stream, %nonce, "timeout (no pending data, lost election, or stale nonce)");
        return SlaveStepOutcome::PickupMissed;
    };

    let reply = device.act(&payload, &settings).await;
    if reply.is_empty() {
        return SlaveStepOutcome::NoReply;
    }

    match broker.submit_reply(stream, &nonce, &reply).await {
        Ok(status) => {
            debug!(%stream, %nonce, ?status, "submitted reply");
            SlaveStepOutcome::Replied(status)
        }
        Err(e) => {
            error!(%stream, error = %e, "broker connection lost submitting reply");
            SlaveStepOutcome::NoReply
        }
    }
}

/// Run the subscription loop forever: LISTENING, and one [`run_slave_round_trip`]
/// per notification. Reconnects the subscription after `reconnect_interval`
/// if the broker connection drops.
pub async fn run_slave_subscription_loop<B, D>(
    broker: B,
    stream: String,
    priority: Priority,
    mut device: D,
    reconnect_interval: std::time::Duration,
) where
    B: BrokerFacade,
    D: DeviceAction,
{
    loop {
        let mut nonces = match broker.subscribe(&stream).await {
            Ok(nonces) => nonces,
            Err(e) => {
                error!(%stream, error = %e, "broker connection lost subscribing, retrying");
                tokio::time::sleep(reconnect_interval).await;
                continue;
            }
        };

        while let Some(nonce) = nonces.next().await {
            run_slave_round_trip(&broker, &stream, nonce, priority, &mut device).await;
        }

        error!(%stream, "subscription stream ended, reconnecting");
        tokio::time::sleep(reconnect_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::FakeBroker;
    use bridge_proto::DeviceSettings;
    use device_io::EchoDeviceAction;

    #[tokio::test]
    async fn pickup_fails_with_no_pending_request() {
        let fake = FakeBroker::new();
        fake.refresh_slave_token("S", Priority::High).await.unwrap();
        let mut device = EchoDeviceAction::echo_payload();
        let outcome =
            run_slave_round_trip(&fake, "S", Nonce::now(), Priority::High, &mut device).await;
        assert_eq!(outcome, SlaveStepOutcome::PickupMissed);
    }

    #[tokio::test]
    async fn low_priority_pickup_fails_while_high_holds_the_token() {
        let fake = FakeBroker::new();
        fake.refresh_slave_token("S", Priority::High).await.unwrap();
        let nonce = Nonce::now();
        fake.publish_request("S", b"A", &DeviceSettings::empty(), &nonce)
            .await
            .unwrap();

        let mut device = EchoDeviceAction::echo_payload();
        let outcome = run_slave_round_trip(&fake, "S", nonce, Priority::Low, &mut device).await;
        assert_eq!(outcome, SlaveStepOutcome::PickupMissed);
    }

    #[tokio::test]
    async fn successful_pickup_submits_the_device_reply() {
        let fake = FakeBroker::new();
        fake.refresh_slave_token("S", Priority::High).await.unwrap();
        let nonce = Nonce::now();
        fake.publish_request("S", b"PING", &DeviceSettings::empty(), &nonce)
            .await
            .unwrap();

        let mut device = EchoDeviceAction::fixed_reply(b"PONG".to_vec());
        let outcome = run_slave_round_trip(&fake, "S", nonce, Priority::High, &mut device).await;
        assert_eq!(outcome, SlaveStepOutcome::Replied(SubmitStatus::Accepted));
    }

    #[tokio::test]
    async fn empty_device_reply_submits_nothing() {
        let fake = FakeBroker::new();
        fake.refresh_slave_token("S", Priority::High).await.unwrap();
        let nonce = Nonce::now();
        fake.publish_request("S", b"PING", &DeviceSettings::empty(), &nonce)
            .await
            .unwrap();

        let mut device = EchoDeviceAction::fixed_reply(Vec::new());
        let outcome = run_slave_round_trip(&fake, "S", nonce, Priority::High, &mut device).await;
        assert_eq!(outcome, SlaveStepOutcome::NoReply);
    }
}
