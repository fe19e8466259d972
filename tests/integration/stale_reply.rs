//! Scenario 3: a slow slave's reply for an expired request is rejected as
//! stale once the master has moved on to a new request on the same stream.

use std::time::Duration;

use bridge_proto::{DeviceSettings, Nonce, Priority};
use broker::{BrokerFacade, SubmitStatus};
use device_io::{DeviceAction, EchoDeviceAction};
use rendezvous::{run_slave_round_trip, SlaveStepOutcome};

struct SlowFixedDevice {
    delay: Duration,
    reply: Vec<u8>,
}

impl DeviceAction for SlowFixedDevice {
    async fn act(&mut self, _payload: &[u8], _settings: &DeviceSettings) -> Vec<u8> {
        tokio::time::sleep(self.delay).await;
        self.reply.clone()
    }
}

#[tokio::test]
async fn late_reply_for_an_expired_request_is_dropped_as_stale() {
    let broker = bridge_test_support::FakeBroker::new();
    broker
        .refresh_slave_token("S", Priority::High)
        .await
        .unwrap();

    let nonce1 = Nonce::now();
    broker
        .publish_request("S", b"M1", &DeviceSettings::empty(), &nonce1)
        .await
        .unwrap();

    let broker_for_slave1 = broker.clone();
    let nonce1_for_slave = nonce1.clone();
    let slave1 = tokio::spawn(async move {
        let mut device = SlowFixedDevice {
            delay: Duration::from_millis(1500),
            reply: b"R1".to_vec(),
        };
        run_slave_round_trip(&broker_for_slave1, "S", nonce1_for_slave, Priority::High, &mut device)
            .await
    });

    let got_reply = broker
        .await_reply("S", &nonce1, Duration::from_secs(1))
        .await
        .unwrap();
    assert!(!got_reply, "slave should not have replied within 1s");
    let reply1 = broker.consume_reply("S").await.unwrap();
    assert!(reply1.is_none());

    let nonce2 = Nonce::now();
    broker
        .publish_request("S", b"M2", &DeviceSettings::empty(), &nonce2)
        .await
        .unwrap();

    let broker_for_slave2 = broker.clone();
    let nonce2_for_slave = nonce2.clone();
    let slave2 = tokio::spawn(async move {
        let mut device = EchoDeviceAction::fixed_reply(b"R2".to_vec());
        run_slave_round_trip(&broker_for_slave2, "S", nonce2_for_slave, Priority::High, &mut device)
            .await
    });

    let got_reply2 = broker
        .await_reply("S", &nonce2, Duration::from_secs(1))
        .await
        .unwrap();
    assert!(got_reply2, "slave2 should reply promptly");
    let reply2 = broker.consume_reply("S").await.unwrap();
    assert_eq!(reply2, Some(b"R2".to_vec()));

    assert_eq!(
        slave1.await.unwrap(),
        SlaveStepOutcome::Replied(SubmitStatus::Stale)
    );
    assert_eq!(
        slave2.await.unwrap(),
        SlaveStepOutcome::Replied(SubmitStatus::Accepted)
    );
}
