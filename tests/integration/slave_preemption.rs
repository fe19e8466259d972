//! Scenario 4: a LOW-priority slave holding the active-slave token is
//! preempted by a HIGH-priority slave within one refresh cycle, and stops
//! serving requests immediately afterward.

use std::time::Duration;

use bridge_proto::{DeviceSettings, Nonce, Priority};
use broker::BrokerFacade;
use device_io::EchoDeviceAction;
use rendezvous::{run_slave_round_trip, SlaveStepOutcome};
use slave_arbiter::refresh_once;

#[tokio::test]
async fn high_priority_slave_preempts_a_low_priority_holder() {
    let broker = bridge_test_support::FakeBroker::new();

    assert_eq!(
        refresh_once(&broker, "S", Priority::Low).await.unwrap(),
        broker::ElectionOutcome::Granted
    );

    let nonce = Nonce::now();
    broker
        .publish_request("S", b"Q", &DeviceSettings::empty(), &nonce)
        .await
        .unwrap();

    // LOW still owns the token: its pickup would have succeeded here.
    let pickup_before = broker.pickup("S", &nonce, Priority::Low).await.unwrap();
    assert!(pickup_before.is_some());
    let mut low_device = EchoDeviceAction::fixed_reply(b"FROM_LOW".to_vec());

    // HIGH starts and immediately claims the token (HIGH always wins).
    assert_eq!(
        refresh_once(&broker, "S", Priority::High).await.unwrap(),
        broker::ElectionOutcome::Granted
    );

    // LOW's next pickup attempt for the same nonce now fails.
    let outcome = run_slave_round_trip(&broker, "S", nonce.clone(), Priority::Low, &mut low_device)
        .await;
    assert_eq!(outcome, SlaveStepOutcome::PickupMissed);

    // HIGH serves the request instead.
    let mut high_device = EchoDeviceAction::fixed_reply(b"FROM_HIGH".to_vec());
    let outcome = run_slave_round_trip(&broker, "S", nonce, Priority::High, &mut high_device).await;
    assert_eq!(
        outcome,
        SlaveStepOutcome::Replied(broker::SubmitStatus::Accepted)
    );
    let reply = broker.consume_reply("S").await.unwrap();
    assert_eq!(reply, Some(b"FROM_HIGH".to_vec()));
}
