//! Scenario 1: a master and a single slave complete one round-trip and
//! leave the broker's keys empty for the next request.

use std::time::Duration;

use bridge_test_support::{run_one_slave_cycle, EchoDeviceAction, FakeBroker, Priority};
use broker::BrokerFacade;
use master::config::{FramingConfig, ReadMode};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn master_writes_the_slave_reply_with_terminator_appended() {
    let broker = FakeBroker::new();
    broker
        .refresh_slave_token("analyzer1", Priority::High)
        .await
        .unwrap();

    let framing = FramingConfig {
        read_mode: ReadMode::Terminated,
        terminator: "\n".to_owned(),
        buffer_size: 1,
        strip_terminator: true,
    };

    let (mut client, server) = duplex(256);
    let broker_for_master = broker.clone();
    let master = tokio::spawn(async move {
        master::socket::serve_connection(
            server,
            "analyzer1",
            &framing,
            Duration::from_secs(5),
            Duration::from_secs(1),
            &broker_for_master,
        )
        .await;
    });

    let broker_for_slave = broker.clone();
    let slave = tokio::spawn(async move {
        let mut device = EchoDeviceAction::fixed_reply(b"PONG\r\n".to_vec());
        run_one_slave_cycle(&broker_for_slave, "analyzer1", Priority::High, &mut device).await
    });

    client.write_all(b"PING\n").await.unwrap();
    let mut buf = [0u8; 64];
    let n = client.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"PONG\r\n\n");

    drop(client);
    slave.await.unwrap();
    master.await.unwrap();

    // The round-trip consumed its own keys; a fresh pickup attempt for a
    // brand new nonce on the same stream sees no pending request.
    let pickup = broker
        .pickup(
            "analyzer1",
            &bridge_test_support::Nonce::now(),
            Priority::High,
        )
        .await
        .unwrap();
    assert!(pickup.is_none());
}
