//! Scenario 6: length-prefixed framing reads exactly the declared number of
//! bytes and delivers them to the slave unchanged.

use std::time::Duration;

use bridge_test_support::{run_one_slave_cycle, EchoDeviceAction, FakeBroker, Priority};
use broker::BrokerFacade;
use master::config::{FramingConfig, ReadMode};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn length_prefixed_request_is_read_exactly_and_echoed() {
    let broker = FakeBroker::new();
    broker
        .refresh_slave_token("analyzer1", Priority::High)
        .await
        .unwrap();

    let framing = FramingConfig {
        read_mode: ReadMode::LengthPrefixed,
        terminator: "\n".to_owned(),
        buffer_size: 1,
        strip_terminator: false,
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
        let mut device = EchoDeviceAction::echo_payload();
        run_one_slave_cycle(&broker_for_slave, "analyzer1", Priority::High, &mut device).await
    });

    client.write_all(b"0007HELLO\r\n").await.unwrap();
    let mut buf = [0u8; 64];
    let n = client.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"HELLO\r\n\n");

    drop(client);
    slave.await.unwrap();
    master.await.unwrap();
}
