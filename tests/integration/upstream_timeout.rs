//! Scenario 2: no slave is present, so the master writes the `TOUT`
//! sentinel once `upstream_timeout` elapses.

use std::time::Duration;

use bridge_test_support::FakeBroker;
use master::config::{FramingConfig, ReadMode};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn absent_slave_produces_a_tout_reply() {
    let broker = FakeBroker::new();
    let framing = FramingConfig {
        read_mode: ReadMode::Terminated,
        terminator: "\n".to_owned(),
        buffer_size: 1,
        strip_terminator: true,
    };

    let (mut client, server) = duplex(256);
    let master = tokio::spawn(async move {
        master::socket::serve_connection(
            server,
            "analyzer1",
            &framing,
            Duration::from_secs(5),
            Duration::from_millis(200),
            &broker,
        )
        .await;
    });

    let started = std::time::Instant::now();
    client.write_all(b"X\n").await.unwrap();
    let mut buf = [0u8; 64];
    let n = client.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"TOUT\n");
    assert!(started.elapsed() >= Duration::from_millis(200));

    drop(client);
    master.await.unwrap();
}
