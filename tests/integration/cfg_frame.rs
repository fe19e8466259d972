//! Scenario 5: a `CFG|...|GFC` settings frame overrides the next request
//! only; the request after that reverts to the endpoint's defaults.

use std::time::Duration;

use bridge_proto::DeviceSettings;
use bridge_test_support::{cfg_frame, run_one_slave_cycle, FakeBroker, Priority};
use broker::BrokerFacade;
use device_io::DeviceAction;
use master::config::{FramingConfig, ReadMode};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

/// Records the settings it was invoked with, so the test can assert the
/// override applied to exactly one request.
struct RecordingDevice {
    seen: std::sync::Arc<std::sync::Mutex<Vec<DeviceSettings>>>,
    reply: Vec<u8>,
}

impl DeviceAction for RecordingDevice {
    async fn act(&mut self, _payload: &[u8], settings: &DeviceSettings) -> Vec<u8> {
        self.seen.lock().unwrap().push(settings.clone());
        self.reply.clone()
    }
}

#[tokio::test]
async fn cfg_frame_settings_apply_to_exactly_one_request() {
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

    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let broker_for_slave = broker.clone();
    let seen_for_slave = seen.clone();
    let slave = tokio::spawn(async move {
        let mut device = RecordingDevice {
            seen: seen_for_slave,
            reply: b"R1".to_vec(),
        };
        let first =
            run_one_slave_cycle(&broker_for_slave, "analyzer1", Priority::High, &mut device).await;
        device.reply = b"R2".to_vec();
        let second =
            run_one_slave_cycle(&broker_for_slave, "analyzer1", Priority::High, &mut device).await;
        (first, second)
    });

    client
        .write_all(&cfg_frame(r#"{"Terminator":"\r","ReplyTimeout":500}"#, b"\n"))
        .await
        .unwrap();
    client.write_all(b"QUERY\n").await.unwrap();

    let mut buf = [0u8; 64];
    let n = client.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"R1\n");

    client.write_all(b"QUERY2\n").await.unwrap();
    let n = client.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"R2\n");

    drop(client);
    slave.await.unwrap();
    master.await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].terminator.as_deref(), Some("\r"));
    assert_eq!(seen[0].reply_timeout_ms, Some(500));
    assert_eq!(seen[1], DeviceSettings::empty());
}
