// slave: fulfills rendezvous-protocol requests against a physical serial
// device.

use std::path::Path;
use std::time::Duration;

use broker::RedisBroker;
use clap::{Arg, Command};
use device_io::{SerialDeviceAction, SerialDeviceConfig};
use slave::config;
use slave::status_http::{StatusServer, SubsystemStatus};
use tracing::{error, info};

const DEVICE_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "slave starting");

    let matches = Command::new("rendezvous-bridge-slave")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serial-device endpoint for the rendezvous bridge")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("path to slave.toml (default: /etc/rendezvous-bridge/slave.toml)"),
        )
        .get_matches();

    let cfg = match matches.get_one::<String>("config") {
        Some(path) => config::load_config_from_path(Path::new(path)),
        None => config::load_config(),
    };
    let cfg = match cfg {
        Ok(cfg) => {
            info!(stream = %cfg.stream_name, device = %cfg.device.path, priority = %cfg.priority, "config loaded");
            cfg
        }
        Err(e) => {
            eprintln!("FATAL: failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let broker = match RedisBroker::connect(&cfg.broker.url).await {
        Ok(broker) => broker,
        Err(e) => {
            eprintln!("FATAL: failed to connect to broker: {e}");
            std::process::exit(1);
        }
    };

    let status_server = match StatusServer::start(
        &cfg.status_http.bind,
        SubsystemStatus::not_ready("waiting for device".to_owned()),
    )
    .await
    {
        Ok(server) => {
            info!(bind = %cfg.status_http.bind, "status http listening");
            server
        }
        Err(e) => {
            eprintln!("FATAL: failed to bind status http: {e}");
            std::process::exit(1);
        }
    };
    let status_handle = status_server.handle();

    while !Path::new(&cfg.device.path).exists() {
        error!(device = %cfg.device.path, "device path does not exist yet, retrying");
        tokio::time::sleep(DEVICE_POLL_INTERVAL).await;
    }
    info!(device = %cfg.device.path, "device path found");
    status_handle.set(SubsystemStatus::ready()).await;

    let device = SerialDeviceAction::new(SerialDeviceConfig {
        device_path: cfg.device.path.clone(),
        baud_rate: cfg.device.baud_rate,
        reply_timeout: cfg.device.reply_timeout,
        read_timeout: cfg.device.read_timeout,
        max_input: cfg.device.max_input,
        terminator: cfg.device.terminator.as_deref().map(|t| {
            bridge_proto::terminator::expand_symbolic(t)
        }),
    });

    let refresher = tokio::spawn(slave_arbiter::run_liveness_refresher(
        broker.clone(),
        cfg.stream_name.clone(),
        cfg.priority,
    ));
    let subscription = tokio::spawn(rendezvous::run_slave_subscription_loop(
        broker,
        cfg.stream_name.clone(),
        cfg.priority,
        device,
        cfg.reconnect_interval,
    ));

    let _ = tokio::join!(refresher, subscription);
}
