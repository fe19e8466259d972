// master: bridges a local Unix socket client to a device slave over the
// broker's rendezvous protocol.

use std::path::Path;

use broker::RedisBroker;
use clap::{Arg, Command};
use master::config;
use master::status_http::{StatusServer, SubsystemStatus};
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "master starting");

    let matches = Command::new("rendezvous-bridge-master")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Unix-socket endpoint for the rendezvous bridge")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("path to master.toml (default: /etc/rendezvous-bridge/master.toml)"),
        )
        .get_matches();

    let cfg = match matches.get_one::<String>("config") {
        Some(path) => config::load_config_from_path(Path::new(path)),
        None => config::load_config(),
    };
    let cfg = match cfg {
        Ok(cfg) => {
            info!(stream = %cfg.stream_name, socket = %cfg.socket.path, "config loaded");
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

    let _status = match StatusServer::start(&cfg.status_http.bind, SubsystemStatus::ready()).await
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

    if let Err(e) = master::socket::serve(
        &cfg.socket.path,
        &cfg.stream_name,
        &cfg.framing,
        cfg.socket.socket_timeout,
        cfg.socket.upstream_timeout,
        &broker,
    )
    .await
    {
        eprintln!("FATAL: master socket server failed: {e}");
        std::process::exit(1);
    }
}
