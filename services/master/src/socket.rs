//! Master endpoint: a single Unix stream socket connection at a time.
//!
//! Accept loop binds the socket (removing a stale file left behind by a
//! previous run), then serially: read a framed request, run the master
//! side of the rendezvous protocol, write `reply + terminator` (or
//! `TOUT + terminator`) back.

use std::path::Path;
use std::time::Duration;

use bridge_proto::{terminator::expand_symbolic, DeviceSettings};
use broker::BrokerFacade;
use framed_io::{read_length_prefixed, read_terminated, Frame, FramedReadError, TerminatorReadOptions};
use rendezvous::{run_master_round_trip, MasterOutcome};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixListener;
use tracing::{debug, info, warn};

use crate::config::{FramingConfig, ReadMode};

const CFG_PREFIX: &[u8] = b"CFG|";
const CFG_SUFFIX: &[u8] = b"|GFC";

/// Bind the Unix socket (removing a stale file first) and accept
/// connections forever, serving each one to completion before accepting
/// the next — matching the source's one-connection-at-a-time contract.
pub async fn serve<B>(
    socket_path: &str,
    stream_name: &str,
    framing: &FramingConfig,
    socket_timeout: Duration,
    upstream_timeout: Duration,
    broker: &B,
) -> std::io::Result<()>
where
    B: BrokerFacade,
{
    if Path::new(socket_path).exists() {
        std::fs::remove_file(socket_path)?;
    }
    let listener = UnixListener::bind(socket_path)?;
    info!(path = socket_path, "master socket bound");

    loop {
        let (conn, _addr) = listener.accept().await?;
        info!(path = socket_path, "client connected");
        serve_connection(
            conn,
            stream_name,
            framing,
            socket_timeout,
            upstream_timeout,
            broker,
        )
        .await;
        info!(path = socket_path, "client disconnected");
    }
}

/// Serve one client connection to completion: loop reading framed
/// requests and driving one round-trip each, until the client closes the
/// connection or an I/O error tears it down.
pub async fn serve_connection<S, B>(
    mut conn: S,
    stream_name: &str,
    framing: &FramingConfig,
    socket_timeout: Duration,
    upstream_timeout: Duration,
    broker: &B,
) where
    S: AsyncRead + AsyncWrite + Unpin,
    B: BrokerFacade,
{
    let terminator = expand_symbolic(&framing.terminator);

    loop {
        let raw = match read_frame(&mut conn, framing, socket_timeout).await {
            Ok(Frame::Message(bytes)) => bytes,
            Ok(Frame::Eof) => {
                debug!("client closed connection");
                return;
            }
            Err(e) => {
                warn!(error = %e, "error reading request, dropping connection");
                return;
            }
        };

        let (settings, payload) = match extract_cfg_settings(&raw) {
            Some(settings_bytes) => match read_frame(&mut conn, framing, socket_timeout).await {
                Ok(Frame::Message(bytes)) => {
                    let settings = DeviceSettings::from_json_bytes(&settings_bytes)
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "unparseable CFG settings, using defaults");
                            DeviceSettings::empty()
                        });
                    (settings, bytes)
                }
                Ok(Frame::Eof) => {
                    debug!("client closed connection after CFG frame");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "error reading request after CFG frame");
                    return;
                }
            },
            None => (DeviceSettings::empty(), raw),
        };

        let outcome =
            run_master_round_trip(broker, stream_name, &payload, &settings, upstream_timeout)
                .await;
        let reply = match outcome {
            MasterOutcome::Reply(bytes) => bytes,
            MasterOutcome::Timeout => b"TOUT".to_vec(),
        };

        if let Err(e) = write_reply(&mut conn, &reply, &terminator).await {
            warn!(error = %e, "failed writing reply, dropping connection");
            return;
        }
    }
}

/// If `frame` is a `CFG|<settings>|GFC` wrapper, return the settings bytes
/// between the markers; the real request follows as the next frame.
fn extract_cfg_settings(frame: &[u8]) -> Option<Vec<u8>> {
    if frame.starts_with(CFG_PREFIX) && frame.ends_with(CFG_SUFFIX) {
        let inner = &frame[CFG_PREFIX.len()..frame.len() - CFG_SUFFIX.len()];
        Some(inner.to_vec())
    } else {
        None
    }
}

async fn read_frame<S>(
    conn: &mut S,
    framing: &FramingConfig,
    socket_timeout: Duration,
) -> Result<Frame, FramedReadError>
where
    S: AsyncRead + Unpin,
{
    match framing.read_mode {
        ReadMode::LengthPrefixed => read_length_prefixed(conn).await,
        ReadMode::Terminated => {
            let opts = TerminatorReadOptions {
                terminator: expand_symbolic(&framing.terminator),
                buffer_size: framing.buffer_size,
                strip_terminator: framing.strip_terminator,
                timeout: socket_timeout,
            };
            read_terminated(conn, &opts).await
        }
    }
}

async fn write_reply<S>(conn: &mut S, reply: &[u8], terminator: &[u8]) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    conn.write_all(reply).await?;
    conn.write_all(terminator).await?;
    Ok(())
}
