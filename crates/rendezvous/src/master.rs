use std::time::Duration;

use bridge_proto::{DeviceSettings, Nonce};
use broker::BrokerFacade;
use tracing::{debug, error};

/// Result of one master-side round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterOutcome {
    /// A slave's reply, ready to write back to the local client.
    Reply(Vec<u8>),
    /// No reply arrived within `upstream_timeout`, or the broker connection
    /// failed; the caller writes the literal `TOUT` sentinel.
    Timeout,
}

/// Drive one request/reply round-trip: SENDING, WAITING, COLLECTING.
///
/// `consume_reply` runs unconditionally, whether or not a reply arrived —
/// this is what satisfies invariant I3 (`S#down#data`/`S#up#listen` cleared
/// before the master accepts its next request) even on a timeout.
pub async fn run_master_round_trip<B>(
    broker: &B,
    stream: &str,
    data: &[u8],
    settings: &DeviceSettings,
    upstream_timeout: Duration,
) -> MasterOutcome
where
    B: BrokerFacade,
{
    let nonce = Nonce::now();

    if let Err(e) = broker.publish_request(stream, data, settings, &nonce).await {
        error!(%stream, error = %e, "broker connection lost publishing request");
        return MasterOutcome::Timeout;
    }
    debug!(%stream, %nonce, "request published, waiting for reply");

    if let Err(e) = broker.await_reply(stream, &nonce, upstream_timeout).await {
        error!(%stream, error = %e, "broker connection lost awaiting reply");
        return MasterOutcome::Timeout;
    }

    match broker.consume_reply(stream).await {
        Ok(Some(reply)) => MasterOutcome::Reply(reply),
        Ok(None) => MasterOutcome::Timeout,
        Err(e) => {
            error!(%stream, error = %e, "broker connection lost consuming reply");
            MasterOutcome::Timeout
        }
    }
}
