//! Slave liveness / priority arbiter.
//!
//! Each slave process runs one of these refreshers as an independent
//! concurrent task, alongside its subscription loop (see `rendezvous`).
//! `High` priority always claims or re-claims the active-slave token;
//! `Low` priority claims only while the token is unset. The token carries a
//! 2-second lease, refreshed here every second — comfortably inside the
//! lease so a single missed tick doesn't lose the election.

use std::time::Duration;

use bridge_proto::Priority;
use broker::{BrokerFacade, ElectionOutcome};
use tracing::{debug, warn};

/// How often the refresher re-claims the token. Half the token's 2-second
/// TTL, so one skipped tick is still recoverable before the lease expires.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// One election step: attempt to claim or refresh the active-slave token
/// for `stream` at `priority`. Exposed separately from the loop driver so
/// tests can single-step the election without waiting on real time.
pub async fn refresh_once<B>(
    broker: &B,
    stream: &str,
    priority: Priority,
) -> Result<ElectionOutcome, B::Error>
where
    B: BrokerFacade,
{
    let outcome = broker.refresh_slave_token(stream, priority).await?;
    match outcome {
        ElectionOutcome::Granted => debug!(%stream, %priority, "holds active-slave token"),
        ElectionOutcome::Denied => debug!(%stream, %priority, "active-slave token held by another slave"),
    }
    Ok(outcome)
}

/// Run the refresher forever, ticking every [`REFRESH_INTERVAL`]. Intended
/// to be spawned as its own `tokio::task`, concurrent with the slave's
/// subscription loop — a slow device round-trip must never starve this.
pub async fn run_liveness_refresher<B>(broker: B, stream: String, priority: Priority)
where
    B: BrokerFacade,
{
    loop {
        if let Err(e) = refresh_once(&broker, &stream, priority).await {
            warn!(%stream, error = %e, "failed to refresh active-slave token");
        }
        tokio::time::sleep(REFRESH_INTERVAL).await;
    }
}
