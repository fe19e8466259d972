//! Broker key-name scheme.
//!
//! Every key for a stream `S` is named `S#<suffix>`. These helpers are the
//! single place that knows the suffixes, so the broker façade (and nothing
//! else) ever builds a key string.

/// `S#down#data` — pending request payload, written by the master.
pub fn down_data(stream: &str) -> String {
    format!("{stream}#down#data")
}

/// `S#up#data` — reply payload, written by the slave.
pub fn up_data(stream: &str) -> String {
    format!("{stream}#up#data")
}

/// `S#up#listen` — current request nonce; doubles as the pub/sub channel
/// name slaves subscribe to for wake-up notifications.
pub fn up_listen(stream: &str) -> String {
    format!("{stream}#up#listen")
}

/// `S#device#comm#settings` — optional per-request device settings.
pub fn device_comm_settings(stream: &str) -> String {
    format!("{stream}#device#comm#settings")
}

/// `S#slave` — active-slave election token.
pub fn slave(stream: &str) -> String {
    format!("{stream}#slave")
}
