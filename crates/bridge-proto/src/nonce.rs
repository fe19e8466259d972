use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Width of the seconds field, wide enough to hold a Unix timestamp for
/// several millennia without the field ever growing — this is what keeps
/// byte-wise and numeric ordering in agreement.
const SECONDS_WIDTH: usize = 12;
const NANOS_WIDTH: usize = 9;

/// A per-request nonce: the master's wall-clock time at request publication,
/// serialized as fixed-width zero-padded decimal text (`secs.nanos`).
///
/// Fixed width makes byte-wise string comparison agree with numeric
/// ordering, which is what lets the wire format stay plain text while still
/// supporting `<`/`>` comparisons if a caller ever needs them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseNonceError;

impl fmt::Display for ParseNonceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("nonce must be fixed-width \"secs.nanos\" decimal text")
    }
}

impl std::error::Error for ParseNonceError {}

impl Nonce {
    pub fn from_system_time(t: SystemTime) -> Self {
        let since_epoch = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        Self(format!(
            "{:0secs_w$}.{:0nanos_w$}",
            since_epoch.as_secs(),
            since_epoch.subsec_nanos(),
            secs_w = SECONDS_WIDTH,
            nanos_w = NANOS_WIDTH,
        ))
    }

    /// Mint a nonce from the current wall-clock time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The wall-clock instant this nonce encodes, if it parses cleanly.
    pub fn wall_time(&self) -> Option<SystemTime> {
        let (secs_text, nanos_text) = self.0.split_once('.')?;
        let secs: u64 = secs_text.parse().ok()?;
        let nanos: u32 = nanos_text.parse().ok()?;
        Some(UNIX_EPOCH + Duration::new(secs, nanos))
    }

    /// Time elapsed since this nonce's encoded wall-clock time. Used by
    /// `await_reply` to bound the wait on `now - nonce_wall_time > timeout`.
    pub fn elapsed(&self) -> Duration {
        match self.wall_time() {
            Some(t) => SystemTime::now()
                .duration_since(t)
                .unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Nonce {
    type Err = ParseNonceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = Nonce(s.to_string());
        if candidate.wall_time().is_some() {
            Ok(candidate)
        } else {
            Err(ParseNonceError)
        }
    }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
