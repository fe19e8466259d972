// bridge-proto: shared wire/value types for the rendezvous bridge.
//
// Every layer of the bridge (framed-io, broker, rendezvous, slave-arbiter,
// the two service binaries) depends on this crate for the handful of small
// value types that must mean the same thing everywhere: the per-request
// nonce, the slave priority tag, and the per-request device settings frame.

pub mod keys;
pub mod nonce;
pub mod priority;
pub mod settings;
pub mod terminator;

pub use nonce::Nonce;
pub use priority::Priority;
pub use settings::DeviceSettings;
