//! Device action capability.
//!
//! A slave turns a request payload into a reply payload by invoking a
//! "device action" — a single-method capability rather than a subclassed
//! base class, following the teacher's preference for small trait-bound
//! capabilities over inheritance hierarchies. [`SerialDeviceAction`] is the
//! production implementation; [`EchoDeviceAction`] is a test double.

mod echo;
mod serial;

pub use echo::EchoDeviceAction;
pub use serial::{SerialDeviceAction, SerialDeviceConfig};

use bridge_proto::DeviceSettings;

/// The capability a slave invokes once it has picked up a request: turn a
/// payload into a reply, honoring whatever per-request settings override
/// the endpoint's configured defaults.
pub trait DeviceAction: Send {
    async fn act(&mut self, payload: &[u8], settings: &DeviceSettings) -> Vec<u8>;
}
