//! The rendezvous protocol: one master-side and one slave-side state
//! machine driving a request/reply round-trip over a [`broker::BrokerFacade`].
//!
//! Both sides are generic over the broker façade and (on the slave side)
//! the device action, so the exact same state machine code runs against a
//! production `redis` broker and a real serial port, or an in-memory fake
//! broker and an echoing test double.

mod master;
mod slave;

pub use master::{run_master_round_trip, MasterOutcome};
pub use slave::{run_slave_round_trip, run_slave_subscription_loop, SlaveStepOutcome};
