//! Transport module - the relay between worker and host.
//!
//! Provides:
//! - [`Relay`] - one duplex byte stream split into read and write halves
//! - [`RelayAddress`] - `pipes`, `tcp://host:port` or `unix:///path`
//! - Socket connectors for TCP and Unix Domain Sockets (Linux/macOS)

mod address;
mod relay;
mod socket;

pub use address::RelayAddress;
pub use relay::Relay;
pub use socket::{connect_tcp, connect_unix};
