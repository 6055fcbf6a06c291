//! Worker configuration.
//!
//! RoadRunner hands its settings to workers through the environment:
//!
//! - `RR_RELAY` - relay address (`pipes`, `tcp://host:port`, `unix:///path`);
//!   defaults to `pipes`
//! - `GORIDGE_MAX_PAYLOAD_SIZE` - largest inbound payload in bytes;
//!   defaults to 1 GiB

use crate::error::{Result, WorkerError};
use crate::protocol::DEFAULT_MAX_PAYLOAD_SIZE;
use crate::transport::RelayAddress;

/// Environment variable holding the relay address.
pub const RELAY_ENV: &str = "RR_RELAY";

/// Environment variable holding the inbound payload limit.
pub const MAX_PAYLOAD_ENV: &str = "GORIDGE_MAX_PAYLOAD_SIZE";

/// Settings needed to bootstrap a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Where to find the host.
    pub relay: RelayAddress,
    /// Inbound frames with a larger payload are rejected as malformed.
    pub max_payload_size: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            relay: RelayAddress::Pipes,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

impl WorkerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(relay) = lookup(RELAY_ENV).filter(|v| !v.trim().is_empty()) {
            config.relay = relay.parse()?;
        }

        if let Some(size) = lookup(MAX_PAYLOAD_ENV).filter(|v| !v.trim().is_empty()) {
            config.max_payload_size = size.trim().parse().map_err(|_| {
                WorkerError::Config(format!("{} must be a byte count, got {:?}", MAX_PAYLOAD_ENV, size))
            })?;
        }

        Ok(config)
    }
}
