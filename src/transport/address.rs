//! Relay address parsing.
//!
//! Hosts tell the worker how to reach them with a single string, usually in
//! the `RR_RELAY` environment variable:
//!
//! - `pipes` - stdin/stdout
//! - `tcp://127.0.0.1:6001`
//! - `unix:///tmp/rr.sock`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::WorkerError;

/// Where the relay lives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RelayAddress {
    /// Standard input and output of this process.
    #[default]
    Pipes,
    /// TCP socket, `host:port`.
    Tcp(String),
    /// Unix Domain Socket path.
    Unix(PathBuf),
}

impl FromStr for RelayAddress {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("pipes") || s.eq_ignore_ascii_case("pipe") {
            return Ok(RelayAddress::Pipes);
        }

        if let Some(addr) = s.strip_prefix("tcp://") {
            if addr.is_empty() || !addr.contains(':') {
                return Err(WorkerError::InvalidRelay(format!(
                    "TCP relay needs host:port, got {:?}",
                    s
                )));
            }
            return Ok(RelayAddress::Tcp(addr.to_string()));
        }

        if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(WorkerError::InvalidRelay(
                    "Unix relay needs a socket path".to_string(),
                ));
            }
            return Ok(RelayAddress::Unix(PathBuf::from(path)));
        }

        Err(WorkerError::InvalidRelay(format!(
            "Unknown relay {:?}, expected pipes, tcp://host:port or unix:///path",
            s
        )))
    }
}

impl fmt::Display for RelayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayAddress::Pipes => f.write_str("pipes"),
            RelayAddress::Tcp(addr) => write!(f, "tcp://{}", addr),
            RelayAddress::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pipes() {
        assert_eq!("pipes".parse::<RelayAddress>().unwrap(), RelayAddress::Pipes);
        assert_eq!(" PIPES ".parse::<RelayAddress>().unwrap(), RelayAddress::Pipes);
    }

    #[test]
    fn test_parse_tcp() {
        assert_eq!(
            "tcp://127.0.0.1:6001".parse::<RelayAddress>().unwrap(),
            RelayAddress::Tcp("127.0.0.1:6001".to_string())
        );
        assert!("tcp://localhost".parse::<RelayAddress>().is_err());
    }

    #[test]
    fn test_parse_unix() {
        assert_eq!(
            "unix:///tmp/rr.sock".parse::<RelayAddress>().unwrap(),
            RelayAddress::Unix(PathBuf::from("/tmp/rr.sock"))
        );
        assert!("unix://".parse::<RelayAddress>().is_err());
    }

    #[test]
    fn test_parse_unknown_scheme() {
        let err = "udp://1.2.3.4:5".parse::<RelayAddress>().unwrap_err();
        assert!(matches!(err, WorkerError::InvalidRelay(_)));
    }

    #[test]
    fn test_display_roundtrip() {
        for s in ["pipes", "tcp://127.0.0.1:7000", "unix:///var/run/rr.sock"] {
            let addr: RelayAddress = s.parse().unwrap();
            assert_eq!(addr.to_string(), s);
        }
    }
}
