//! Socket relays.
//!
//! - TCP: any platform
//! - Unix Domain Socket: Unix only; other platforms get `InvalidRelay`

use std::path::Path;

use tokio::net::TcpStream;

use super::Relay;
use crate::error::Result;

/// Connect to a host listening on TCP.
pub async fn connect_tcp(addr: &str) -> Result<Relay> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    let (reader, writer) = stream.into_split();
    Ok(Relay::new(reader, writer))
}

/// Connect to a host listening on a Unix Domain Socket.
#[cfg(unix)]
pub async fn connect_unix(path: &Path) -> Result<Relay> {
    let stream = tokio::net::UnixStream::connect(path).await?;
    let (reader, writer) = stream.into_split();
    Ok(Relay::new(reader, writer))
}

/// Connect to a host listening on a Unix Domain Socket.
#[cfg(not(unix))]
pub async fn connect_unix(path: &Path) -> Result<Relay> {
    Err(crate::error::WorkerError::InvalidRelay(format!(
        "Unix sockets are not supported on this platform: {}",
        path.display()
    )))
}
