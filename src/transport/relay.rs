//! Duplex relay to the host.
//!
//! A [`Relay`] owns both halves of the stream plus the incremental decoder
//! state. Reads return one whole frame at a time; writes go through the
//! single [`FrameWriter`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use super::{connect_tcp, connect_unix, RelayAddress};
use crate::error::Result;
use crate::protocol::{Frame, FrameBuffer, DEFAULT_MAX_PAYLOAD_SIZE};
use crate::writer::{FrameWriter, OutboundFrame};

/// Read chunk size.
const READ_CHUNK_SIZE: usize = 64 * 1024;

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// One logical duplex connection to the host.
pub struct Relay {
    reader: BoxedReader,
    writer: FrameWriter<BoxedWriter>,
    frames: FrameBuffer,
    chunk: Vec<u8>,
}

impl Relay {
    /// Build a relay from any read and write halves.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: FrameWriter::new(Box::new(writer)),
            frames: FrameBuffer::with_max_payload(DEFAULT_MAX_PAYLOAD_SIZE),
            chunk: vec![0u8; READ_CHUNK_SIZE],
        }
    }

    /// Relay over this process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Open the relay described by `address`.
    pub async fn connect(address: &RelayAddress) -> Result<Self> {
        match address {
            RelayAddress::Pipes => Ok(Self::stdio()),
            RelayAddress::Tcp(addr) => connect_tcp(addr).await,
            RelayAddress::Unix(path) => connect_unix(path).await,
        }
    }

    /// Replace the inbound payload limit. Any buffered bytes are discarded.
    pub fn with_max_payload(mut self, max_payload_size: u32) -> Self {
        self.frames = FrameBuffer::with_max_payload(max_payload_size);
        self
    }

    /// Read the next complete frame.
    ///
    /// Returns `Ok(None)` when the host closes the stream between frames.
    /// A close in the middle of a frame is a `Truncated` error; a bad header
    /// or oversize payload is a `Protocol` error.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.frames.try_extract_one()? {
                return Ok(Some(frame));
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                if self.frames.is_mid_frame() {
                    return Err(self.frames.truncation_error());
                }
                return Ok(None);
            }

            self.frames.extend(&self.chunk[..n]);
        }
    }

    /// Write one frame and flush it.
    pub async fn write_frame(&mut self, frame: &OutboundFrame) -> Result<()> {
        self.writer.write_frame(frame).await
    }
}
