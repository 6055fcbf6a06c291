//! Single-writer frame output.
//!
//! The relay's write half is owned by exactly one [`FrameWriter`]; frames are
//! written whole (header, context, body) with scatter/gather I/O and flushed
//! before `write_frame` returns. There is no internal locking, so sharing one
//! output stream between several writers would interleave frames.
//!
//! ```text
//! Worker loop ─► FrameWriter::write_frame ─► write_vectored ─► flush ─► Relay
//! ```

use std::io::IoSlice;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::codec::JsonCodec;
use crate::error::{Result, WorkerError};
use crate::payload::Payload;
use crate::protocol::{flags, EncodedHeader, Header};

/// A frame ready to be written to the relay.
///
/// The wire payload is `context ++ payload`; keeping the two apart lets the
/// writer send them as separate slices without copying.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    /// Pre-encoded header, options included.
    pub header: EncodedHeader,
    /// Leading part of the wire payload (RoadRunner context).
    pub context: Bytes,
    /// Trailing part of the wire payload.
    pub payload: Bytes,
}

impl OutboundFrame {
    /// Create a new outbound frame. `header.payload_length` must match `payload`.
    #[inline]
    pub fn new(header: &Header, payload: Bytes) -> Self {
        Self {
            header: header.encode(),
            context: Bytes::new(),
            payload,
        }
    }

    /// Create a new outbound frame with empty payload.
    #[inline]
    pub fn empty(header: &Header) -> Self {
        Self::new(header, Bytes::new())
    }

    /// Pack a handler response: `options = [len(context)]`, codec flag from the payload.
    pub fn response(payload: Payload) -> Result<Self> {
        let total = payload.context.len() + payload.body.len();
        let length = u32::try_from(total).map_err(|_| {
            WorkerError::Protocol(format!("Response of {} bytes does not fit a frame", total))
        })?;

        let header = Header::new(payload.codec.flag(), length)
            .with_options(&[payload.context.len() as u32])?;

        Ok(Self {
            header: header.encode(),
            context: payload.context,
            payload: payload.body,
        })
    }

    /// Build an error frame carrying `message` as its payload.
    pub fn error(message: &str) -> Self {
        let body = Bytes::copy_from_slice(message.as_bytes());
        let header = Header::new(flags::ERROR, body.len() as u32);
        Self::new(&header, body)
    }

    /// Build a control frame with a JSON body.
    pub fn control<T: serde::Serialize>(value: &T) -> Result<Self> {
        let body = JsonCodec::encode(value)?;
        let header = Header::new(flags::CONTROL | flags::CODEC_JSON, body.len() as u32);
        Ok(Self::new(&header, Bytes::from(body)))
    }

    /// Total size of this frame on the wire.
    #[inline]
    pub fn size(&self) -> usize {
        self.header.len() + self.context.len() + self.payload.len()
    }

    fn parts(&self) -> [&[u8]; 3] {
        [&self.header, &self.context, &self.payload]
    }
}

/// Owner of the relay's write half.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wrap the output half of a relay.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one frame and flush it.
    ///
    /// Returns only after every byte has been handed to the stream and the
    /// stream has been flushed. Any I/O failure is a fatal write error.
    pub async fn write_frame(&mut self, frame: &OutboundFrame) -> Result<()> {
        write_frame_vectored(&mut self.writer, frame).await
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Write a frame using scatter/gather I/O (write_vectored).
///
/// Header, context and payload go out in one vectored write when the stream
/// accepts it; partial writes continue from where the stream stopped.
async fn write_frame_vectored<W>(writer: &mut W, frame: &OutboundFrame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total_size = frame.size();
    let mut total_written = 0;

    while total_written < total_size {
        let slices = build_remaining_slices(frame, total_written);
        let written = writer.write_vectored(&slices).await?;
        if written == 0 {
            return Err(WorkerError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        total_written += written;
    }

    writer.flush().await?;
    Ok(())
}

/// Build IoSlice array for the data after the first `skip_bytes` bytes.
fn build_remaining_slices(frame: &OutboundFrame, skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(3);
    let mut start = 0;

    for part in frame.parts() {
        let end = start + part.len();
        if !part.is_empty() && skip_bytes < end {
            let offset = skip_bytes.saturating_sub(start);
            slices.push(IoSlice::new(&part[offset..]));
        }
        start = end;
    }

    slices
}
