//! Frame struct with typed accessors.
//!
//! Represents a complete protocol frame with header and payload.
//! Uses `bytes::Bytes` for zero-copy payload sharing.
//!
//! # Example
//!
//! ```
//! use goridge_worker::protocol::{Frame, Header, flags};
//! use bytes::Bytes;
//!
//! let header = Header::new(flags::CODEC_RAW, 5);
//! let frame = Frame::new(header, Bytes::from_static(b"hello"));
//!
//! assert_eq!(frame.flags(), flags::CODEC_RAW);
//! assert_eq!(frame.payload(), b"hello");
//! ```

use bytes::Bytes;

use super::wire_format::{flags, EncodedHeader, Header};

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Create a frame from header and raw bytes (copies data).
    pub fn from_parts(header: Header, payload: &[u8]) -> Self {
        Self {
            header,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Get the flags byte.
    #[inline]
    pub fn flags(&self) -> u8 {
        self.header.flags
    }

    /// Get the header option words.
    #[inline]
    pub fn options(&self) -> &[u32] {
        self.header.options()
    }

    /// Check if this is a control frame.
    #[inline]
    pub fn is_control(&self) -> bool {
        flags::has_flag(self.header.flags, flags::CONTROL)
    }

    /// Check if this is an error frame.
    #[inline]
    pub fn is_error(&self) -> bool {
        flags::has_flag(self.header.flags, flags::ERROR)
    }
}

/// Build a complete frame as a single byte vector.
///
/// Use `build_frame_parts` for scatter/gather I/O (writev).
///
/// # Example
///
/// ```
/// use goridge_worker::protocol::{build_frame, Header, flags};
///
/// let header = Header::new(flags::CODEC_RAW, 5);
/// let bytes = build_frame(&header, b"hello");
/// assert_eq!(bytes.len(), 12 + 5);
/// ```
pub fn build_frame(header: &Header, payload: &[u8]) -> Vec<u8> {
    let encoded = header.encode();
    let mut buf = Vec::with_capacity(encoded.len() + payload.len());
    buf.extend_from_slice(&encoded);
    buf.extend_from_slice(payload);
    buf
}

/// Build frame parts for scatter/gather I/O.
///
/// Returns the encoded header and a reference to the payload.
pub fn build_frame_parts<'a>(header: &Header, payload: &'a [u8]) -> (EncodedHeader, &'a [u8]) {
    (header.encode(), payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HEADER_SIZE;

    #[test]
    fn test_frame_creation() {
        let header = Header::new(flags::CODEC_RAW, 5);
        let frame = Frame::new(header, Bytes::from_static(b"hello"));

        assert_eq!(frame.flags(), flags::CODEC_RAW);
        assert_eq!(frame.payload(), b"hello");
        assert_eq!(frame.payload_len(), 5);
        assert!(frame.options().is_empty());
    }

    #[test]
    fn test_frame_flag_accessors() {
        let control = Frame::new(Header::new(flags::CONTROL | flags::CODEC_JSON, 0), Bytes::new());
        assert!(control.is_control());
        assert!(!control.is_error());

        let error = Frame::from_parts(Header::new(flags::ERROR, 4), b"oops");
        assert!(error.is_error());
        assert!(!error.is_control());
    }

    #[test]
    fn test_build_frame() {
        let header = Header::new(flags::CODEC_RAW, 5);
        let bytes = build_frame(&header, b"hello");

        assert_eq!(bytes.len(), HEADER_SIZE + 5);

        let parsed = Header::decode(&bytes).unwrap().unwrap();
        assert_eq!(parsed, header);
        assert_eq!(&bytes[HEADER_SIZE..], b"hello");
    }

    #[test]
    fn test_build_frame_with_options() {
        let header = Header::new(flags::CODEC_RAW, 7).with_options(&[2]).unwrap();
        let bytes = build_frame(&header, b"{}hello");

        assert_eq!(bytes.len(), HEADER_SIZE + 4 + 7);
        assert_eq!(&bytes[HEADER_SIZE + 4..], b"{}hello");
    }

    #[test]
    fn test_build_frame_parts() {
        let header = Header::new(flags::CODEC_RAW, 5);
        let (header_bytes, payload_ref) = build_frame_parts(&header, b"hello");

        assert_eq!(header_bytes.len(), HEADER_SIZE);
        assert_eq!(payload_ref, b"hello");
    }

    #[test]
    fn test_build_frame_roundtrip() {
        use super::super::FrameBuffer;

        let header = Header::new(flags::CODEC_RAW, 10).with_options(&[3]).unwrap();
        let bytes = build_frame(&header, b"0123456789");

        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].options(), &[3]);
        assert_eq!(frames[0].payload(), b"0123456789");
    }
}
