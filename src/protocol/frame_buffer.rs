//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForHeader`: Need the fixed 12 bytes plus any declared options
//! - `WaitingForPayload`: Header parsed, need N more payload bytes
//!
//! # Example
//!
//! ```
//! use goridge_worker::protocol::{build_frame, flags, FrameBuffer, Header};
//!
//! let mut buffer = FrameBuffer::new();
//! let bytes = build_frame(&Header::new(flags::CODEC_RAW, 2), b"hi");
//!
//! // Data arrives in chunks from the relay
//! assert!(buffer.push(&bytes[..7]).unwrap().is_empty());
//! let frames = buffer.push(&bytes[7..]).unwrap();
//! assert_eq!(frames[0].payload(), b"hi");
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE, WORD};
use super::Frame;
use crate::error::{Result, WorkerError};

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for the complete header (fixed part and options).
    WaitingForHeader,
    /// Header parsed, waiting for payload bytes.
    WaitingForPayload { header: Header, remaining: u32 },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// Uses a state machine to handle partial reads efficiently.
/// All data is stored in a single `BytesMut` buffer to minimize allocations.
pub struct FrameBuffer {
    /// Accumulated bytes from relay reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed payload size.
    max_payload_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 64KB, max payload: 1GB.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Create a new frame buffer with custom max payload size.
    pub fn with_max_payload(max_payload_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForHeader,
            max_payload_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns the complete frames in arrival order (may be empty if still
    /// waiting for data). Partial data is kept for the next push.
    ///
    /// # Errors
    ///
    /// Returns error on a bad header (CRC, length, version) or if the
    /// payload exceeds `max_payload_size`.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Try to extract a single frame from the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on a protocol violation
    pub fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match &self.state {
            State::WaitingForHeader => {
                let header = match Header::decode(&self.buffer)? {
                    Some(header) => header,
                    None => return Ok(None),
                };

                header.validate(self.max_payload_size)?;

                let _ = self.buffer.split_to(header.encoded_len());

                if header.payload_length == 0 {
                    return Ok(Some(Frame::new(header, Bytes::new())));
                }

                self.state = State::WaitingForPayload {
                    header,
                    remaining: header.payload_length,
                };

                self.try_extract_one()
            }

            State::WaitingForPayload { header, remaining } => {
                let remaining = *remaining as usize;

                if self.buffer.len() < remaining {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(remaining).freeze();
                let header = *header;

                self.state = State::WaitingForHeader;

                Ok(Some(Frame::new(header, payload)))
            }
        }
    }

    /// Append data to the buffer without extracting frames.
    ///
    /// Pair with [`FrameBuffer::try_extract_one`] to pull frames one at a time.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Check whether a frame has been started but not completed.
    ///
    /// A relay that closes while this is true has truncated a frame.
    pub fn is_mid_frame(&self) -> bool {
        matches!(self.state, State::WaitingForPayload { .. }) || !self.buffer.is_empty()
    }

    /// Describe what was missing when the relay closed mid-frame.
    pub fn truncation_error(&self) -> WorkerError {
        match &self.state {
            State::WaitingForPayload { remaining, .. } => WorkerError::Truncated {
                stage: "payload",
                expected: *remaining as usize,
                received: self.buffer.len(),
            },
            State::WaitingForHeader if self.buffer.len() < HEADER_SIZE => WorkerError::Truncated {
                stage: "header",
                expected: HEADER_SIZE,
                received: self.buffer.len(),
            },
            State::WaitingForHeader => WorkerError::Truncated {
                stage: "options",
                expected: (self.buffer[0] & 0x0F) as usize * WORD,
                received: self.buffer.len(),
            },
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{build_frame, flags};

    fn make_frame_bytes(flags: u8, options: &[u32], payload: &[u8]) -> Vec<u8> {
        let header = Header::new(flags, payload.len() as u32)
            .with_options(options)
            .unwrap();
        build_frame(&header, payload)
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let bytes = make_frame_bytes(flags::CODEC_RAW, &[], b"hello");

        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0].payload[..], b"hello");
        assert!(buffer.is_empty());
        assert!(!buffer.is_mid_frame());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();

        let mut combined = Vec::new();
        combined.extend(make_frame_bytes(0, &[], b"first"));
        combined.extend(make_frame_bytes(0, &[1], b"xsecond"));
        combined.extend(make_frame_bytes(0, &[], b"third"));

        let frames = buffer.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload(), b"first");
        assert_eq!(frames[1].payload(), b"xsecond");
        assert_eq!(frames[1].options(), &[1]);
        assert_eq!(frames[2].payload(), b"third");
    }

    #[test]
    fn test_fragmented_header() {
        let mut buffer = FrameBuffer::new();
        let bytes = make_frame_bytes(0, &[], b"test");

        let frames = buffer.push(&bytes[..5]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "WaitingForHeader");
        assert!(buffer.is_mid_frame());

        let frames = buffer.push(&bytes[5..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_options() {
        let mut buffer = FrameBuffer::new();
        let bytes = make_frame_bytes(0, &[4, 5], b"data");

        // Fixed header complete, options not yet
        let frames = buffer.push(&bytes[..HEADER_SIZE + 2]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "WaitingForHeader");

        let frames = buffer.push(&bytes[HEADER_SIZE + 2..]).unwrap();
        assert_eq!(frames[0].options(), &[4, 5]);
    }

    #[test]
    fn test_fragmented_payload() {
        let mut buffer = FrameBuffer::new();
        let payload = b"this is a longer payload that will be fragmented";
        let bytes = make_frame_bytes(0, &[], payload);

        let partial_len = HEADER_SIZE + 10;
        let frames = buffer.push(&bytes[..partial_len]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "WaitingForPayload");

        let frames = buffer.push(&bytes[partial_len..]).unwrap();
        assert_eq!(&frames[0].payload[..], payload);
    }

    #[test]
    fn test_empty_payload() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&make_frame_bytes(0, &[], b"")).unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].payload.is_empty());
    }

    #[test]
    fn test_large_payload() {
        let mut buffer = FrameBuffer::new();
        let payload = vec![0xAB; 1024 * 1024];

        let frames = buffer.push(&make_frame_bytes(0, &[], &payload)).unwrap();

        assert_eq!(frames[0].payload.len(), 1024 * 1024);
        assert!(frames[0].payload.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_max_payload_validation() {
        let mut buffer = FrameBuffer::with_max_payload(100);
        let header = Header::new(0, 1000);

        let result = buffer.push(&header.encode());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_corrupted_header_rejected() {
        let mut buffer = FrameBuffer::new();
        let mut bytes = make_frame_bytes(0, &[], b"hi");
        bytes[2] = 0x7F;

        assert!(buffer.push(&bytes).is_err());
    }

    #[test]
    fn test_truncation_error_stages() {
        let bytes = make_frame_bytes(0, &[9], b"payload");

        let mut buffer = FrameBuffer::new();
        buffer.push(&bytes[..4]).unwrap();
        assert!(matches!(
            buffer.truncation_error(),
            WorkerError::Truncated { stage: "header", expected: 12, received: 4 }
        ));

        let mut buffer = FrameBuffer::new();
        buffer.push(&bytes[..HEADER_SIZE + 1]).unwrap();
        assert!(matches!(
            buffer.truncation_error(),
            WorkerError::Truncated { stage: "options", expected: 16, .. }
        ));

        let mut buffer = FrameBuffer::new();
        buffer.push(&bytes[..HEADER_SIZE + 4 + 3]).unwrap();
        assert!(matches!(
            buffer.truncation_error(),
            WorkerError::Truncated { stage: "payload", expected: 7, received: 3 }
        ));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = FrameBuffer::new();
        let bytes = make_frame_bytes(0, &[], b"test");

        buffer.push(&bytes[..HEADER_SIZE]).unwrap();
        assert_eq!(buffer.state_name(), "WaitingForPayload");

        buffer.clear();

        assert_eq!(buffer.state_name(), "WaitingForHeader");
        assert!(!buffer.is_mid_frame());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let bytes = make_frame_bytes(0, &[2], b"{}hi");

        let mut all_frames = Vec::new();
        for byte in &bytes {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(&all_frames[0].payload[..], b"{}hi");
    }
}
