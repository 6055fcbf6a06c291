//! Wire format encoding and decoding.
//!
//! Implements the Goridge v3 frame header:
//! ```text
//! ┌─────────────┬───────┬────────────┬────────────┬──────────┬────────────────┐
//! │ Ver │ HL    │ Flags │ Length     │ CRC32      │ Reserved │ Options        │
//! │ 4b  │ 4b    │ 1 byte│ 4 bytes    │ 4 bytes    │ 2 bytes  │ (HL-3) × 4 B   │
//! │             │       │ uint32 LE  │ uint32 LE  │          │ uint32 LE each │
//! └─────────────┴───────┴────────────┴────────────┴──────────┴────────────────┘
//! ```
//!
//! HL is the header length in 32-bit words (minimum 3, maximum 15). The CRC
//! covers the first 6 bytes of the header. All integers are Little Endian.

use std::ops::Deref;

use crate::error::{Result, WorkerError};

/// Size of the 32-bit word the header length is measured in.
pub const WORD: usize = 4;

/// Fixed part of the header in bytes (3 words).
pub const HEADER_SIZE: usize = 12;

/// Largest header length expressible in the 4-bit HL field (15 words).
pub const MAX_HEADER_SIZE: usize = 15 * WORD;

/// Maximum number of option words a header can carry.
pub const MAX_OPTIONS: usize = (MAX_HEADER_SIZE - HEADER_SIZE) / WORD;

/// Protocol version written into every frame.
pub const VERSION: u8 = 1;

/// Default maximum payload size (1 GB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 1_073_741_824;

/// Minimum header length in words.
const MIN_HL: u8 = (HEADER_SIZE / WORD) as u8;

/// Flag constants for the protocol.
pub mod flags {
    /// Control frame, handled by the worker loop itself.
    pub const CONTROL: u8 = 0x01;
    /// Payload is raw bytes.
    pub const CODEC_RAW: u8 = 0x04;
    /// Payload is JSON.
    pub const CODEC_JSON: u8 = 0x08;
    /// Payload is MessagePack.
    pub const CODEC_MSGPACK: u8 = 0x10;
    /// Payload is Go `gob`; never produced by this crate.
    pub const CODEC_GOB: u8 = 0x20;
    /// Error frame: payload is a human-readable message.
    pub const ERROR: u8 = 0x40;
    /// Payload is protobuf; never produced by this crate.
    pub const CODEC_PROTO: u8 = 0x80;

    /// Every codec bit.
    pub const CODEC_MASK: u8 = CODEC_RAW | CODEC_JSON | CODEC_MSGPACK | CODEC_GOB | CODEC_PROTO;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol version (high nibble of byte 0).
    pub version: u8,
    /// Flags byte (see `flags` module).
    pub flags: u8,
    /// Payload length in bytes.
    pub payload_length: u32,
    options: [u32; MAX_OPTIONS],
    options_len: u8,
}

impl Header {
    /// Create a new header without options.
    pub fn new(flags: u8, payload_length: u32) -> Self {
        Self {
            version: VERSION,
            flags,
            payload_length,
            options: [0; MAX_OPTIONS],
            options_len: 0,
        }
    }

    /// Attach option words to the header.
    ///
    /// Fails if more than [`MAX_OPTIONS`] words are given.
    pub fn with_options(mut self, options: &[u32]) -> Result<Self> {
        if options.len() > MAX_OPTIONS {
            return Err(WorkerError::Protocol(format!(
                "Header options limited to {} words, got {}",
                MAX_OPTIONS,
                options.len()
            )));
        }
        self.options[..options.len()].copy_from_slice(options);
        self.options_len = options.len() as u8;
        Ok(self)
    }

    /// Option words carried after the fixed header.
    #[inline]
    pub fn options(&self) -> &[u32] {
        &self.options[..self.options_len as usize]
    }

    /// Header length in 32-bit words (the HL nibble).
    #[inline]
    pub fn header_words(&self) -> u8 {
        MIN_HL + self.options_len
    }

    /// Encoded header length in bytes, options included.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.header_words() as usize * WORD
    }

    /// CRC32 of the first 6 header bytes, as written on the wire.
    pub fn checksum(&self) -> u32 {
        crc32fast::hash(&self.prefix())
    }

    /// Check the CRC field of an encoded header against its first 6 bytes.
    ///
    /// `buf` must hold at least the fixed 12-byte header.
    pub fn verify_crc(buf: &[u8]) -> bool {
        buf.len() >= HEADER_SIZE
            && u32::from_le_bytes([buf[6], buf[7], buf[8], buf[9]]) == crc32fast::hash(&buf[..6])
    }

    fn prefix(&self) -> [u8; 6] {
        let len = self.payload_length.to_le_bytes();
        [
            (self.version << 4) | self.header_words(),
            self.flags,
            len[0],
            len[1],
            len[2],
            len[3],
        ]
    }

    /// Encode header to bytes, CRC and options included.
    ///
    /// # Example
    ///
    /// ```
    /// use goridge_worker::protocol::{Header, flags};
    ///
    /// let header = Header::new(flags::CODEC_RAW, 5);
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), 12);
    /// assert_eq!(bytes[0], 0x13);
    /// ```
    pub fn encode(&self) -> EncodedHeader {
        let mut buf = [0u8; MAX_HEADER_SIZE];
        let len = self.encode_into(&mut buf);
        EncodedHeader { buf, len }
    }

    /// Encode header into an existing buffer, returning the bytes written.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is smaller than [`Header::encoded_len`].
    pub fn encode_into(&self, buf: &mut [u8]) -> usize {
        let len = self.encoded_len();
        debug_assert!(buf.len() >= len);
        buf[0..6].copy_from_slice(&self.prefix());
        buf[6..10].copy_from_slice(&self.checksum().to_le_bytes());
        buf[10] = 0;
        buf[11] = 0;
        for (i, option) in self.options().iter().enumerate() {
            let at = HEADER_SIZE + i * WORD;
            buf[at..at + WORD].copy_from_slice(&option.to_le_bytes());
        }
        len
    }

    /// Decode a header from the start of `buf`.
    ///
    /// Returns `Ok(None)` while `buf` is shorter than the full header
    /// (fixed part plus declared options). Fails on a CRC mismatch or a
    /// header length below 3 words.
    ///
    /// # Example
    ///
    /// ```
    /// use goridge_worker::protocol::{Header, flags};
    ///
    /// let bytes = Header::new(flags::CODEC_RAW, 100).encode();
    /// let header = Header::decode(&bytes).unwrap().unwrap();
    /// assert_eq!(header.payload_length, 100);
    /// assert!(Header::decode(&bytes[..5]).unwrap().is_none());
    /// ```
    pub fn decode(buf: &[u8]) -> Result<Option<Self>> {
        if buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let hl = buf[0] & 0x0F;
        if hl < MIN_HL {
            return Err(WorkerError::Protocol(format!(
                "Header length {} words is below the minimum of {}",
                hl, MIN_HL
            )));
        }

        if !Self::verify_crc(buf) {
            return Err(WorkerError::Protocol(format!(
                "CRC mismatch: header says {:#010x}, computed {:#010x}",
                u32::from_le_bytes([buf[6], buf[7], buf[8], buf[9]]),
                crc32fast::hash(&buf[..6])
            )));
        }

        let header_len = hl as usize * WORD;
        if buf.len() < header_len {
            return Ok(None);
        }

        let mut options = [0u32; MAX_OPTIONS];
        let options_len = (hl - MIN_HL) as usize;
        for (i, slot) in options.iter_mut().take(options_len).enumerate() {
            let at = HEADER_SIZE + i * WORD;
            *slot = u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        }

        Ok(Some(Self {
            version: buf[0] >> 4,
            flags: buf[1],
            payload_length: u32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]),
            options,
            options_len: options_len as u8,
        }))
    }

    /// Validate the header for protocol compliance.
    ///
    /// Checks:
    /// - Version is the one this crate speaks
    /// - Payload length doesn't exceed max
    pub fn validate(&self, max_payload_size: u32) -> Result<()> {
        if self.version != VERSION {
            return Err(WorkerError::Protocol(format!(
                "Unsupported protocol version {}",
                self.version
            )));
        }

        if self.payload_length > max_payload_size {
            return Err(WorkerError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                self.payload_length, max_payload_size
            )));
        }

        Ok(())
    }

    /// Check if this is a control frame.
    #[inline]
    pub fn is_control(&self) -> bool {
        flags::has_flag(self.flags, flags::CONTROL)
    }

    /// Check if this is an error frame.
    #[inline]
    pub fn is_error(&self) -> bool {
        flags::has_flag(self.flags, flags::ERROR)
    }
}

/// Header bytes produced by [`Header::encode`], kept on the stack.
#[derive(Clone, Copy)]
pub struct EncodedHeader {
    buf: [u8; MAX_HEADER_SIZE],
    len: usize,
}

impl Deref for EncodedHeader {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl AsRef<[u8]> for EncodedHeader {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl std::fmt::Debug for EncodedHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_encode_decode_roundtrip() {
        let original = Header::new(flags::CODEC_RAW, 100)
            .with_options(&[7, 42])
            .unwrap();
        let encoded = original.encode();
        let decoded = Header::decode(&encoded).unwrap().unwrap();
        assert_eq!(original, decoded);
        assert_eq!(decoded.options(), &[7, 42]);
    }

    #[test]
    fn test_header_little_endian_byte_order() {
        let header = Header::new(flags::ERROR, 0x0A0B0C0D);
        let bytes = header.encode();

        // Version 1, HL 3
        assert_eq!(bytes[0], 0x13);
        assert_eq!(bytes[1], flags::ERROR);

        // Payload length in LE
        assert_eq!(&bytes[2..6], &[0x0D, 0x0C, 0x0B, 0x0A]);

        // CRC over the first six bytes, LE
        let crc = crc32fast::hash(&bytes[..6]);
        assert_eq!(&bytes[6..10], &crc.to_le_bytes());

        // Reserved
        assert_eq!(&bytes[10..12], &[0, 0]);
    }

    #[test]
    fn test_options_extend_header_length() {
        let header = Header::new(0, 0).with_options(&[0x01020304]).unwrap();
        let bytes = header.encode();

        assert_eq!(bytes.len(), HEADER_SIZE + WORD);
        assert_eq!(bytes[0] & 0x0F, 4);
        assert_eq!(&bytes[12..16], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_too_many_options_rejected() {
        let options = [0u32; MAX_OPTIONS + 1];
        let result = Header::new(0, 0).with_options(&options);
        assert!(result.is_err());

        let options = [9u32; MAX_OPTIONS];
        let header = Header::new(0, 0).with_options(&options).unwrap();
        assert_eq!(header.encoded_len(), MAX_HEADER_SIZE);
    }

    #[test]
    fn test_decode_too_short_buffer() {
        let bytes = Header::new(0, 0).encode();
        assert!(Header::decode(&bytes[..11]).unwrap().is_none());
    }

    #[test]
    fn test_decode_waits_for_options() {
        let bytes = Header::new(0, 0).with_options(&[1, 2]).unwrap().encode();
        assert!(Header::decode(&bytes[..HEADER_SIZE + 4]).unwrap().is_none());
        assert!(Header::decode(&bytes).unwrap().is_some());
    }

    #[test]
    fn test_decode_crc_mismatch_rejected() {
        let mut bytes = Header::new(flags::CODEC_RAW, 5).encode().to_vec();
        assert!(Header::verify_crc(&bytes));
        bytes[3] ^= 0xFF;
        assert!(!Header::verify_crc(&bytes));

        let result = Header::decode(&bytes);
        assert!(result.unwrap_err().to_string().contains("CRC mismatch"));
    }

    #[test]
    fn test_decode_short_header_length_rejected() {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0] = (VERSION << 4) | 2;
        let crc = crc32fast::hash(&bytes[..6]);
        bytes[6..10].copy_from_slice(&crc.to_le_bytes());

        let result = Header::decode(&bytes);
        assert!(result.unwrap_err().to_string().contains("below the minimum"));
    }

    #[test]
    fn test_validate_payload_too_large() {
        let header = Header::new(0, 1_000_000);
        let result = header.validate(100);
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_validate_version() {
        let mut header = Header::new(0, 0);
        assert!(header.validate(DEFAULT_MAX_PAYLOAD_SIZE).is_ok());

        header.version = 2;
        let result = header.validate(DEFAULT_MAX_PAYLOAD_SIZE);
        assert!(result.unwrap_err().to_string().contains("version"));
    }

    #[test]
    fn test_flag_values() {
        assert_eq!(flags::CONTROL, 0x01);
        assert_eq!(flags::CODEC_RAW, 0x04);
        assert_eq!(flags::CODEC_JSON, 0x08);
        assert_eq!(flags::CODEC_MSGPACK, 0x10);
        assert_eq!(flags::ERROR, 0x40);

        let header = Header::new(flags::CONTROL | flags::CODEC_JSON, 0);
        assert!(header.is_control());
        assert!(!header.is_error());
    }
}
