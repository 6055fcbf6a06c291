//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the Goridge v3 frame protocol:
//! - 12-byte header plus option words, with CRC32 over the header prefix
//! - Frame buffer for accumulating partial reads
//! - Frame struct with typed accessors

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{build_frame, build_frame_parts, Frame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{
    flags, EncodedHeader, Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE, MAX_HEADER_SIZE,
    MAX_OPTIONS, VERSION, WORD,
};
