//! Codec module - interpretation of frame payloads.
//!
//! The codec of a payload travels in the frame flags. This module maps
//! those bits to a [`Codec`] and provides the structured codecs:
//!
//! - [`JsonCodec`] - JSON using `serde_json` (control frames, JSON payloads)
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde`
//!
//! Raw payloads need no codec; their bytes are handed over unchanged.
//!
//! # Example
//!
//! ```
//! use goridge_worker::codec::{Codec, JsonCodec, MsgPackCodec};
//! use goridge_worker::protocol::flags;
//!
//! assert_eq!(Codec::from_flags(flags::CODEC_JSON), Codec::Json);
//!
//! let encoded = MsgPackCodec::encode(&"hello").unwrap();
//! let decoded: String = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//!
//! let encoded = JsonCodec::encode(&[1, 2]).unwrap();
//! assert_eq!(encoded, b"[1,2]");
//! ```

mod json;
mod msgpack;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

use crate::protocol::flags;

/// Payload codec as announced by the frame flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    /// Opaque bytes.
    #[default]
    Raw,
    /// JSON document.
    Json,
    /// MessagePack document.
    MsgPack,
    /// Go `gob`; carried through but not decodable here.
    Gob,
    /// Protobuf; carried through but not decodable here.
    Proto,
}

impl Codec {
    /// Pick the codec from a flags byte.
    ///
    /// Frames that set no codec bit are treated as raw.
    pub fn from_flags(frame_flags: u8) -> Self {
        if flags::has_flag(frame_flags, flags::CODEC_JSON) {
            Codec::Json
        } else if flags::has_flag(frame_flags, flags::CODEC_MSGPACK) {
            Codec::MsgPack
        } else if flags::has_flag(frame_flags, flags::CODEC_PROTO) {
            Codec::Proto
        } else if flags::has_flag(frame_flags, flags::CODEC_GOB) {
            Codec::Gob
        } else {
            Codec::Raw
        }
    }

    /// The flag bit announcing this codec.
    pub fn flag(self) -> u8 {
        match self {
            Codec::Raw => flags::CODEC_RAW,
            Codec::Json => flags::CODEC_JSON,
            Codec::MsgPack => flags::CODEC_MSGPACK,
            Codec::Gob => flags::CODEC_GOB,
            Codec::Proto => flags::CODEC_PROTO,
        }
    }
}
