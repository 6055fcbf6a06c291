//! Application-level request and response unit.
//!
//! A RoadRunner frame packs `context ++ body` into its payload and records
//! the context length in the first header option. [`Payload`] is the
//! unpacked view handed to handlers and returned from them.
//!
//! # Example
//!
//! ```
//! use goridge_worker::Payload;
//!
//! let payload = Payload::with_context("hello", r#"{"status":200}"#);
//! assert_eq!(payload.body(), b"hello");
//! assert_eq!(payload.context(), br#"{"status":200}"#);
//! ```

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Codec, JsonCodec, MsgPackCodec};
use crate::error::{Result, WorkerError};
use crate::protocol::Frame;

/// Decoded payload: body, optional context and the codec of the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Main body bytes.
    pub body: Bytes,
    /// Out-of-band metadata (e.g. serialized headers); empty when absent.
    pub context: Bytes,
    /// How the body is encoded.
    pub codec: Codec,
}

impl Payload {
    /// Create a raw payload with an empty context.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            context: Bytes::new(),
            codec: Codec::Raw,
        }
    }

    /// Create a raw payload carrying a context.
    pub fn with_context(body: impl Into<Bytes>, context: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            context: context.into(),
            codec: Codec::Raw,
        }
    }

    /// Create a payload whose body is `value` encoded as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            body: Bytes::from(JsonCodec::encode(value)?),
            context: Bytes::new(),
            codec: Codec::Json,
        })
    }

    /// Create a payload whose body is `value` encoded as MessagePack.
    pub fn msgpack<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            body: Bytes::from(MsgPackCodec::encode(value)?),
            context: Bytes::new(),
            codec: Codec::MsgPack,
        })
    }

    /// Replace the context.
    pub fn context_bytes(mut self, context: impl Into<Bytes>) -> Self {
        self.context = context.into();
        self
    }

    /// Body bytes.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Context bytes.
    #[inline]
    pub fn context(&self) -> &[u8] {
        &self.context
    }

    /// Body as UTF-8 text, if it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Decode the body with the codec announced by the frame.
    ///
    /// Raw bodies are decoded as JSON, which is what RoadRunner plugins
    /// usually send without setting a codec bit.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match self.codec {
            Codec::Raw | Codec::Json => JsonCodec::decode(&self.body),
            Codec::MsgPack => MsgPackCodec::decode(&self.body),
            other => Err(WorkerError::Protocol(format!(
                "Cannot decode {:?} payload body",
                other
            ))),
        }
    }

    /// Decode the context as JSON.
    pub fn decode_context<T: DeserializeOwned>(&self) -> Result<T> {
        JsonCodec::decode(&self.context)
    }

    /// Unpack a request frame into a payload.
    ///
    /// The first option word, when present, is the context length. Fails if
    /// it points past the end of the frame payload.
    pub fn from_frame(frame: Frame) -> Result<Self> {
        let codec = Codec::from_flags(frame.flags());
        let context_len = frame.options().first().copied().unwrap_or(0) as usize;

        if context_len > frame.payload_len() {
            return Err(WorkerError::Protocol(format!(
                "Context length {} exceeds payload length {}",
                context_len,
                frame.payload_len()
            )));
        }

        let mut body = frame.payload;
        let context = body.split_to(context_len);

        Ok(Self {
            body,
            context,
            codec,
        })
    }
}

impl From<&'static str> for Payload {
    fn from(body: &'static str) -> Self {
        Payload::new(body)
    }
}

impl From<String> for Payload {
    fn from(body: String) -> Self {
        Payload::new(body)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(body: Vec<u8>) -> Self {
        Payload::new(body)
    }
}

impl From<Bytes> for Payload {
    fn from(body: Bytes) -> Self {
        Payload::new(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{flags, Header};
    use serde::Deserialize;

    fn frame(frame_flags: u8, options: &[u32], payload: &'static [u8]) -> Frame {
        let header = Header::new(frame_flags, payload.len() as u32)
            .with_options(options)
            .unwrap();
        Frame::new(header, Bytes::from_static(payload))
    }

    #[test]
    fn test_from_frame_without_options() {
        let payload = Payload::from_frame(frame(flags::CODEC_RAW, &[], b"hi")).unwrap();

        assert_eq!(payload.body(), b"hi");
        assert!(payload.context().is_empty());
        assert_eq!(payload.codec, Codec::Raw);
    }

    #[test]
    fn test_from_frame_splits_context() {
        let payload = Payload::from_frame(frame(flags::CODEC_RAW, &[7], b"{\"a\":1}body")).unwrap();

        assert_eq!(payload.context(), b"{\"a\":1}");
        assert_eq!(payload.body(), b"body");
    }

    #[test]
    fn test_from_frame_context_only() {
        let payload = Payload::from_frame(frame(0, &[3], b"ctx")).unwrap();

        assert_eq!(payload.context(), b"ctx");
        assert!(payload.body().is_empty());
    }

    #[test]
    fn test_from_frame_context_too_long() {
        let result = Payload::from_frame(frame(0, &[10], b"short"));
        assert!(result.unwrap_err().to_string().contains("exceeds payload length"));
    }

    #[test]
    fn test_decode_by_codec() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Task {
            name: String,
        }

        let task = Task {
            name: "resize".to_string(),
        };

        let json = Payload::json(&task).unwrap();
        assert_eq!(json.codec, Codec::Json);
        assert_eq!(json.decode::<Task>().unwrap(), task);

        let msgpack = Payload::msgpack(&task).unwrap();
        assert_eq!(msgpack.codec, Codec::MsgPack);
        assert_eq!(msgpack.decode::<Task>().unwrap(), task);

        let mut gob = Payload::new("x");
        gob.codec = Codec::Gob;
        assert!(gob.decode::<Task>().is_err());
    }

    #[test]
    fn test_decode_context() {
        let payload = Payload::with_context("", r#"{"status":201}"#);

        let value: serde_json::Value = payload.decode_context().unwrap();
        assert_eq!(value["status"], 201);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Payload::from("a").body(), b"a");
        assert_eq!(Payload::from(String::from("b")).body(), b"b");
        assert_eq!(Payload::from(vec![1u8, 2]).body(), &[1, 2]);
        assert_eq!(Payload::from(Bytes::from_static(b"c")).body_str(), Some("c"));
        assert_eq!(
            Payload::new("body").context_bytes("ctx").context(),
            b"ctx"
        );
    }
}
