//! Handlers that work on typed values instead of raw payloads.
//!
//! The request body is decoded with the codec announced by its frame; the
//! reply is encoded with the same codec (MessagePack stays MessagePack,
//! everything else is answered in JSON).

use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{BoxFuture, Handler, HandlerResult};
use crate::codec::Codec;
use crate::payload::Payload;

/// Wrapper that deserializes the payload before calling the handler.
pub struct TypedHandler<F, T, R, Fut> {
    handler: F,
    _phantom: PhantomData<fn(T) -> (R, Fut)>,
}

impl<F, T, R, Fut> TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, R, Fut> Handler for TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    fn call(&self, payload: Payload) -> BoxFuture<'static, HandlerResult> {
        let codec = payload.codec;
        let parsed: T = match payload.decode() {
            Ok(v) => v,
            Err(e) => return Box::pin(async move { Err(e.into()) }),
        };

        let fut = (self.handler)(parsed);
        Box::pin(async move {
            let value = fut.await?;
            let response = match codec {
                Codec::MsgPack => Payload::msgpack(&value)?,
                _ => Payload::json(&value)?,
            };
            Ok(response)
        })
    }
}

/// Wrap a typed async function as a [`Handler`].
///
/// # Example
///
/// ```
/// use goridge_worker::handler::{typed, Handler};
///
/// let handler = typed(|n: u32| async move { Ok::<_, anyhow::Error>(n * 2) });
/// # fn assert_handler<H: Handler>(_: &H) {}
/// # assert_handler(&handler);
/// ```
pub fn typed<F, T, R, Fut>(handler: F) -> TypedHandler<F, T, R, Fut>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    TypedHandler::new(handler)
}
