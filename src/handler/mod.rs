//! Handler module - the user side of the request/response contract.
//!
//! Provides:
//! - [`Handler`] - anything that turns a [`Payload`] into a response
//! - [`TypedHandler`] - decodes the body into `T` and encodes the reply
//! - [`call_guarded`] - the fault boundary the worker loop calls through
//!
//! Any `Fn(Payload) -> impl Future<Output = HandlerResult>` is a handler.
//!
//! # Example
//!
//! ```
//! use goridge_worker::handler::{Handler, HandlerResult};
//! use goridge_worker::Payload;
//!
//! async fn echo(payload: Payload) -> HandlerResult {
//!     Ok(payload)
//! }
//!
//! fn assert_handler<H: Handler>(_: &H) {}
//! assert_handler(&echo);
//! ```

mod boundary;
mod typed;

use std::future::Future;
use std::pin::Pin;

use crate::payload::Payload;

pub use boundary::{call_guarded, HandlerFailure};
pub use typed::{typed, TypedHandler};

/// Result type for handler functions.
///
/// `Err` becomes an error frame; the loop keeps running.
pub type HandlerResult = anyhow::Result<Payload>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    /// Handle one request payload.
    fn call(&self, payload: Payload) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, payload: Payload) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(payload))
    }
}
