//! Fault boundary between the worker loop and user handlers.
//!
//! Every way a handler can fail (returning `Err`, panicking while building
//! its future, panicking while the future runs) comes out of
//! [`call_guarded`] as a [`HandlerFailure`] with a non-empty message.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::Handler;
use crate::payload::Payload;

/// Message used when a failure carries no text of its own.
const FALLBACK_MESSAGE: &str = "handler failed";

/// A handler-level failure, reported to the host as an error frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    message: String,
}

impl HandlerFailure {
    /// Create a failure; an empty message is replaced with a generic one.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self {
                message: FALLBACK_MESSAGE.to_string(),
            }
        } else {
            Self { message }
        }
    }

    /// Build a failure from a panic payload.
    pub fn from_panic(panic: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = panic.downcast_ref::<&str>() {
            format!("handler panicked: {s}")
        } else if let Some(s) = panic.downcast_ref::<String>() {
            format!("handler panicked: {s}")
        } else {
            "handler panicked".to_string()
        };
        Self { message }
    }

    /// The message sent to the host.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<anyhow::Error> for HandlerFailure {
    fn from(error: anyhow::Error) -> Self {
        // Alternate formatting keeps the whole context chain.
        HandlerFailure::new(format!("{error:#}"))
    }
}

/// Invoke `handler` and convert every failure mode into [`HandlerFailure`].
pub async fn call_guarded<H>(handler: &H, payload: Payload) -> Result<Payload, HandlerFailure>
where
    H: Handler + ?Sized,
{
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(payload))) {
        Ok(future) => future,
        Err(panic) => return Err(HandlerFailure::from_panic(panic)),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(error)) => Err(HandlerFailure::from(error)),
        Err(panic) => Err(HandlerFailure::from_panic(panic)),
    }
}
