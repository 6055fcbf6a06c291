//! Worker builder and control loop.
//!
//! The [`WorkerBuilder`] collects the bootstrap settings and opens the relay.
//! The [`Worker`] then serves one request at a time:
//!
//! ```text
//! Waiting ──frame──► Dispatching ──► Responding ──flushed──► Waiting
//!    │                                    │
//!    ├─ end of stream / stop ─► Terminated (exit 0)
//!    └─ malformed frame ──────► Failed ◄──┘ write error (exit 1)
//! ```
//!
//! Handler failures never leave the loop; they are answered with an error
//! frame and the worker goes back to waiting.
//!
//! # Example
//!
//! ```no_run
//! use goridge_worker::{Payload, Worker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), goridge_worker::WorkerError> {
//!     let mut worker = Worker::builder().with_env()?.connect().await?;
//!
//!     worker
//!         .run(|payload: Payload| async move { Ok::<_, anyhow::Error>(payload) })
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::process::ExitCode;

use crate::config::WorkerConfig;
use crate::control::{ControlCommand, PidCommand, StopCommand};
use crate::error::Result;
use crate::handler::{call_guarded, Handler, HandlerFailure};
use crate::payload::Payload;
use crate::protocol::Frame;
use crate::transport::{Relay, RelayAddress};
use crate::writer::OutboundFrame;

/// Builder for configuring and connecting a worker.
#[derive(Debug, Clone, Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Create a builder with default settings (stdio relay, 1 GiB limit).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all settings with `config`.
    pub fn config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Load settings from `RR_RELAY` and `GORIDGE_MAX_PAYLOAD_SIZE`.
    pub fn with_env(self) -> Result<Self> {
        Ok(self.config(WorkerConfig::from_env()?))
    }

    /// Set the relay address.
    pub fn relay(mut self, relay: RelayAddress) -> Self {
        self.config.relay = relay;
        self
    }

    /// Set the largest accepted inbound payload.
    ///
    /// Default: 1 GiB
    pub fn max_payload_size(mut self, limit: u32) -> Self {
        self.config.max_payload_size = limit;
        self
    }

    /// Open the configured relay and build the worker.
    pub async fn connect(self) -> Result<Worker> {
        let relay = Relay::connect(&self.config.relay).await?;
        tracing::debug!(relay = %self.config.relay, "Relay connected");
        Ok(self.build(relay))
    }

    /// Build the worker over an already open relay.
    pub fn build(self, relay: Relay) -> Worker {
        Worker {
            relay: relay.with_max_payload(self.config.max_payload_size),
            served: 0,
        }
    }
}

/// Why the loop ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The host closed the relay between frames.
    EndOfStream,
    /// The host sent a `stop` control command.
    Stopped,
}

/// What the relay delivered next, after control frames are handled.
enum Incoming {
    Request(Payload),
    Shutdown(Shutdown),
}

/// A connected worker.
pub struct Worker {
    relay: Relay,
    served: u64,
}

impl Worker {
    /// Create a new worker builder.
    pub fn builder() -> WorkerBuilder {
        WorkerBuilder::new()
    }

    /// Create a worker over `relay` with default settings.
    pub fn new(relay: Relay) -> Self {
        WorkerBuilder::new().build(relay)
    }

    /// Number of requests answered so far.
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Wait for the next request.
    ///
    /// Control frames are answered here and never returned. `Ok(None)` means
    /// the host closed the relay or asked the worker to stop.
    pub async fn wait_payload(&mut self) -> Result<Option<Payload>> {
        match self.next_incoming().await? {
            Incoming::Request(payload) => Ok(Some(payload)),
            Incoming::Shutdown(_) => Ok(None),
        }
    }

    /// Send a successful response.
    pub async fn respond(&mut self, payload: Payload) -> Result<()> {
        let frame = match OutboundFrame::response(payload) {
            Ok(frame) => frame,
            Err(e) => OutboundFrame::error(&e.to_string()),
        };
        self.relay.write_frame(&frame).await?;
        self.served += 1;
        Ok(())
    }

    /// Send an error response. An empty message is replaced with a generic one.
    pub async fn error(&mut self, message: &str) -> Result<()> {
        let failure = HandlerFailure::new(message);
        self.relay.write_frame(&OutboundFrame::error(failure.message())).await?;
        self.served += 1;
        Ok(())
    }

    /// Tell the host this worker is going away.
    pub async fn stop(&mut self) -> Result<()> {
        let frame = OutboundFrame::control(&StopCommand::default())?;
        self.relay.write_frame(&frame).await
    }

    /// Serve requests with `handler` until the host closes the relay or
    /// sends `stop`.
    ///
    /// Exactly one response frame is written per request, in request order.
    /// Returns `Err` on a malformed inbound stream or a broken output stream.
    pub async fn run<H: Handler>(&mut self, handler: H) -> Result<Shutdown> {
        match self.serve(&handler).await {
            Ok(reason) => {
                tracing::info!(?reason, served = self.served, "Worker loop finished");
                Ok(reason)
            }
            Err(e) => {
                tracing::error!(error = %e, served = self.served, "Worker loop failed");
                Err(e)
            }
        }
    }

    async fn serve<H: Handler>(&mut self, handler: &H) -> Result<Shutdown> {
        loop {
            let payload = match self.next_incoming().await? {
                Incoming::Request(payload) => payload,
                Incoming::Shutdown(reason) => return Ok(reason),
            };

            tracing::trace!(
                body_len = payload.body.len(),
                context_len = payload.context.len(),
                "Dispatching request"
            );

            match call_guarded(handler, payload).await {
                Ok(response) => self.respond(response).await?,
                Err(failure) => {
                    tracing::warn!(error = %failure, "Handler failed");
                    self.error(failure.message()).await?;
                }
            }
        }
    }

    async fn next_incoming(&mut self) -> Result<Incoming> {
        loop {
            let frame = match self.relay.read_frame().await? {
                Some(frame) => frame,
                None => return Ok(Incoming::Shutdown(Shutdown::EndOfStream)),
            };

            if frame.is_control() {
                match self.handle_control(&frame).await? {
                    Some(reason) => return Ok(Incoming::Shutdown(reason)),
                    None => continue,
                }
            }

            if frame.is_error() {
                tracing::warn!(len = frame.payload_len(), "Received error-flagged request frame");
            }

            return Payload::from_frame(frame).map(Incoming::Request);
        }
    }

    async fn handle_control(&mut self, frame: &Frame) -> Result<Option<Shutdown>> {
        match ControlCommand::parse(frame.payload())? {
            ControlCommand::Pid => {
                let reply = OutboundFrame::control(&PidCommand::default())?;
                self.relay.write_frame(&reply).await?;
                tracing::debug!("Answered pid request");
                Ok(None)
            }
            ControlCommand::Stop => {
                tracing::debug!("Received stop command");
                Ok(Some(Shutdown::Stopped))
            }
        }
    }
}

/// Map the outcome of [`Worker::run`] to the process exit status.
///
/// Clean termination exits 0; any loop failure exits 1.
pub fn exit_code(result: &Result<Shutdown>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
