//! # goridge-worker
//!
//! Worker-side client for the Goridge frame protocol spoken by
//! RoadRunner-style hosts.
//!
//! A worker owns one relay (stdin/stdout, a TCP socket or a Unix socket) to
//! its host. It reads one request frame, hands the payload to a handler,
//! writes exactly one response frame and flushes it, then waits for the
//! next request. Handler failures are answered with error frames; only a
//! malformed inbound stream or a broken output stream ends the loop with an
//! error.
//!
//! ## Architecture
//!
//! - **Frames** ([`protocol`]): Goridge v3 header with CRC32, option words
//!   and a length-prefixed payload
//! - **Control** ([`control`]): `pid` and `stop` commands carried in
//!   `CONTROL` frames, answered by the loop itself
//! - **Payloads** ([`Payload`]): `context ++ body` split by the first option
//!
//! ## Example
//!
//! ```no_run
//! use goridge_worker::{logging, Payload, Worker, WorkerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::process::ExitCode {
//!     logging::init();
//!
//!     let result = async {
//!         let mut worker = Worker::builder()
//!             .config(WorkerConfig::from_env()?)
//!             .connect()
//!             .await?;
//!         worker
//!             .run(|payload: Payload| async move { Ok::<_, anyhow::Error>(payload) })
//!             .await
//!     }
//!     .await;
//!
//!     goridge_worker::exit_code(&result)
//! }
//! ```

pub mod codec;
pub mod config;
pub mod control;
pub mod error;
pub mod handler;
pub mod logging;
pub mod protocol;
pub mod transport;
pub mod writer;

mod payload;
mod worker;

pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
pub use handler::{Handler, HandlerResult};
pub use payload::Payload;
pub use worker::{exit_code, Shutdown, Worker, WorkerBuilder};
