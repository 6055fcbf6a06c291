//! Control plane - JSON commands exchanged in `CONTROL` frames.
//!
//! Control frames share the relay with payload frames but never reach the
//! user handler. The host uses them to:
//!
//! 1. Ask for the worker's process id (`{"pid":true}`), answered with
//!    `{"pid":<id>}`
//! 2. Ask the worker to exit (`{"stop":true}`)
//!
//! The worker can also send `{"stop":true}` itself to tell the host it is
//! going away.
//!
//! # Example
//!
//! ```
//! use goridge_worker::control::ControlCommand;
//!
//! let command = ControlCommand::parse(br#"{"pid":true}"#).unwrap();
//! assert_eq!(command, ControlCommand::Pid);
//! ```

mod commands;

pub use commands::{ControlCommand, PidCommand, StopCommand};
