//! Control command payloads.

use serde::{Deserialize, Serialize};

use crate::codec::JsonCodec;
use crate::error::{Result, WorkerError};

/// Process id report, sent in reply to a `pid` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidCommand {
    /// Worker process id.
    pub pid: u32,
}

impl Default for PidCommand {
    fn default() -> Self {
        Self {
            pid: std::process::id(),
        }
    }
}

/// Stop notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCommand {
    /// Always `true` on the wire.
    pub stop: bool,
}

impl Default for StopCommand {
    fn default() -> Self {
        Self { stop: true }
    }
}

/// Raw shape of an inbound control body; both keys are optional.
#[derive(Debug, Default, Deserialize)]
struct ControlRequest {
    #[serde(default)]
    pid: Option<serde_json::Value>,
    #[serde(default)]
    stop: Option<serde_json::Value>,
}

/// A control command received from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Report the process id.
    Pid,
    /// Leave the loop cleanly.
    Stop,
}

impl ControlCommand {
    /// Parse a control frame body.
    ///
    /// `stop` wins when both keys are set. A body with neither key, or that
    /// is not a JSON object, is a protocol error.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let request: ControlRequest = JsonCodec::decode(body)?;

        if request.stop.as_ref().is_some_and(is_truthy) {
            return Ok(ControlCommand::Stop);
        }
        if request.pid.as_ref().is_some_and(is_truthy) {
            return Ok(ControlCommand::Pid);
        }

        Err(WorkerError::Protocol(format!(
            "Invalid control command: {}",
            String::from_utf8_lossy(body)
        )))
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => !s.is_empty() && s != "0",
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}
