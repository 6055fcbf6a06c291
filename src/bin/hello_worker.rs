//! Hello worker: answers every request with a fixed HTTP-style response.
//!
//! The context carries the status and headers as JSON, the body is plain
//! text. One log line is written to stderr per request.

use std::collections::HashMap;
use std::process::ExitCode;

use serde::Serialize;

use goridge_worker::{exit_code, logging, Payload, Result, Shutdown, Worker};

const GREETING: &str = "Hello RoadRunner!";

#[derive(Debug, Serialize)]
struct ResponseMeta {
    status: u16,
    headers: HashMap<&'static str, Vec<&'static str>>,
}

impl ResponseMeta {
    fn ok_text() -> Self {
        Self {
            status: 200,
            headers: HashMap::from([("Content-Type", vec!["text/plain; charset=utf-8"])]),
        }
    }
}

async fn hello(request: Payload) -> anyhow::Result<Payload> {
    tracing::info!(
        body_len = request.body.len(),
        context_len = request.context.len(),
        "Received request"
    );

    let context = serde_json::to_vec(&ResponseMeta::ok_text())?;
    Ok(Payload::with_context(GREETING, context))
}

async fn serve() -> Result<Shutdown> {
    let mut worker = Worker::builder().with_env()?.connect().await?;
    worker.run(hello).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();
    exit_code(&serve().await)
}
