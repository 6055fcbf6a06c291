//! Echo worker: answers every request with its own body.
//!
//! ```text
//! RR_RELAY=pipes echo-worker
//! ```

use std::process::ExitCode;

use goridge_worker::{exit_code, logging, Payload, Result, Shutdown, Worker};

async fn echo(payload: Payload) -> anyhow::Result<Payload> {
    Ok(Payload::new(payload.body))
}

async fn serve() -> Result<Shutdown> {
    let mut worker = Worker::builder().with_env()?.connect().await?;
    worker.run(echo).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();
    exit_code(&serve().await)
}
