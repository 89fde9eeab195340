//! inkmatch backend service.
//!
//! # Environment Variables
//!
//! - `INKMATCH_LOG`: Set logging level (trace, debug, info, warn, error)
//! - `INKMATCH_DATA_DIR`: Override data directory location
//! - `INKMATCH_HOST` / `INKMATCH_PORT`: Bind address (default: 127.0.0.1:8000)
//! - `INKMATCH_UPLOADS_DIR`: Where uploaded images are stored
//! - `INKMATCH_LLM_URL` / `INKMATCH_LLM_MODEL`: Ollama endpoint and chat model

use anyhow::Context;

async fn run() -> anyhow::Result<()> {
    inkmatch::init_tracing();

    // The embedding model may download and load for a while.
    let handles = tokio::task::spawn_blocking(inkmatch::build_environment)
        .await
        .context("failed to spawn initialization task")?
        .context("failed to initialize application")?;

    inkmatch::serve(handles).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("[inkmatch] Service failed: {err:?}");
        std::process::exit(1);
    }
}
