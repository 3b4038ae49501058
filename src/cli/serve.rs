//! Serve command: run the JSON API until Ctrl-C

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use edoquest::{Config, http};

pub async fn serve_command(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut settings = config.server.clone();
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }

    let engine = super::open_engine(config)?;
    let server = Arc::new(http::bind(&settings)?);
    let token = Some(settings.auth_token).filter(|t| !t.trim().is_empty());

    // tiny_http blocks on accept, so the loop lives on the blocking pool
    let worker = {
        let server = Arc::clone(&server);
        tokio::task::spawn_blocking(move || http::run(&server, &engine, token.as_deref()))
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");
    server.unblock();

    worker.await.context("Server task failed")?;
    Ok(())
}
