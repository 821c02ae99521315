use anyhow::Result;

/// Resolves on SIGTERM or Ctrl+C.
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            res = tokio::signal::ctrl_c() => res?,
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

/// Graceful-shutdown future for `axum::serve`.
pub async fn signal() {
    if let Err(e) = wait_for_shutdown().await {
        tracing::warn!(error = %e, "shutdown: signal listener failed; falling back to ctrl_c()");
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown: signal received");
}
