/// Resolves when the user interrupts the process (Ctrl-C).
///
/// If the handler cannot be installed this never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for interrupt");
        std::future::pending::<()>().await;
    }
}
