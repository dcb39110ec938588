//! SIGINT/SIGTERM delivered to the async side as a one-shot notification.

use tokio::sync::oneshot;

/// Resolves with the signal number of the first SIGINT or SIGTERM.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<oneshot::Receiver<i32>> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use tracing::info;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let (tx, rx) = oneshot::channel();

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!("Received signal {sig}, shutting down...");
            let _ = tx.send(sig);
        }
    });

    Ok(rx)
}

/// Resolves on Ctrl-C; reported as SIGINT (2).
#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<oneshot::Receiver<i32>> {
    use tracing::{error, info};

    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down...");
                let _ = tx.send(2);
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
    });

    Ok(rx)
}
