//! Shutdown signaling between the process and the scheduler.
//!
//! Wraps tokio's watch channel so that any number of receivers observe the same
//! shutdown request. A receiver created after the request still sees it.

use tokio::sync::watch;

/// Transmitter side of the shutdown channel.
pub type ShutdownTx = watch::Sender<bool>;

/// Receiver side of the shutdown channel.
pub type ShutdownRx = watch::Receiver<bool>;

/// Creates a new shutdown channel in the "running" state.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    watch::channel(false)
}

/// Requests shutdown on `tx`.
///
/// Succeeds even when every receiver is already gone.
pub fn request_shutdown(tx: &ShutdownTx) {
    tx.send_replace(true);
}

/// Returns whether shutdown has been requested on `rx`.
pub fn is_shutdown_requested(rx: &ShutdownRx) -> bool {
    *rx.borrow()
}

/// Waits until shutdown is requested on `rx` or its transmitter is dropped.
pub async fn wait_for_shutdown(rx: &mut ShutdownRx) {
    // A dropped transmitter can never request shutdown, which is treated as one.
    let _ = rx.wait_for(|requested| *requested).await;
}
