//! Process-wide shutdown state.
//!
//! Ctrl+C sets `SHUTDOWN`, wakes async waiters, and unblocks the HTTP
//! server if one is registered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};

use tiny_http::Server;
use tokio::sync::Notify;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Wakes async tasks waiting in `wait_for_shutdown`
static SHUTDOWN_NOTIFY: LazyLock<Notify> = LazyLock::new(Notify::new);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(request_shutdown)
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Flag shutdown and wake everything that waits for it.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
    SHUTDOWN_NOTIFY.notify_waiters();

    if let Some(server) = SERVER.get() {
        crate::log!("serve"; "shutting down...");
        server.unblock();
    }
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Resolve once shutdown has been requested.
pub async fn wait_for_shutdown() {
    let notified = SHUTDOWN_NOTIFY.notified();
    tokio::pin!(notified);
    // Register before checking the flag so a concurrent request is not lost
    notified.as_mut().enable();
    if is_shutdown() {
        return;
    }
    notified.await;
}
