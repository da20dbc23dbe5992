//! Interrupt handling for graceful cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Raise `cancel` on the first Ctrl-C; exit on the second
///
/// The executor checks the flag before each action, so the action in flight
/// completes and the run log still gets written.
pub fn install_cancel_handler(cancel: Arc<AtomicBool>) {
	tokio::spawn(async move {
		if let Err(e) = tokio::signal::ctrl_c().await {
			warn!("Failed to setup SIGINT handler: {}. Ctrl-C will not cancel gracefully.", e);
			return;
		}
		warn!("Interrupt received, stopping after the current action (Ctrl-C again to exit)");
		cancel.store(true, Ordering::SeqCst);

		if tokio::signal::ctrl_c().await.is_ok() {
			debug!("Received second SIGINT, exiting");
			std::process::exit(130); // 128 + SIGINT(2)
		}
	});
}

/// Whether cancellation has been requested
pub fn is_cancelled(cancel: &AtomicBool) -> bool {
	cancel.load(Ordering::SeqCst)
}

// vim: ts=4
