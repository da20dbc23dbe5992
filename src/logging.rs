//! Logging prelude module for convenient access to tracing macros.
//!
//! Diagnostic output goes to stderr and is separate from the JSON run log
//! written by [`crate::sync_log`].
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("This is an info message");
//! warn!("This is a warning");
//! ```

pub use tracing::{debug, error, info, warn};

use crate::strategies::LogFormat;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// `level` is the default filter; `RUST_LOG` takes precedence when set:
///
/// ```bash
/// RUST_LOG=debug dirsync src dst
/// RUST_LOG=dirsync::diff=trace dirsync src dst
/// ```
pub fn init_tracing(level: &str, format: LogFormat) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

	// A subscriber may already be installed (tests, embedding applications)
	let _ = match format {
		LogFormat::Pretty => builder.try_init(),
		LogFormat::Compact => builder.compact().try_init(),
		LogFormat::Json => builder.json().try_init(),
	};
}

// vim: ts=4
