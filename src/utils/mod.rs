//! Utility modules for common functionality

pub mod signal;

pub use signal::{install_cancel_handler, is_cancelled};

// vim: ts=4
