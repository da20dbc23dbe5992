//! # dirsync - Two-way Directory Synchronizer
//!
//! dirsync compares two directory trees, classifies every file path into a
//! synchronization action, resolves conflicting edits and applies the result,
//! writing a JSON log of everything it did.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dirsync::{sync, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = sync("./photos", "/mnt/backup/photos", Config::default()).await?;
//!     println!("Copied {} files", report.summary.applied());
//!     Ok(())
//! }
//! ```
//!
//! ## Using the Builder Pattern
//!
//! ```rust,ignore
//! use dirsync::{ConflictDecision, SyncBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = SyncBuilder::new("./a", "./b")
//!         .dry_run(true)
//!         .exclude("*.tmp")
//!         .auto_resolve(ConflictDecision::KeepBoth)
//!         .sync()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod callbacks;
pub mod config;
pub mod conflict;
pub mod diff;
pub mod display;
pub mod error;
pub mod exclusion;
pub mod executor;
pub mod hashing;
pub mod inventory;
pub mod logging;
pub mod plan;
pub mod progress;
pub mod prompt;
pub mod strategies;
pub mod sync;
pub mod sync_log;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use callbacks::{AutoResolve, ConflictCallback, ProgressCallback, ProgressEvent};
pub use config::Config;
pub use conflict::Conflict;
pub use error::{ActionError, ConfigError, ScanError, SyncError};
pub use plan::{Action, ActionKind, Plan};
pub use strategies::ConflictDecision;
pub use sync::{sync, Analysis, SyncBuilder, SyncEngine, SyncReport};
pub use sync_log::{LogSummary, RunStatus};
pub use types::{FileRecord, Inventory, Side};

// vim: ts=4
