//! Error types for dirsync operations
//!
//! Only errors that stop a run are `Err` values. Problems that concern a single
//! path (an unreadable file during the scan, a failed copy) are recorded as
//! warnings or log outcomes and the run carries on.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sync operations
#[derive(Debug, Error)]
pub enum SyncError {
	/// A tree root could not be scanned. Fatal: no action is attempted.
	#[error("Scan failed: {0}")]
	Scan(#[from] ScanError),

	/// Invalid configuration
	#[error("Invalid configuration: {0}")]
	Config(#[from] ConfigError),

	/// The JSON run log could not be persisted
	#[error("{0}")]
	LogWrite(#[from] LogWriteError),

	/// Exclusion rules could not be compiled
	#[error("Exclusion error: {0}")]
	Exclusion(#[from] ExclusionError),

	/// I/O error outside of a single action (e.g. creating the target root)
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	/// Background task failed to complete
	#[error("Task failed: {message}")]
	Task { message: String },
}

impl From<tokio::task::JoinError> for SyncError {
	fn from(e: tokio::task::JoinError) -> Self {
		SyncError::Task { message: e.to_string() }
	}
}

/// Fatal errors while scanning a tree root
#[derive(Debug, Error)]
pub enum ScanError {
	/// Root path does not exist
	#[error("Directory does not exist: {}", path.display())]
	NotFound { path: PathBuf },

	/// Root path exists but is not a directory
	#[error("Not a directory: {}", path.display())]
	NotADirectory { path: PathBuf },

	/// Root path cannot be read
	#[error("Cannot read directory {}: {source}", path.display())]
	Unreadable {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

/// Failure to apply a single action; recorded in the run log, never fatal
#[derive(Debug, Error)]
pub enum ActionError {
	/// Underlying filesystem operation failed
	#[error("{op} {}: {source}", path.display())]
	Io {
		op: &'static str,
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// Keep-both rename target appeared since the plan was made
	#[error("Refusing to overwrite existing file {}", path.display())]
	WouldOverwrite { path: PathBuf },

	/// Keep-both copy failed and the renamed original could not be moved back
	#[error("{cause}; restoring {} also failed: {source}", path.display())]
	RollbackFailed {
		path: PathBuf,
		cause: Box<ActionError>,
		#[source]
		source: io::Error,
	},
}

impl ActionError {
	pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
		ActionError::Io { op, path: path.into(), source }
	}
}

/// The run log could not be written
#[derive(Debug, Error)]
pub enum LogWriteError {
	#[error("Failed to serialize sync log: {0}")]
	Serialize(#[from] serde_json::Error),

	#[error("Failed to write sync log {}: {source}", path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Cannot read config file {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Cannot parse config file {}: {message}", path.display())]
	Parse { path: PathBuf, message: String },

	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },
}

/// Invalid exclusion pattern or ignore file
#[derive(Debug, Error)]
pub enum ExclusionError {
	#[error("Invalid pattern: {0}")]
	InvalidPattern(String),

	#[error("Ignore file error: {0}")]
	IgnoreFile(String),
}

// vim: ts=4
