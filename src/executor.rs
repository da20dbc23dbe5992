//! Action executor: applies a resolved plan to both trees
//!
//! Every copy goes through a temporary sibling file that receives the
//! source's modification time before it is renamed over the destination, so
//! an interrupted copy never leaves a truncated file under the real name.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::callbacks::{NoProgress, ProgressCallback, ProgressEvent};
use crate::error::ActionError;
use crate::hashing::hash_bytes;
use crate::logging::*;
use crate::plan::Action;
use crate::strategies::ConflictDecision;
use crate::sync_log::{Outcome, SyncLogger};
use crate::types::{join_relative, FileRecord};
use crate::utils::is_cancelled;

/// Suffix of in-flight copies; always excluded from scans
pub const TEMP_SUFFIX: &str = ".dirsync-tmp";

/// Log reason for actions not performed because of dry-run mode
pub const REASON_DRY_RUN: &str = "dry_run";

/// Log reason for conflicts resolved with `Skip`
pub const REASON_CONFLICT_SKIPPED: &str = "conflict_skipped";

/// Log reason for conflicts that reached the executor without a decision
pub const REASON_UNRESOLVED: &str = "unresolved_conflict";

/// What happened to the action list as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionOutcome {
	/// Actions the executor looked at, in order
	pub attempted: usize,

	/// Stopped early because the cancel flag was raised
	pub aborted: bool,
}

/// Performs (or simulates) the filesystem side of each action
pub struct Executor {
	source_root: PathBuf,
	target_root: PathBuf,
	dry_run: bool,
	progress: Arc<dyn ProgressCallback>,
	cancel: Arc<AtomicBool>,
}

impl Executor {
	pub fn new(source_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>, dry_run: bool) -> Self {
		Executor {
			source_root: source_root.into(),
			target_root: target_root.into(),
			dry_run,
			progress: Arc::new(NoProgress),
			cancel: Arc::new(AtomicBool::new(false)),
		}
	}

	pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
		self.progress = progress;
		self
	}

	/// Share a cancel flag; once raised no further action is attempted
	pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
		self.cancel = cancel;
		self
	}

	/// Run every action in order, recording one log entry per attempt
	pub async fn execute(&self, actions: &[Action], logger: &mut SyncLogger) -> ExecutionOutcome {
		let total = actions.iter().filter(|a| a.is_change()).count();
		let mut outcome = ExecutionOutcome::default();
		let mut index = 0;

		for action in actions {
			if is_cancelled(&self.cancel) {
				warn!("Sync cancelled, {} actions not attempted", actions.len() - outcome.attempted);
				outcome.aborted = true;
				break;
			}
			outcome.attempted += 1;

			let result = match action {
				Action::NoAction { resolution: Some(ConflictDecision::Skip), .. } => {
					Outcome::skipped(REASON_CONFLICT_SKIPPED)
				}
				Action::NoAction { .. } => Outcome::Applied,
				Action::Conflict(_) => Outcome::skipped(REASON_UNRESOLVED),
				_ if self.dry_run => Outcome::skipped(REASON_DRY_RUN),
				_ => {
					index += 1;
					self.progress.on_event(ProgressEvent::ActionStarted {
						index,
						total,
						kind: action.kind(),
						path: action.path().to_string(),
					});
					match self.apply(action).await {
						Ok(()) => {
							debug!("{} {}", action.kind(), action.path());
							Outcome::Applied
						}
						Err(e) => {
							warn!("{} {} failed: {}", action.kind(), action.path(), e);
							Outcome::Failed { reason: e.to_string() }
						}
					}
				}
			};
			logger.record(action, result);
		}

		outcome
	}

	/// Apply one action to the filesystem
	async fn apply(&self, action: &Action) -> Result<(), ActionError> {
		match action {
			Action::CopyToTarget { source } | Action::UpdateTarget { source, .. } => {
				self.copy_across(source, &self.source_root, &self.target_root).await
			}
			Action::CopyToSource { target } | Action::UpdateSource { target, .. } => {
				self.copy_across(target, &self.target_root, &self.source_root).await
			}
			Action::KeepBothResolved { source, renamed_to, .. } => {
				let original = source.full_path(&self.target_root);
				let aside = join_relative(&self.target_root, renamed_to);
				if aside.symlink_metadata().is_ok() {
					return Err(ActionError::WouldOverwrite { path: aside });
				}
				tokio::fs::rename(&original, &aside)
					.await
					.map_err(|e| ActionError::io("rename", &original, e))?;

				// Rename and copy succeed together or the original name is restored
				if let Err(copy_err) = self.copy_across(source, &self.source_root, &self.target_root).await {
					if let Err(rollback) = tokio::fs::rename(&aside, &original).await {
						return Err(ActionError::RollbackFailed {
							path: aside,
							cause: Box::new(copy_err),
							source: rollback,
						});
					}
					return Err(copy_err);
				}
				Ok(())
			}
			Action::NoAction { .. } | Action::Conflict(_) => Ok(()),
		}
	}

	async fn copy_across(&self, record: &FileRecord, from_root: &Path, to_root: &Path) -> Result<(), ActionError> {
		copy_file(&record.full_path(from_root), &record.full_path(to_root), record).await
	}
}

/// Copy `from` over `to` through a temporary sibling, restoring the record's mtime
pub async fn copy_file(from: &Path, to: &Path, record: &FileRecord) -> Result<(), ActionError> {
	let parent = to.parent().ok_or_else(|| {
		ActionError::io("copy", to, io::Error::new(io::ErrorKind::InvalidInput, "no parent directory"))
	})?;
	tokio::fs::create_dir_all(parent).await.map_err(|e| ActionError::io("create directory", parent, e))?;

	let temp = temp_path(to);
	let result = write_temp_then_rename(from, &temp, to, record).await;
	if result.is_err() {
		let _ = tokio::fs::remove_file(&temp).await;
	}
	result
}

/// Fixed-length hidden sibling used while `to` is being written
///
/// Derived from the file name so it stays short for names close to the
/// filesystem limit.
pub(crate) fn temp_path(to: &Path) -> PathBuf {
	let name = to.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
	let digest = hash_bytes(name.as_bytes()).to_string();
	let temp_name = format!(".{}{}", &digest[..16], TEMP_SUFFIX);
	match to.parent() {
		Some(parent) => parent.join(temp_name),
		None => PathBuf::from(temp_name),
	}
}

async fn write_temp_then_rename(
	from: &Path,
	temp: &Path,
	to: &Path,
	record: &FileRecord,
) -> Result<(), ActionError> {
	tokio::fs::copy(from, temp).await.map_err(|e| ActionError::io("copy", from, e))?;
	filetime::set_file_mtime(temp, record.file_time())
		.map_err(|e| ActionError::io("set modification time", temp, e))?;
	tokio::fs::rename(temp, to).await.map_err(|e| ActionError::io("rename", temp, e))?;
	Ok(())
}


// vim: ts=4
