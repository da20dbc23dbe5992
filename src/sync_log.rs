//! Structured run log, written once as a single JSON document
//!
//! Entries are appended in the exact order actions are attempted. The
//! document is built when the run finishes and never mutated afterwards.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LogWriteError;
use crate::logging::*;
use crate::plan::{Action, ActionKind};
use crate::strategies::ConflictDecision;

/// Result of attempting one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	Applied,
	Skipped { reason: String },
	Failed { reason: String },
}

impl Outcome {
	pub fn skipped(reason: impl Into<String>) -> Self {
		Outcome::Skipped { reason: reason.into() }
	}

	fn kind(&self) -> OutcomeKind {
		match self {
			Outcome::Applied => OutcomeKind::Applied,
			Outcome::Skipped { .. } => OutcomeKind::Skipped,
			Outcome::Failed { .. } => OutcomeKind::Failed,
		}
	}

	fn into_reason(self) -> Option<String> {
		match self {
			Outcome::Applied => None,
			Outcome::Skipped { reason } | Outcome::Failed { reason } => Some(reason),
		}
	}
}

/// Outcome label as it appears in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
	Applied,
	Skipped,
	Failed,
}

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
	/// Every attempted action succeeded (or was skipped on purpose)
	Clean,

	/// The run finished but at least one action failed
	CompletedWithFailures,

	/// Cancelled before every action was attempted
	Aborted,
}

impl RunStatus {
	pub fn from_run(aborted: bool, failed: usize) -> Self {
		if aborted {
			RunStatus::Aborted
		} else if failed > 0 {
			RunStatus::CompletedWithFailures
		} else {
			RunStatus::Clean
		}
	}

	/// Process exit code for this status
	pub fn exit_code(self) -> u8 {
		match self {
			RunStatus::Clean => 0,
			RunStatus::CompletedWithFailures => 1,
			RunStatus::Aborted => 2,
		}
	}
}

/// One attempted action
#[derive(Debug, Clone, Serialize)]
pub struct SyncLogEntry {
	#[serde(serialize_with = "rfc3339")]
	pub time: DateTime<Utc>,
	pub action: ActionKind,
	pub path: String,
	pub outcome: OutcomeKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub resolution: Option<ConflictDecision>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub renamed_to: Option<String>,
}

/// Counts per action kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogSummary {
	pub copied_to_target: usize,
	pub copied_to_source: usize,
	pub updated_target: usize,
	pub updated_source: usize,
	pub conflicts_resolved: usize,
	pub skipped: usize,
	pub failed: usize,
}

impl LogSummary {
	/// Files written on either side
	pub fn applied(&self) -> usize {
		self.copied_to_target + self.copied_to_source + self.updated_target + self.updated_source
	}

	fn count(&mut self, kind: ActionKind, resolution: Option<ConflictDecision>, outcome: OutcomeKind) {
		match outcome {
			OutcomeKind::Skipped => self.skipped += 1,
			OutcomeKind::Failed => self.failed += 1,
			OutcomeKind::Applied => {
				match kind {
					ActionKind::CopyToTarget => self.copied_to_target += 1,
					ActionKind::CopyToSource => self.copied_to_source += 1,
					ActionKind::UpdateTarget => self.updated_target += 1,
					ActionKind::UpdateSource => self.updated_source += 1,
					ActionKind::NoAction | ActionKind::Conflict | ActionKind::KeepBothResolved => {}
				}
				if resolution.is_some_and(|r| r.settles_conflict()) {
					self.conflicts_resolved += 1;
				}
			}
		}
	}
}

/// The persisted run log
#[derive(Debug, Clone, Serialize)]
pub struct SyncLogDocument {
	pub source_root: String,
	pub target_root: String,
	#[serde(serialize_with = "rfc3339")]
	pub started_at: DateTime<Utc>,
	#[serde(serialize_with = "rfc3339")]
	pub finished_at: DateTime<Utc>,
	pub status: RunStatus,
	pub summary: LogSummary,
	pub entries: Vec<SyncLogEntry>,
}

impl SyncLogDocument {
	pub fn to_json(&self) -> Result<String, LogWriteError> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Write the document to `path`, creating missing parent directories
	pub fn write_to(&self, path: &Path) -> Result<(), LogWriteError> {
		let json = self.to_json()?;
		let write_err = |source| LogWriteError::Write { path: path.to_path_buf(), source };
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(write_err)?;
		}
		fs::write(path, json).map_err(write_err)?;
		info!("Sync log written to {}", path.display());
		Ok(())
	}
}

/// Accumulates entries while the executor runs
#[derive(Debug)]
pub struct SyncLogger {
	source_root: PathBuf,
	target_root: PathBuf,
	started_at: DateTime<Utc>,
	entries: Vec<SyncLogEntry>,
	summary: LogSummary,
}

impl SyncLogger {
	pub fn new(source_root: &Path, target_root: &Path, started_at: DateTime<Utc>) -> Self {
		SyncLogger {
			source_root: source_root.to_path_buf(),
			target_root: target_root.to_path_buf(),
			started_at,
			entries: Vec::new(),
			summary: LogSummary::default(),
		}
	}

	/// Append the entry for one attempted action
	pub fn record(&mut self, action: &Action, outcome: Outcome) {
		let kind = action.kind();
		let resolution = action.resolution();
		let outcome_kind = outcome.kind();
		self.summary.count(kind, resolution, outcome_kind);

		let renamed_to = match action {
			Action::KeepBothResolved { renamed_to, .. } => Some(renamed_to.clone()),
			_ => None,
		};

		self.entries.push(SyncLogEntry {
			time: Utc::now(),
			action: kind,
			path: action.path().to_string(),
			outcome: outcome_kind,
			reason: outcome.into_reason(),
			resolution,
			renamed_to,
		});
	}

	pub fn entries(&self) -> &[SyncLogEntry] {
		&self.entries
	}

	pub fn summary(&self) -> &LogSummary {
		&self.summary
	}

	pub fn started_at(&self) -> DateTime<Utc> {
		self.started_at
	}

	/// Close the log; no entry can be added afterwards
	pub fn finish(self, status: RunStatus) -> SyncLogDocument {
		SyncLogDocument {
			source_root: self.source_root.display().to_string(),
			target_root: self.target_root.display().to_string(),
			started_at: self.started_at,
			finished_at: Utc::now(),
			status,
			summary: self.summary,
			entries: self.entries,
		}
	}
}

/// File name prefix of default run logs
pub const LOG_FILE_PREFIX: &str = "sync_log_";

/// `sync_log_<YYYYMMDD_HHMMSS>.json` inside `dir`
pub fn default_log_path(dir: &Path, started_at: &DateTime<Utc>) -> PathBuf {
	dir.join(format!("{}{}.json", LOG_FILE_PREFIX, started_at.format("%Y%m%d_%H%M%S")))
}

fn rfc3339<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}


// vim: ts=4
