//! Sync pipeline: scan, classify, resolve, execute, log
//!
//! [`SyncEngine`] exposes each stage separately so a front end can show the
//! plan and ask questions between them. [`SyncBuilder`] runs the whole
//! pipeline in one call.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::callbacks::{AutoResolve, ConflictCallback, NoProgress, ProgressCallback};
use crate::config::Config;
use crate::conflict::ConflictResolver;
use crate::diff::DiffClassifier;
use crate::error::{LogWriteError, SyncError};
use crate::exclusion::ExclusionEngine;
use crate::executor::Executor;
use crate::hashing::{Blake3Hasher, ContentHasher};
use crate::inventory::{check_root, empty_inventory, scan_tree};
use crate::logging::*;
use crate::plan::{Action, Plan};
use crate::strategies::ConflictDecision;
use crate::sync_log::{LogSummary, RunStatus, SyncLogger};
use crate::types::{Inventory, ScanWarning, Side};

/// Everything known about a run before any file is touched
#[derive(Debug)]
pub struct Analysis {
	pub source: Inventory,
	pub target: Inventory,
	pub plan: Plan,

	/// Run start time; names the default log and keep-both copies
	pub started_at: DateTime<Utc>,
}

/// Outcome of a completed (or aborted) run
#[derive(Debug)]
pub struct SyncReport {
	pub status: RunStatus,
	pub summary: LogSummary,
	pub log_path: Option<PathBuf>,
	pub log_error: Option<LogWriteError>,
	pub warnings: Vec<ScanWarning>,
}

impl SyncReport {
	/// Exit code: a log write failure turns a clean run into 1
	pub fn exit_code(&self) -> u8 {
		match (self.status, &self.log_error) {
			(RunStatus::Clean, Some(_)) => 1,
			(status, _) => status.exit_code(),
		}
	}
}

/// Runs the stages of one sync between two roots
pub struct SyncEngine {
	source_root: PathBuf,
	target_root: PathBuf,
	config: Config,
	hasher: Arc<dyn ContentHasher>,
	progress: Arc<dyn ProgressCallback>,
	cancel: Arc<AtomicBool>,
}

impl SyncEngine {
	pub fn new(source_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>, config: Config) -> Self {
		SyncEngine {
			source_root: source_root.into(),
			target_root: target_root.into(),
			config,
			hasher: Arc::new(Blake3Hasher),
			progress: Arc::new(NoProgress),
			cancel: Arc::new(AtomicBool::new(false)),
		}
	}

	pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
		self.hasher = hasher;
		self
	}

	pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
		self.progress = progress;
		self
	}

	pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
		self.cancel = cancel;
		self
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn source_root(&self) -> &Path {
		&self.source_root
	}

	pub fn target_root(&self) -> &Path {
		&self.target_root
	}

	/// Scan both trees concurrently and classify every path
	pub async fn analyze(&self) -> Result<Analysis, SyncError> {
		self.config.validate()?;
		let started_at = Utc::now();
		info!("Analyzing {} → {}", self.source_root.display(), self.target_root.display());

		let (source, target) = tokio::try_join!(
			self.scan_side(Side::Source, self.source_root.clone()),
			self.scan_side(Side::Target, self.target_root.clone()),
		)?;

		let classifier = DiffClassifier::new(self.hasher.clone(), self.config.hash_parallelism)
			.with_progress(self.progress.clone());
		let plan = classifier.classify(&source, &target).await;

		Ok(Analysis { source, target, plan, started_at })
	}

	async fn scan_side(&self, side: Side, root: PathBuf) -> Result<Inventory, SyncError> {
		if side == Side::Target && !root.exists() {
			info!("Target {} does not exist yet, treating it as empty", root.display());
			return Ok(empty_inventory(side, &root));
		}
		check_root(&root)?;

		// Run logs written under a root must not become files to sync
		let mut patterns = self.config.exclude_patterns.clone();
		if let Some(pattern) = self.config.log_exclusion(&root) {
			debug!("Excluding run logs from {} tree: {}", side, pattern);
			patterns.push(pattern);
		}
		let exclusion = ExclusionEngine::new(&patterns, &root, self.config.respect_ignore_file)?;
		let parallelism = self.config.scan_parallelism;
		let progress = self.progress.clone();

		let inventory = tokio::task::spawn_blocking(move || {
			scan_tree(side, &root, &exclusion, parallelism, progress.as_ref())
		})
		.await??;
		Ok(inventory)
	}

	/// Full ordered action list: classified actions, then resolved conflicts
	pub fn resolve_conflicts(
		&self,
		analysis: &Analysis,
		callback: &mut dyn ConflictCallback,
	) -> Vec<Action> {
		let mut resolver =
			ConflictResolver::new(&analysis.source, &analysis.target, analysis.started_at);
		let resolved = resolver.resolve_all(analysis.plan.conflicts.clone(), callback);

		let mut actions = analysis.plan.actions.clone();
		actions.extend(resolved);
		actions
	}

	/// Apply `actions`, then write the run log
	///
	/// Only a failure to create the missing target root is an `Err`; per-action
	/// failures and log write failures are part of the report.
	pub async fn execute(&self, analysis: &Analysis, actions: &[Action]) -> Result<SyncReport, SyncError> {
		let dry_run = self.config.dry_run;
		if !dry_run && !self.target_root.exists() {
			info!("Creating target directory {}", self.target_root.display());
			tokio::fs::create_dir_all(&self.target_root).await?;
		}

		let executor = Executor::new(&self.source_root, &self.target_root, dry_run)
			.with_progress(self.progress.clone())
			.with_cancel_flag(self.cancel.clone());
		let mut logger = SyncLogger::new(&self.source_root, &self.target_root, analysis.started_at);
		let outcome = executor.execute(actions, &mut logger).await;

		let summary = *logger.summary();
		let status = RunStatus::from_run(outcome.aborted, summary.failed);
		let document = logger.finish(status);

		let log_path = self.config.log_path(&analysis.started_at);
		let log_error = document.write_to(&log_path).err();
		if let Some(e) = &log_error {
			warn!("{}", e);
		}

		info!(
			"Sync {:?}: {} applied, {} skipped, {} failed",
			status,
			summary.applied(),
			summary.skipped,
			summary.failed
		);

		Ok(SyncReport {
			status,
			summary,
			log_path: Some(log_path),
			log_error,
			warnings: analysis.plan.warnings.clone(),
		})
	}
}

/// Builder for running the whole pipeline without interaction
///
/// Conflicts go to the `on_conflict` callback when set, else to the configured
/// auto-resolve policy, else they are skipped.
pub struct SyncBuilder {
	source: PathBuf,
	target: PathBuf,
	config: Config,
	hasher: Option<Arc<dyn ContentHasher>>,
	progress: Option<Arc<dyn ProgressCallback>>,
	cancel: Option<Arc<AtomicBool>>,
	on_conflict: Option<Box<dyn ConflictCallback + Send>>,
}

impl SyncBuilder {
	pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
		SyncBuilder {
			source: source.into(),
			target: target.into(),
			config: Config::default(),
			hasher: None,
			progress: None,
			cancel: None,
			on_conflict: None,
		}
	}

	/// Replace the whole configuration
	pub fn config(mut self, config: Config) -> Self {
		self.config = config;
		self
	}

	pub fn dry_run(mut self, enabled: bool) -> Self {
		self.config.dry_run = enabled;
		self
	}

	pub fn auto_resolve(mut self, decision: ConflictDecision) -> Self {
		self.config.auto_resolve = Some(decision);
		self
	}

	pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
		self.config.exclude_patterns.push(pattern.into());
		self
	}

	pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.config.log_file = Some(path.into());
		self
	}

	pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.config.log_dir = dir.into();
		self
	}

	pub fn hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
		self.hasher = Some(hasher);
		self
	}

	pub fn progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
		self.progress = Some(progress);
		self
	}

	pub fn cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
		self.cancel = Some(cancel);
		self
	}

	/// Decide each conflict with `callback`
	pub fn on_conflict(mut self, callback: impl ConflictCallback + Send + 'static) -> Self {
		self.on_conflict = Some(Box::new(callback));
		self
	}

	/// Build the engine without running it
	pub fn build(self) -> (SyncEngine, Box<dyn ConflictCallback + Send>) {
		let callback: Box<dyn ConflictCallback + Send> = match self.on_conflict {
			Some(cb) => cb,
			None => Box::new(AutoResolve(self.config.auto_resolve.unwrap_or(ConflictDecision::Skip))),
		};

		let mut engine = SyncEngine::new(self.source, self.target, self.config);
		if let Some(hasher) = self.hasher {
			engine = engine.with_hasher(hasher);
		}
		if let Some(progress) = self.progress {
			engine = engine.with_progress(progress);
		}
		if let Some(cancel) = self.cancel {
			engine = engine.with_cancel_flag(cancel);
		}
		(engine, callback)
	}

	/// Run scan, classification, conflict resolution and execution
	pub async fn sync(self) -> Result<SyncReport, SyncError> {
		let (engine, mut callback) = self.build();
		let analysis = engine.analyze().await?;
		let actions = engine.resolve_conflicts(&analysis, callback.as_mut());
		engine.execute(&analysis, &actions).await
	}
}

/// Sync two directories with `config`
pub async fn sync(
	source: impl Into<PathBuf>,
	target: impl Into<PathBuf>,
	config: Config,
) -> Result<SyncReport, SyncError> {
	SyncBuilder::new(source, target).config(config).sync().await
}

// vim: ts=4
