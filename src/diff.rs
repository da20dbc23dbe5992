//! Diff classifier: one planned action per path in the union of both trees
//!
//! Decision table, for a path present on both sides:
//!
//! | size  | mtime     | hashed | result                                   |
//! |-------|-----------|--------|------------------------------------------|
//! | equal | equal     | no     | `NoAction`                               |
//! | diff  | any       | no     | newer side wins, `Conflict` when equal   |
//! | equal | diff      | yes    | `NoAction` on equal hash, else newer wins|
//!
//! "Equal mtime" in the first row means equal to the nanosecond. The newer
//! side is picked on whole seconds, so two edits within the same second are a
//! `Conflict`.
//!
//! Paths present on one side only are copied to the other and never hashed.

use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use crate::callbacks::{NoProgress, ProgressCallback, ProgressEvent};
use crate::conflict::Conflict;
use crate::hashing::{Blake3Hasher, ContentHasher};
use crate::logging::*;
use crate::plan::{Action, Plan};
use crate::types::{ContentHash, FileRecord, Inventory, ScanWarning, Side};

/// Default number of files hashed concurrently
pub const DEFAULT_HASH_PARALLELISM: usize = 4;

enum Slot {
	Decided(Action),
	Conflict(Conflict),
	NeedsHash(FileRecord, FileRecord),
	Dropped,
}

/// Compares a source and a target inventory
pub struct DiffClassifier {
	hasher: Arc<dyn ContentHasher>,
	parallelism: usize,
	progress: Arc<dyn ProgressCallback>,
}

impl Default for DiffClassifier {
	fn default() -> Self {
		DiffClassifier::new(Arc::new(Blake3Hasher), DEFAULT_HASH_PARALLELISM)
	}
}

impl DiffClassifier {
	pub fn new(hasher: Arc<dyn ContentHasher>, parallelism: usize) -> Self {
		DiffClassifier { hasher, parallelism: parallelism.max(1), progress: Arc::new(NoProgress) }
	}

	pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
		self.progress = progress;
		self
	}

	/// Classify every path; output is sorted by relative path
	pub async fn classify(&self, source: &Inventory, target: &Inventory) -> Plan {
		let paths: BTreeSet<&str> = source.paths().chain(target.paths()).collect();

		let mut slots: Vec<Slot> = paths
			.into_iter()
			.map(|path| match (source.get(path), target.get(path)) {
				(Some(s), None) => Slot::Decided(Action::CopyToTarget { source: s.clone() }),
				(None, Some(t)) => Slot::Decided(Action::CopyToSource { target: t.clone() }),
				(Some(s), Some(t)) => classify_pair(s, t),
				(None, None) => Slot::Dropped,
			})
			.collect();

		let mut warnings: Vec<ScanWarning> =
			source.warnings().iter().chain(target.warnings()).cloned().collect();

		self.hash_ambiguous(source, target, &mut slots, &mut warnings).await;

		let mut plan = Plan { warnings, ..Default::default() };
		for slot in slots {
			match slot {
				Slot::Decided(action) => plan.actions.push(action),
				Slot::Conflict(conflict) => plan.conflicts.push(conflict),
				Slot::NeedsHash(..) | Slot::Dropped => {}
			}
		}

		info!(
			"Classified {} paths: {} changes, {} conflicts",
			plan.actions.len() + plan.conflicts.len(),
			plan.changes().count(),
			plan.conflicts.len()
		);
		plan
	}

	/// Hash both versions of every `NeedsHash` slot and settle it
	async fn hash_ambiguous(
		&self,
		source: &Inventory,
		target: &Inventory,
		slots: &mut [Slot],
		warnings: &mut Vec<ScanWarning>,
	) {
		let jobs: Vec<_> = slots
			.iter()
			.enumerate()
			.filter_map(|(index, slot)| match slot {
				Slot::NeedsHash(s, t) => {
					Some((index, s.full_path(source.root()), t.full_path(target.root())))
				}
				_ => None,
			})
			.collect();
		if jobs.is_empty() {
			return;
		}

		let total = jobs.len();
		debug!("Hashing {} ambiguous paths", total);

		let mut results = stream::iter(jobs)
			.map(|(index, source_path, target_path)| {
				let hasher = self.hasher.clone();
				async move {
					let hashed = tokio::task::spawn_blocking(move || {
						let s = hasher.hash_file(&source_path).map_err(|e| (Side::Source, e))?;
						let t = hasher.hash_file(&target_path).map_err(|e| (Side::Target, e))?;
						Ok::<_, (Side, io::Error)>((s, t))
					})
					.await;
					(index, hashed)
				}
			})
			.buffer_unordered(self.parallelism);

		let mut done = 0;
		while let Some((index, hashed)) = results.next().await {
			done += 1;
			self.progress.on_event(ProgressEvent::Hashing { done, total });

			let Slot::NeedsHash(s, t) = std::mem::replace(&mut slots[index], Slot::Dropped) else {
				continue;
			};

			let outcome = match hashed {
				Ok(Ok(hashes)) => Ok(hashes),
				Ok(Err((side, e))) => Err((side, e.to_string())),
				Err(join_err) => Err((Side::Source, join_err.to_string())),
			};

			slots[index] = match outcome {
				Ok((source_hash, target_hash)) => settle_hashed(s, t, source_hash, target_hash),
				Err((side, reason)) => {
					let warning = ScanWarning { side, path: s.relative_path, reason };
					warn!("{}", warning);
					warnings.push(warning);
					Slot::Dropped
				}
			};
		}
	}
}

/// Decide a path present on both sides without reading file contents, if possible
fn classify_pair(source: &FileRecord, target: &FileRecord) -> Slot {
	let same_size = source.size == target.size;
	// Full precision here; whole seconds only when picking the newer side
	let same_time = source.mtime == target.mtime && source.mtime_nanos == target.mtime_nanos;

	match (same_size, same_time) {
		(true, true) => {
			Slot::Decided(Action::NoAction { path: source.relative_path.clone(), resolution: None })
		}
		(true, false) => Slot::NeedsHash(source.clone(), target.clone()),
		(false, _) => newer_wins(source.clone(), target.clone()),
	}
}

fn settle_hashed(
	mut source: FileRecord,
	mut target: FileRecord,
	source_hash: ContentHash,
	target_hash: ContentHash,
) -> Slot {
	source.content_hash = Some(source_hash);
	target.content_hash = Some(target_hash);
	if source_hash == target_hash {
		Slot::Decided(Action::NoAction { path: source.relative_path, resolution: None })
	} else {
		newer_wins(source, target)
	}
}

/// Contents are known to differ: the strictly newer side wins
fn newer_wins(source: FileRecord, target: FileRecord) -> Slot {
	match source.mtime.cmp(&target.mtime) {
		Ordering::Greater => Slot::Decided(Action::UpdateTarget { source, target, resolution: None }),
		Ordering::Less => Slot::Decided(Action::UpdateSource { source, target, resolution: None }),
		Ordering::Equal => Slot::Conflict(Conflict::new(source, target)),
	}
}


// vim: ts=4
