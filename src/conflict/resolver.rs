//! Turns conflicts into concrete actions

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::naming::conflict_copy_name;
use super::Conflict;
use crate::callbacks::ConflictCallback;
use crate::logging::*;
use crate::plan::Action;
use crate::strategies::ConflictDecision;
use crate::types::{join_relative, Inventory};

/// Resolves conflicts one at a time, in path order
///
/// Owns the set of keep-both names handed out during the run so that two
/// conflicts never receive the same rename target.
pub struct ConflictResolver<'a> {
	source: &'a Inventory,
	target: &'a Inventory,
	started_at: DateTime<Utc>,
	allocated: HashSet<String>,
}

impl<'a> ConflictResolver<'a> {
	pub fn new(source: &'a Inventory, target: &'a Inventory, started_at: DateTime<Utc>) -> Self {
		ConflictResolver { source, target, started_at, allocated: HashSet::new() }
	}

	/// Ask `callback` for every conflict and return the resolved actions
	pub fn resolve_all(
		&mut self,
		mut conflicts: Vec<Conflict>,
		callback: &mut dyn ConflictCallback,
	) -> Vec<Action> {
		conflicts.sort_by(|a, b| a.path.cmp(&b.path));
		conflicts
			.into_iter()
			.map(|conflict| {
				let decision = callback.decide(&conflict);
				self.resolve(conflict, decision)
			})
			.collect()
	}

	/// Apply one decision to one conflict
	pub fn resolve(&mut self, conflict: Conflict, decision: ConflictDecision) -> Action {
		debug!("Conflict {}: {}", conflict.path, decision);
		let Conflict { path, source, target } = conflict;

		match decision {
			ConflictDecision::SourceWins => {
				Action::UpdateTarget { source, target, resolution: Some(decision) }
			}
			ConflictDecision::TargetWins => {
				Action::UpdateSource { source, target, resolution: Some(decision) }
			}
			ConflictDecision::KeepBoth => {
				let renamed_to = self.allocate_name(&path);
				Action::KeepBothResolved { source, target, renamed_to }
			}
			ConflictDecision::Skip => Action::NoAction { path, resolution: Some(decision) },
		}
	}

	/// First free conflict copy name for `path`
	fn allocate_name(&mut self, path: &str) -> String {
		let mut attempt = 1;
		loop {
			let candidate = conflict_copy_name(path, &self.started_at, attempt);
			if !self.is_taken(&candidate) {
				self.allocated.insert(candidate.clone());
				return candidate;
			}
			attempt += 1;
		}
	}

	fn is_taken(&self, candidate: &str) -> bool {
		self.allocated.contains(candidate)
			|| self.source.contains(candidate)
			|| self.target.contains(candidate)
			// Conflict copies from earlier runs are excluded from scans
			|| join_relative(self.target.root(), candidate).symlink_metadata().is_ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::callbacks::AutoResolve;
	use crate::types::{FileRecord, Side};
	use chrono::TimeZone;
	use std::fs;
	use tempfile::TempDir;

	fn stamp() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
	}

	fn conflict(path: &str) -> Conflict {
		Conflict::new(FileRecord::new(path, 1, 100), FileRecord::new(path, 2, 100))
	}

	fn empty(side: Side, root: &std::path::Path) -> Inventory {
		Inventory::from_records(side, root, Vec::new())
	}

	#[test]
	fn test_source_and_target_wins() {
		let dir = TempDir::new().unwrap();
		let (s, t) = (empty(Side::Source, dir.path()), empty(Side::Target, dir.path()));
		let mut resolver = ConflictResolver::new(&s, &t, stamp());

		let a = resolver.resolve(conflict("x"), ConflictDecision::SourceWins);
		assert!(matches!(
			a,
			Action::UpdateTarget { resolution: Some(ConflictDecision::SourceWins), .. }
		));

		let a = resolver.resolve(conflict("x"), ConflictDecision::TargetWins);
		assert!(matches!(a, Action::UpdateSource { .. }));
	}

	#[test]
	fn test_skip_becomes_no_action() {
		let dir = TempDir::new().unwrap();
		let (s, t) = (empty(Side::Source, dir.path()), empty(Side::Target, dir.path()));
		let mut resolver = ConflictResolver::new(&s, &t, stamp());

		let a = resolver.resolve(conflict("x"), ConflictDecision::Skip);
		assert_eq!(
			a,
			Action::NoAction { path: "x".to_string(), resolution: Some(ConflictDecision::Skip) }
		);
	}

	#[test]
	fn test_keep_both_avoids_inventory_and_disk_names() {
		let dir = TempDir::new().unwrap();
		let s = Inventory::from_records(
			Side::Source,
			dir.path(),
			vec![FileRecord::new("a.sync-conflict-20240102-030405.txt", 1, 1)],
		);
		let t = empty(Side::Target, dir.path());
		fs::write(dir.path().join("a.sync-conflict-20240102-030405-2.txt"), b"old").unwrap();

		let mut resolver = ConflictResolver::new(&s, &t, stamp());
		match resolver.resolve(conflict("a.txt"), ConflictDecision::KeepBoth) {
			Action::KeepBothResolved { renamed_to, .. } => {
				assert_eq!(renamed_to, "a.sync-conflict-20240102-030405-3.txt");
			}
			other => panic!("unexpected action {:?}", other),
		}
	}

	#[test]
	fn test_resolve_all_in_path_order_with_unique_names() {
		let dir = TempDir::new().unwrap();
		let (s, t) = (empty(Side::Source, dir.path()), empty(Side::Target, dir.path()));
		let mut resolver = ConflictResolver::new(&s, &t, stamp());

		let mut seen = Vec::new();
		let mut cb = |c: &Conflict| {
			seen.push(c.path.clone());
			ConflictDecision::KeepBoth
		};
		let actions = resolver.resolve_all(vec![conflict("b.txt"), conflict("a.txt")], &mut cb);
		assert_eq!(seen, vec!["a.txt", "b.txt"]);
		assert_eq!(actions[0].path(), "a.txt");
		assert_eq!(actions[1].path(), "b.txt");

		let mut auto = AutoResolve(ConflictDecision::KeepBoth);
		let again = resolver.resolve_all(vec![conflict("a.txt")], &mut auto);
		match &again[0] {
			Action::KeepBothResolved { renamed_to, .. } => {
				assert_eq!(renamed_to, "a.sync-conflict-20240102-030405-2.txt");
			}
			other => panic!("unexpected action {:?}", other),
		}
	}
}

// vim: ts=4
