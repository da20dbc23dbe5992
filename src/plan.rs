//! Planned actions produced by the classifier and the conflict resolver

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::conflict::Conflict;
use crate::strategies::ConflictDecision;
use crate::types::{FileRecord, ScanWarning};

/// Kind of a path-level decision, as it appears in the run log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
	CopyToTarget,
	CopyToSource,
	UpdateTarget,
	UpdateSource,
	NoAction,
	Conflict,
	KeepBothResolved,
}

impl ActionKind {
	pub fn as_str(self) -> &'static str {
		match self {
			ActionKind::CopyToTarget => "copy_to_target",
			ActionKind::CopyToSource => "copy_to_source",
			ActionKind::UpdateTarget => "update_target",
			ActionKind::UpdateSource => "update_source",
			ActionKind::NoAction => "no_action",
			ActionKind::Conflict => "conflict",
			ActionKind::KeepBothResolved => "keep_both_resolved",
		}
	}

	/// Human-readable label with a direction arrow
	pub fn label(self) -> &'static str {
		match self {
			ActionKind::CopyToTarget => "→ Copy to target",
			ActionKind::CopyToSource => "← Copy to source",
			ActionKind::UpdateTarget => "→ Update target",
			ActionKind::UpdateSource => "← Update source",
			ActionKind::NoAction => "  Unchanged",
			ActionKind::Conflict => "! Conflict",
			ActionKind::KeepBothResolved => "→ Keep both",
		}
	}
}

impl fmt::Display for ActionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One path-level decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
	/// Present only in source
	CopyToTarget { source: FileRecord },

	/// Present only in target
	CopyToSource { target: FileRecord },

	/// Source version replaces the target version
	UpdateTarget { source: FileRecord, target: FileRecord, resolution: Option<ConflictDecision> },

	/// Target version replaces the source version
	UpdateSource { source: FileRecord, target: FileRecord, resolution: Option<ConflictDecision> },

	/// Nothing to do; `resolution` is `Some(Skip)` for a skipped conflict
	NoAction { path: String, resolution: Option<ConflictDecision> },

	/// Needs a decision before it can be executed
	Conflict(Conflict),

	/// Target renamed to `renamed_to`, then source copied under the original name
	KeepBothResolved { source: FileRecord, target: FileRecord, renamed_to: String },
}

impl Action {
	pub fn kind(&self) -> ActionKind {
		match self {
			Action::CopyToTarget { .. } => ActionKind::CopyToTarget,
			Action::CopyToSource { .. } => ActionKind::CopyToSource,
			Action::UpdateTarget { .. } => ActionKind::UpdateTarget,
			Action::UpdateSource { .. } => ActionKind::UpdateSource,
			Action::NoAction { .. } => ActionKind::NoAction,
			Action::Conflict(_) => ActionKind::Conflict,
			Action::KeepBothResolved { .. } => ActionKind::KeepBothResolved,
		}
	}

	/// Relative path this action is about
	pub fn path(&self) -> &str {
		match self {
			Action::CopyToTarget { source } => &source.relative_path,
			Action::CopyToSource { target } => &target.relative_path,
			Action::UpdateTarget { source, .. } => &source.relative_path,
			Action::UpdateSource { target, .. } => &target.relative_path,
			Action::NoAction { path, .. } => path,
			Action::Conflict(c) => &c.path,
			Action::KeepBothResolved { source, .. } => &source.relative_path,
		}
	}

	/// Conflict decision this action came from, if any
	pub fn resolution(&self) -> Option<ConflictDecision> {
		match self {
			Action::UpdateTarget { resolution, .. }
			| Action::UpdateSource { resolution, .. }
			| Action::NoAction { resolution, .. } => *resolution,
			Action::KeepBothResolved { .. } => Some(ConflictDecision::KeepBoth),
			_ => None,
		}
	}

	/// Source-side record, when the action carries one
	pub fn source_record(&self) -> Option<&FileRecord> {
		match self {
			Action::CopyToTarget { source }
			| Action::UpdateTarget { source, .. }
			| Action::UpdateSource { source, .. }
			| Action::KeepBothResolved { source, .. } => Some(source),
			Action::Conflict(c) => Some(&c.source),
			_ => None,
		}
	}

	/// Target-side record, when the action carries one
	pub fn target_record(&self) -> Option<&FileRecord> {
		match self {
			Action::CopyToSource { target }
			| Action::UpdateTarget { target, .. }
			| Action::UpdateSource { target, .. }
			| Action::KeepBothResolved { target, .. } => Some(target),
			Action::Conflict(c) => Some(&c.target),
			_ => None,
		}
	}

	/// Whether the executor will touch the filesystem for this action
	pub fn is_change(&self) -> bool {
		!matches!(self, Action::NoAction { .. } | Action::Conflict(_))
	}

	/// Bytes that will be copied when this action is applied
	pub fn transfer_bytes(&self) -> u64 {
		match self {
			Action::CopyToTarget { source }
			| Action::UpdateTarget { source, .. }
			| Action::KeepBothResolved { source, .. } => source.size,
			Action::CopyToSource { target } | Action::UpdateSource { target, .. } => target.size,
			_ => 0,
		}
	}
}

/// Output of the classifier: executable actions plus the conflicts to settle
#[derive(Debug, Clone, Default)]
pub struct Plan {
	/// Non-conflict actions in path order, `NoAction` entries included
	pub actions: Vec<Action>,

	/// Paths that changed on both sides with equal timestamps
	pub conflicts: Vec<Conflict>,

	/// Paths dropped from this run
	pub warnings: Vec<ScanWarning>,
}

impl Plan {
	/// Actions that change the filesystem
	pub fn changes(&self) -> impl Iterator<Item = &Action> {
		self.actions.iter().filter(|a| a.is_change())
	}

	/// Number of actions per kind, conflicts included
	pub fn counts(&self) -> BTreeMap<ActionKind, usize> {
		let mut counts = BTreeMap::new();
		for action in &self.actions {
			*counts.entry(action.kind()).or_insert(0) += 1;
		}
		if !self.conflicts.is_empty() {
			counts.insert(ActionKind::Conflict, self.conflicts.len());
		}
		counts
	}

	/// True when nothing needs copying and no conflict is pending
	pub fn is_in_sync(&self) -> bool {
		self.conflicts.is_empty() && self.changes().next().is_none()
	}

	pub fn transfer_bytes(&self) -> u64 {
		self.actions.iter().map(Action::transfer_bytes).sum()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rec(path: &str, size: u64) -> FileRecord {
		FileRecord::new(path, size, 1000)
	}

	#[test]
	fn test_action_accessors() {
		let a = Action::CopyToSource { target: rec("b.txt", 7) };
		assert_eq!(a.kind(), ActionKind::CopyToSource);
		assert_eq!(a.path(), "b.txt");
		assert!(a.source_record().is_none());
		assert_eq!(a.target_record().map(|r| r.size), Some(7));
		assert_eq!(a.transfer_bytes(), 7);
		assert!(a.is_change());
	}

	#[test]
	fn test_keep_both_resolution() {
		let a = Action::KeepBothResolved {
			source: rec("c.txt", 3),
			target: rec("c.txt", 4),
			renamed_to: "c.sync-conflict-20240101-000000.txt".to_string(),
		};
		assert_eq!(a.resolution(), Some(ConflictDecision::KeepBoth));
		assert_eq!(a.transfer_bytes(), 3);
	}

	#[test]
	fn test_plan_counts_and_sync_state() {
		let plan = Plan {
			actions: vec![
				Action::CopyToTarget { source: rec("a", 1) },
				Action::NoAction { path: "b".to_string(), resolution: None },
				Action::CopyToTarget { source: rec("c", 2) },
			],
			conflicts: vec![Conflict::new(rec("d", 1), rec("d", 2))],
			warnings: vec![],
		};
		let counts = plan.counts();
		assert_eq!(counts[&ActionKind::CopyToTarget], 2);
		assert_eq!(counts[&ActionKind::NoAction], 1);
		assert_eq!(counts[&ActionKind::Conflict], 1);
		assert_eq!(plan.changes().count(), 2);
		assert_eq!(plan.transfer_bytes(), 3);
		assert!(!plan.is_in_sync());

		let quiet = Plan {
			actions: vec![Action::NoAction { path: "b".to_string(), resolution: None }],
			..Default::default()
		};
		assert!(quiet.is_in_sync());
	}

	#[test]
	fn test_kind_strings() {
		assert_eq!(ActionKind::UpdateSource.as_str(), "update_source");
		assert_eq!(
			serde_json::to_string(&ActionKind::KeepBothResolved).unwrap(),
			"\"keep_both_resolved\""
		);
	}
}

// vim: ts=4
