//! Callback traits for progress reporting and conflict decisions

use crate::conflict::Conflict;
use crate::plan::ActionKind;
use crate::strategies::ConflictDecision;
use crate::types::Side;

/// Events emitted while a run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
	/// Periodic update while one tree is walked
	Scanning { side: Side, files: usize, bytes: u64 },

	/// One tree is fully walked
	Scanned { side: Side, files: usize, bytes: u64, warnings: usize },

	/// Content hashing of ambiguous paths
	Hashing { done: usize, total: usize },

	/// The executor is about to attempt an action (index is 1-based)
	ActionStarted { index: usize, total: usize, kind: ActionKind, path: String },
}

/// Callback for progress updates
pub trait ProgressCallback: Send + Sync {
	fn on_event(&self, event: ProgressEvent);
}

impl<T: Fn(ProgressEvent) + Send + Sync> ProgressCallback for T {
	fn on_event(&self, event: ProgressEvent) {
		self(event);
	}
}

/// Default progress callback that does nothing
pub struct NoProgress;

impl ProgressCallback for NoProgress {
	fn on_event(&self, _event: ProgressEvent) {}
}

/// Supplies one decision per conflict
///
/// Called once per conflict, in path order, after the whole plan is known.
pub trait ConflictCallback {
	fn decide(&mut self, conflict: &Conflict) -> ConflictDecision;
}

impl<F: FnMut(&Conflict) -> ConflictDecision> ConflictCallback for F {
	fn decide(&mut self, conflict: &Conflict) -> ConflictDecision {
		self(conflict)
	}
}

/// A global auto-resolve policy: the same decision for every conflict
pub struct AutoResolve(pub ConflictDecision);

impl ConflictCallback for AutoResolve {
	fn decide(&mut self, _conflict: &Conflict) -> ConflictDecision {
		self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::FileRecord;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	fn conflict() -> Conflict {
		Conflict::new(FileRecord::new("a.txt", 1, 100), FileRecord::new("a.txt", 2, 100))
	}

	#[test]
	fn test_auto_resolve_is_uniform() {
		let mut policy = AutoResolve(ConflictDecision::TargetWins);
		assert_eq!(policy.decide(&conflict()), ConflictDecision::TargetWins);
		assert_eq!(policy.decide(&conflict()), ConflictDecision::TargetWins);
	}

	#[test]
	fn test_closure_as_conflict_callback() {
		let mut seen = Vec::new();
		let mut cb = |c: &Conflict| {
			seen.push(c.path.clone());
			ConflictDecision::Skip
		};
		assert_eq!(cb.decide(&conflict()), ConflictDecision::Skip);
		assert_eq!(seen, vec!["a.txt".to_string()]);
	}

	#[test]
	fn test_closure_as_progress_callback() {
		let count = Arc::new(AtomicUsize::new(0));
		let c = count.clone();
		let cb = move |_e: ProgressEvent| {
			c.fetch_add(1, Ordering::SeqCst);
		};
		cb.on_event(ProgressEvent::Hashing { done: 1, total: 2 });
		NoProgress.on_event(ProgressEvent::Hashing { done: 1, total: 2 });
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}
}

// vim: ts=4
