//! Text rendering of plans and run reports for the terminal

use chrono::DateTime;
use std::fmt::Write;

use crate::plan::{Action, ActionKind};
use crate::sync::{Analysis, SyncReport};
use crate::sync_log::RunStatus;

/// Planned actions listed before the rest are summarized
pub const PLAN_PREVIEW_LIMIT: usize = 10;

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
	const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
	if bytes < 1000 {
		return format!("{} B", bytes);
	}
	let mut value = bytes as f64;
	let mut unit = 0;
	while value >= 1000.0 && unit < UNITS.len() - 1 {
		value /= 1000.0;
		unit += 1;
	}
	format!("{:.1} {}", value, UNITS[unit])
}

/// Modification time in UTC, `YYYY-MM-DD HH:MM:SS`
pub fn format_mtime(secs: i64) -> String {
	match DateTime::from_timestamp(secs, 0) {
		Some(t) => t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
		None => secs.to_string(),
	}
}

/// Counts per kind, a preview of the changes and the conflict list
pub fn render_analysis(analysis: &Analysis) -> String {
	let plan = &analysis.plan;
	let mut out = String::new();

	let _ = writeln!(
		out,
		"Source: {} files ({}), target: {} files ({})",
		analysis.source.len(),
		format_size(analysis.source.total_bytes()),
		analysis.target.len(),
		format_size(analysis.target.total_bytes())
	);

	for (kind, count) in plan.counts() {
		if kind != ActionKind::NoAction {
			let _ = writeln!(out, "  {:<20} {}", kind.label(), count);
		}
	}

	let changes: Vec<&Action> = plan.changes().collect();
	if changes.is_empty() && plan.conflicts.is_empty() {
		let _ = writeln!(out, "Everything is in sync.");
	}

	if !changes.is_empty() {
		let _ = writeln!(out, "\nPlanned actions:");
		for action in changes.iter().take(PLAN_PREVIEW_LIMIT) {
			let _ = writeln!(
				out,
				"  {} {} ({})",
				action.kind().label(),
				action.path(),
				format_size(action.transfer_bytes())
			);
		}
		if changes.len() > PLAN_PREVIEW_LIMIT {
			let _ = writeln!(out, "  ... and {} more", changes.len() - PLAN_PREVIEW_LIMIT);
		}
		let _ = writeln!(out, "  Total to transfer: {}", format_size(plan.transfer_bytes()));
	}

	if !plan.conflicts.is_empty() {
		let _ = writeln!(out, "\nConflicts:");
		for c in &plan.conflicts {
			let _ = writeln!(
				out,
				"  {}  source {} @ {}  target {} @ {}",
				c.path,
				format_size(c.source.size),
				format_mtime(c.source.mtime),
				format_size(c.target.size),
				format_mtime(c.target.mtime)
			);
		}
	}

	if !plan.warnings.is_empty() {
		let _ = writeln!(out, "\nSkipped paths:");
		for w in &plan.warnings {
			let _ = writeln!(out, "  {}", w);
		}
	}

	out
}

/// Final summary of a run
pub fn render_report(report: &SyncReport, dry_run: bool) -> String {
	let s = &report.summary;
	let mut out = String::new();

	let headline = match (report.status, dry_run) {
		(RunStatus::Aborted, _) => "Sync aborted",
		(_, true) => "Dry run complete (no changes made)",
		(RunStatus::Clean, false) => "Sync complete",
		(RunStatus::CompletedWithFailures, false) => "Sync completed with failures",
	};
	let _ = writeln!(out, "{}", headline);
	let _ = writeln!(out, "  Copied to target:   {}", s.copied_to_target);
	let _ = writeln!(out, "  Copied to source:   {}", s.copied_to_source);
	let _ = writeln!(out, "  Updated target:     {}", s.updated_target);
	let _ = writeln!(out, "  Updated source:     {}", s.updated_source);
	let _ = writeln!(out, "  Conflicts resolved: {}", s.conflicts_resolved);
	let _ = writeln!(out, "  Skipped:            {}", s.skipped);
	let _ = writeln!(out, "  Failed:             {}", s.failed);
	if !report.warnings.is_empty() {
		let _ = writeln!(out, "  Warnings:           {}", report.warnings.len());
	}

	match (&report.log_path, &report.log_error) {
		(_, Some(e)) => {
			let _ = writeln!(out, "Log NOT written: {}", e);
		}
		(Some(path), None) => {
			let _ = writeln!(out, "Log written to {}", path.display());
		}
		(None, None) => {}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::conflict::Conflict;
	use crate::plan::Plan;
	use crate::sync_log::LogSummary;
	use crate::types::{FileRecord, Inventory, Side};
	use chrono::Utc;
	use std::path::PathBuf;

	#[test]
	fn test_format_size() {
		assert_eq!(format_size(0), "0 B");
		assert_eq!(format_size(999), "999 B");
		assert_eq!(format_size(1500), "1.5 KB");
		assert_eq!(format_size(2_500_000), "2.5 MB");
	}

	#[test]
	fn test_format_mtime() {
		assert_eq!(format_mtime(0), "1970-01-01 00:00:00 UTC");
	}

	#[test]
	fn test_render_analysis_preview_and_conflicts() {
		let actions = (0..12)
			.map(|i| Action::CopyToTarget { source: FileRecord::new(format!("f{:02}", i), 10, 1) })
			.collect();
		let analysis = Analysis {
			source: Inventory::from_records(Side::Source, "/s", vec![]),
			target: Inventory::from_records(Side::Target, "/t", vec![]),
			plan: Plan {
				actions,
				conflicts: vec![Conflict::new(FileRecord::new("c.txt", 1, 0), FileRecord::new("c.txt", 2, 0))],
				warnings: vec![],
			},
			started_at: Utc::now(),
		};

		let text = render_analysis(&analysis);
		assert!(text.contains("f09"));
		assert!(!text.contains("f10"));
		assert!(text.contains("... and 2 more"));
		assert!(text.contains("Conflicts:"));
		assert!(text.contains("c.txt"));
	}

	#[test]
	fn test_render_report() {
		let report = SyncReport {
			status: RunStatus::CompletedWithFailures,
			summary: LogSummary { copied_to_target: 3, failed: 1, ..Default::default() },
			log_path: Some(PathBuf::from("/tmp/log.json")),
			log_error: None,
			warnings: vec![],
		};
		let text = render_report(&report, false);
		assert!(text.starts_with("Sync completed with failures"));
		assert!(text.contains("Copied to target:   3"));
		assert!(text.contains("/tmp/log.json"));
	}
}

// vim: ts=4
