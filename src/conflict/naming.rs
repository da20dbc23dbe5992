//! Names for the renamed copy of a keep-both conflict
//!
//! `<stem>.sync-conflict-<YYYYMMDD-HHMMSS>[-<n>].<ext>`, in the same directory as
//! the original. The marker is excluded from every scan, so conflict copies are
//! never synchronized back to the other side.

use chrono::{DateTime, Utc};

/// Marker embedded in every conflict copy name
pub const CONFLICT_MARKER: &str = ".sync-conflict-";

/// Timestamp layout used in conflict copy names
const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Build the conflict copy name for `relative_path`
///
/// `attempt` 1 yields the plain name; 2 and above append `-<attempt>`.
pub fn conflict_copy_name(relative_path: &str, started_at: &DateTime<Utc>, attempt: u32) -> String {
	let (dir, file_name) = match relative_path.rfind('/') {
		Some(i) => (&relative_path[..=i], &relative_path[i + 1..]),
		None => ("", relative_path),
	};

	// A leading dot starts a hidden name, not an extension
	let (stem, ext) = match file_name.rfind('.') {
		Some(i) if i > 0 => (&file_name[..i], Some(&file_name[i + 1..])),
		_ => (file_name, None),
	};

	let mut name = format!("{}{}{}{}", dir, stem, CONFLICT_MARKER, started_at.format(STAMP_FORMAT));
	if attempt > 1 {
		name.push_str(&format!("-{}", attempt));
	}
	if let Some(ext) = ext {
		name.push('.');
		name.push_str(ext);
	}
	name
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn stamp() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
	}

	#[test]
	fn test_name_with_extension() {
		assert_eq!(
			conflict_copy_name("notes.txt", &stamp(), 1),
			"notes.sync-conflict-20240309-140507.txt"
		);
	}

	#[test]
	fn test_name_keeps_directory() {
		assert_eq!(
			conflict_copy_name("docs/report.final.pdf", &stamp(), 1),
			"docs/report.final.sync-conflict-20240309-140507.pdf"
		);
	}

	#[test]
	fn test_name_without_extension() {
		assert_eq!(conflict_copy_name("Makefile", &stamp(), 1), "Makefile.sync-conflict-20240309-140507");
		assert_eq!(
			conflict_copy_name("home/.bashrc", &stamp(), 1),
			"home/.bashrc.sync-conflict-20240309-140507"
		);
	}

	#[test]
	fn test_attempt_suffix() {
		assert_eq!(
			conflict_copy_name("a.txt", &stamp(), 2),
			"a.sync-conflict-20240309-140507-2.txt"
		);
		assert_eq!(
			conflict_copy_name("a.txt", &stamp(), 3),
			"a.sync-conflict-20240309-140507-3.txt"
		);
	}
}

// vim: ts=4
