//! Inventory builder: walks one tree and records its regular files
//!
//! Only size and modification time are captured here. Entries are visited on a
//! bounded pool of walker threads and merged into a sorted map afterwards, so
//! the resulting inventory does not depend on thread scheduling.

use filetime::FileTime;
use ignore::{DirEntry, WalkBuilder, WalkState};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;

use crate::callbacks::{ProgressCallback, ProgressEvent};
use crate::error::ScanError;
use crate::exclusion::ExclusionEngine;
use crate::logging::*;
use crate::types::{FileRecord, Inventory, ScanWarning, Side};

/// Emit a `Scanning` event every this many files
const PROGRESS_EVERY: usize = 256;

enum ScanItem {
	File(FileRecord),
	Warning(ScanWarning),
}

/// Check that `root` is a readable directory
pub fn check_root(root: &Path) -> Result<(), ScanError> {
	let meta = fs::metadata(root).map_err(|e| match e.kind() {
		io::ErrorKind::NotFound => ScanError::NotFound { path: root.to_path_buf() },
		_ => ScanError::Unreadable { path: root.to_path_buf(), source: e },
	})?;
	if !meta.is_dir() {
		return Err(ScanError::NotADirectory { path: root.to_path_buf() });
	}
	fs::read_dir(root).map_err(|e| ScanError::Unreadable { path: root.to_path_buf(), source: e })?;
	Ok(())
}

/// Walk `root` and build its inventory
///
/// Fails only when the root itself is unusable. Unreadable entries below the
/// root become warnings and are left out.
pub fn scan_tree(
	side: Side,
	root: &Path,
	exclusion: &ExclusionEngine,
	parallelism: usize,
	progress: &dyn ProgressCallback,
) -> Result<Inventory, ScanError> {
	check_root(root)?;
	debug!("Scanning {} tree {}", side, root.display());

	let walker = WalkBuilder::new(root)
		.standard_filters(false)
		.follow_links(false)
		.threads(parallelism.max(1))
		.build_parallel();

	let files_seen = AtomicUsize::new(0);
	let bytes_seen = AtomicU64::new(0);
	let (tx, rx) = mpsc::channel();

	walker.run(|| {
		let tx = tx.clone();
		let files_seen = &files_seen;
		let bytes_seen = &bytes_seen;
		Box::new(move |result: Result<DirEntry, ignore::Error>| {
			let entry = match result {
				Ok(entry) => entry,
				Err(err) => {
					let path = error_path(&err).map(|p| relative_display(root, p)).unwrap_or_default();
					let _ = tx.send(ScanItem::Warning(ScanWarning { side, path, reason: err.to_string() }));
					return WalkState::Continue;
				}
			};

			if entry.depth() == 0 {
				return WalkState::Continue;
			}

			let Some(file_type) = entry.file_type() else {
				return WalkState::Continue;
			};
			if file_type.is_symlink() {
				return WalkState::Continue;
			}

			let relative = match relative_path(root, entry.path()) {
				Some(rel) => rel,
				None => {
					let _ = tx.send(ScanItem::Warning(ScanWarning {
						side,
						path: relative_display(root, entry.path()),
						reason: "file name is not valid UTF-8".to_string(),
					}));
					return if file_type.is_dir() { WalkState::Skip } else { WalkState::Continue };
				}
			};

			if exclusion.should_exclude(Path::new(&relative), file_type.is_dir()) {
				return if file_type.is_dir() { WalkState::Skip } else { WalkState::Continue };
			}

			if !file_type.is_file() {
				return WalkState::Continue;
			}

			let item = match record_for(side, &entry, relative) {
				Ok(record) => {
					let n = files_seen.fetch_add(1, Ordering::Relaxed) + 1;
					let bytes = bytes_seen.fetch_add(record.size, Ordering::Relaxed) + record.size;
					if n % PROGRESS_EVERY == 0 {
						progress.on_event(ProgressEvent::Scanning { side, files: n, bytes });
					}
					ScanItem::File(record)
				}
				Err(warning) => ScanItem::Warning(warning),
			};
			let _ = tx.send(item);
			WalkState::Continue
		})
	});
	drop(tx);

	let mut files = BTreeMap::new();
	let mut warnings = Vec::new();
	for item in rx {
		match item {
			ScanItem::File(record) => {
				files.insert(record.relative_path.clone(), record);
			}
			ScanItem::Warning(warning) => {
				warn!("{}", warning);
				warnings.push(warning);
			}
		}
	}
	warnings.sort_by(|a, b| a.path.cmp(&b.path));

	let inventory = Inventory::new(side, root.to_path_buf(), files, warnings);
	progress.on_event(ProgressEvent::Scanned {
		side,
		files: inventory.len(),
		bytes: inventory.total_bytes(),
		warnings: inventory.warnings().len(),
	});
	info!("Scanned {} tree: {} files, {} warnings", side, inventory.len(), inventory.warnings().len());
	Ok(inventory)
}

/// Inventory of a tree that does not exist yet
pub fn empty_inventory(side: Side, root: &Path) -> Inventory {
	Inventory::new(side, root.to_path_buf(), BTreeMap::new(), Vec::new())
}

fn record_for(side: Side, entry: &DirEntry, relative: String) -> Result<FileRecord, ScanWarning> {
	match entry.metadata() {
		Ok(meta) => {
			let mtime = FileTime::from_last_modification_time(&meta);
			Ok(FileRecord::new(relative, meta.len(), mtime.unix_seconds())
				.with_nanos(mtime.nanoseconds()))
		}
		Err(err) => Err(ScanWarning { side, path: relative, reason: err.to_string() }),
	}
}

/// `/`-separated path of `path` below `root`, `None` for non-UTF-8 names
fn relative_path(root: &Path, path: &Path) -> Option<String> {
	let rel = path.strip_prefix(root).ok()?;
	let mut parts = Vec::new();
	for component in rel.components() {
		match component {
			Component::Normal(name) => parts.push(name.to_str()?),
			_ => return None,
		}
	}
	Some(parts.join("/"))
}

fn relative_display(root: &Path, path: &Path) -> String {
	path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/")
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
	match err {
		ignore::Error::WithPath { path, .. } => Some(path.as_path()),
		ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
			error_path(err)
		}
		ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::callbacks::NoProgress;
	use filetime::set_file_mtime;
	use std::fs;
	use tempfile::TempDir;

	fn engine(root: &Path, patterns: &[&str]) -> ExclusionEngine {
		let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
		ExclusionEngine::new(&patterns, root, true).unwrap()
	}

	#[test]
	fn test_scan_nested_files_sorted() {
		let dir = TempDir::new().unwrap();
		fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
		fs::write(dir.path().join("z.txt"), b"zz").unwrap();
		fs::write(dir.path().join("sub/a.txt"), b"a").unwrap();
		fs::write(dir.path().join("sub/deeper/b.bin"), b"bbb").unwrap();

		let inv =
			scan_tree(Side::Source, dir.path(), &engine(dir.path(), &[]), 2, &NoProgress).unwrap();
		let paths: Vec<&str> = inv.paths().collect();
		assert_eq!(paths, vec!["sub/a.txt", "sub/deeper/b.bin", "z.txt"]);
		assert_eq!(inv.get("sub/deeper/b.bin").unwrap().size, 3);
		assert!(inv.warnings().is_empty());
	}

	#[test]
	fn test_scan_captures_mtime() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("f.txt");
		fs::write(&path, b"x").unwrap();
		set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 500)).unwrap();

		let inv =
			scan_tree(Side::Target, dir.path(), &engine(dir.path(), &[]), 1, &NoProgress).unwrap();
		let rec = inv.get("f.txt").unwrap();
		assert_eq!(rec.mtime, 1_600_000_000);
		assert!(rec.content_hash.is_none());
	}

	#[test]
	fn test_scan_applies_exclusions() {
		let dir = TempDir::new().unwrap();
		fs::create_dir(dir.path().join("build")).unwrap();
		fs::write(dir.path().join("build/out.o"), b"o").unwrap();
		fs::write(dir.path().join("keep.txt"), b"k").unwrap();
		fs::write(dir.path().join("debug.log"), b"l").unwrap();
		fs::write(dir.path().join(".DS_Store"), b"d").unwrap();
		fs::write(dir.path().join("keep.sync-conflict-20240101-000000.txt"), b"c").unwrap();

		let inv = scan_tree(
			Side::Source,
			dir.path(),
			&engine(dir.path(), &["*.log", "build"]),
			2,
			&NoProgress,
		)
		.unwrap();
		let paths: Vec<&str> = inv.paths().collect();
		assert_eq!(paths, vec!["keep.txt"]);
	}

	#[cfg(unix)]
	#[test]
	fn test_scan_skips_symlinks() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("real.txt"), b"r").unwrap();
		std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();

		let inv =
			scan_tree(Side::Source, dir.path(), &engine(dir.path(), &[]), 1, &NoProgress).unwrap();
		let paths: Vec<&str> = inv.paths().collect();
		assert_eq!(paths, vec!["real.txt"]);
	}

	#[cfg(unix)]
	#[test]
	fn test_unreadable_subdirectory_becomes_warning() {
		use std::os::unix::fs::PermissionsExt;

		let dir = TempDir::new().unwrap();
		fs::create_dir(dir.path().join("locked")).unwrap();
		fs::write(dir.path().join("locked/hidden.txt"), b"h").unwrap();
		fs::write(dir.path().join("open.txt"), b"o").unwrap();
		fs::set_permissions(dir.path().join("locked"), fs::Permissions::from_mode(0o000)).unwrap();

		// Root ignores permission bits
		if fs::read_dir(dir.path().join("locked")).is_ok() {
			fs::set_permissions(dir.path().join("locked"), fs::Permissions::from_mode(0o755)).unwrap();
			return;
		}

		let result = scan_tree(Side::Source, dir.path(), &engine(dir.path(), &[]), 2, &NoProgress);
		fs::set_permissions(dir.path().join("locked"), fs::Permissions::from_mode(0o755)).unwrap();

		let inv = result.unwrap();
		let paths: Vec<&str> = inv.paths().collect();
		assert_eq!(paths, vec!["open.txt"]);
		assert_eq!(inv.warnings().len(), 1);
		assert_eq!(inv.warnings()[0].side, Side::Source);
		assert!(inv.warnings()[0].path.starts_with("locked"), "{:?}", inv.warnings());
	}

	#[test]
	fn test_missing_root_is_fatal() {
		let dir = TempDir::new().unwrap();
		let missing = dir.path().join("nope");
		let err = scan_tree(Side::Source, &missing, &engine(dir.path(), &[]), 1, &NoProgress)
			.unwrap_err();
		assert!(matches!(err, ScanError::NotFound { .. }));
	}

	#[test]
	fn test_file_root_is_fatal() {
		let dir = TempDir::new().unwrap();
		let file = dir.path().join("file");
		fs::write(&file, b"x").unwrap();
		let err =
			scan_tree(Side::Source, &file, &engine(dir.path(), &[]), 1, &NoProgress).unwrap_err();
		assert!(matches!(err, ScanError::NotADirectory { .. }));
	}

	#[test]
	fn test_relative_path_separator() {
		let root = Path::new("/r");
		assert_eq!(relative_path(root, Path::new("/r/a/b.txt")).as_deref(), Some("a/b.txt"));
	}
}

// vim: ts=4
