/// Classifier tests over real directory trees
///
/// Trees are built in temp directories with pinned modification times, scanned
/// through the engine and checked against the decision table:
/// 1. Identical trees produce only NoAction
/// 2. One-sided paths are copied in the right direction
/// 3. Differing content favors the newer side, symmetrically
/// 4. Differing content with equal timestamps is a conflict
/// 5. Hashing only happens for same-size, different-mtime pairs
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use dirsync::hashing::{Blake3Hasher, ContentHasher};
use dirsync::types::ContentHash;
use dirsync::{Action, ActionKind, Analysis, Config, SyncEngine};

/// Helper to create a file with specific content and modification time
fn create_file(root: &Path, rel: &str, content: &str, mtime: i64) {
	let path = root.join(rel);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(&path, content).unwrap();
	set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
}

/// Hasher that records every path it is asked about
#[derive(Default)]
struct CountingHasher {
	calls: AtomicUsize,
	paths: Mutex<Vec<PathBuf>>,
}

impl ContentHasher for CountingHasher {
	fn hash_file(&self, path: &Path) -> io::Result<ContentHash> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.paths.lock().unwrap().push(path.to_path_buf());
		Blake3Hasher.hash_file(path)
	}
}

async fn analyze(source: &Path, target: &Path) -> Analysis {
	SyncEngine::new(source, target, Config::default()).analyze().await.unwrap()
}

async fn analyze_counting(source: &Path, target: &Path) -> (Analysis, Arc<CountingHasher>) {
	let hasher = Arc::new(CountingHasher::default());
	let analysis = SyncEngine::new(source, target, Config::default())
		.with_hasher(hasher.clone())
		.analyze()
		.await
		.unwrap();
	(analysis, hasher)
}

fn kinds(analysis: &Analysis) -> Vec<(ActionKind, String)> {
	analysis.plan.actions.iter().map(|a| (a.kind(), a.path().to_string())).collect()
}

#[tokio::test]
async fn test_reference_example() {
	let s = TempDir::new().unwrap();
	let t = TempDir::new().unwrap();

	create_file(s.path(), "a.txt", "only in source", 1000);
	create_file(t.path(), "b.txt", "only in target", 1000);
	create_file(s.path(), "c.txt", "same bytes", 2000);
	create_file(t.path(), "c.txt", "same bytes", 1500);
	create_file(s.path(), "d.txt", "newer source", 3000);
	create_file(t.path(), "d.txt", "older target", 2500);

	let analysis = analyze(s.path(), t.path()).await;
	assert_eq!(
		kinds(&analysis),
		vec![
			(ActionKind::CopyToTarget, "a.txt".to_string()),
			(ActionKind::CopyToSource, "b.txt".to_string()),
			(ActionKind::NoAction, "c.txt".to_string()),
			(ActionKind::UpdateTarget, "d.txt".to_string()),
		]
	);
	assert!(analysis.plan.conflicts.is_empty());

	match &analysis.plan.actions[3] {
		Action::UpdateTarget { source, resolution, .. } => {
			assert_eq!(source.mtime, 3000);
			assert!(resolution.is_none());
		}
		other => panic!("unexpected action {:?}", other),
	}
}

#[tokio::test]
async fn test_identical_trees_only_no_action() {
	let s = TempDir::new().unwrap();
	let t = TempDir::new().unwrap();
	for (i, root) in [s.path(), t.path()].into_iter().enumerate() {
		create_file(root, "top.txt", "top", 100);
		create_file(root, "nested/deep/file.bin", "0123456789", 200);
		// Same bytes, different mtimes on the two sides
		create_file(root, "touched.txt", "unchanged", 300 + i as i64);
	}

	let analysis = analyze(s.path(), t.path()).await;
	assert_eq!(analysis.plan.actions.len(), 3);
	assert!(analysis.plan.actions.iter().all(|a| a.kind() == ActionKind::NoAction));
	assert!(analysis.plan.conflicts.is_empty());
	assert!(analysis.plan.is_in_sync());
}

#[tokio::test]
async fn test_newer_side_wins_symmetrically() {
	let s = TempDir::new().unwrap();
	let t = TempDir::new().unwrap();
	create_file(s.path(), "x.txt", "version one", 500);
	create_file(t.path(), "x.txt", "version two!", 900);

	let forward = analyze(s.path(), t.path()).await;
	let backward = analyze(t.path(), s.path()).await;

	assert_eq!(forward.plan.actions[0].kind(), ActionKind::UpdateSource);
	assert_eq!(backward.plan.actions[0].kind(), ActionKind::UpdateTarget);
}

#[tokio::test]
async fn test_equal_timestamps_with_different_content_conflict() {
	let s = TempDir::new().unwrap();
	let t = TempDir::new().unwrap();
	// Different sizes
	create_file(s.path(), "sizes.txt", "short", 700);
	create_file(t.path(), "sizes.txt", "much longer", 700);
	// Same size: still no silent update
	create_file(s.path(), "bytes.txt", "AAAA", 700);
	create_file(t.path(), "bytes.txt", "BBBB", 700);

	let analysis = analyze(s.path(), t.path()).await;
	let conflicts: Vec<&str> = analysis.plan.conflicts.iter().map(|c| c.path.as_str()).collect();
	assert_eq!(conflicts, vec!["sizes.txt"]);

	// Same size and same second: treated as identical without hashing
	assert_eq!(kinds(&analysis), vec![(ActionKind::NoAction, "bytes.txt".to_string())]);
}

#[tokio::test]
async fn test_same_second_edits_with_equal_length_conflict() {
	let s = TempDir::new().unwrap();
	let t = TempDir::new().unwrap();
	create_file(s.path(), "edit.txt", "AAAA", 1000);
	create_file(t.path(), "edit.txt", "BBBB", 1000);
	set_file_mtime(s.path().join("edit.txt"), FileTime::from_unix_time(1000, 100_000_000)).unwrap();
	set_file_mtime(t.path().join("edit.txt"), FileTime::from_unix_time(1000, 900_000_000)).unwrap();

	let (analysis, hasher) = analyze_counting(s.path(), t.path()).await;
	assert_eq!(hasher.calls.load(Ordering::SeqCst), 2);
	assert!(analysis.plan.actions.is_empty());
	let conflicts: Vec<&str> = analysis.plan.conflicts.iter().map(|c| c.path.as_str()).collect();
	assert_eq!(conflicts, vec!["edit.txt"]);
}

#[tokio::test]
async fn test_one_sided_paths_are_never_hashed() {
	let s = TempDir::new().unwrap();
	let t = TempDir::new().unwrap();
	create_file(s.path(), "new/a.txt", "a", 10);
	create_file(s.path(), "new/b.txt", "b", 10);
	create_file(t.path(), "other.txt", "o", 10);

	let (analysis, hasher) = analyze_counting(s.path(), t.path()).await;
	assert_eq!(analysis.plan.changes().count(), 3);
	assert_eq!(hasher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_only_ambiguous_pairs_are_hashed() {
	let s = TempDir::new().unwrap();
	let t = TempDir::new().unwrap();
	// Equal size, equal mtime: no hash
	create_file(s.path(), "same.txt", "abc", 100);
	create_file(t.path(), "same.txt", "abc", 100);
	// Different size: no hash
	create_file(s.path(), "grown.txt", "abcdef", 200);
	create_file(t.path(), "grown.txt", "abc", 100);
	// Equal size, different mtime: hashed
	create_file(s.path(), "touched.txt", "xyz", 300);
	create_file(t.path(), "touched.txt", "xyz", 250);

	let (analysis, hasher) = analyze_counting(s.path(), t.path()).await;
	assert_eq!(hasher.calls.load(Ordering::SeqCst), 2);
	let hashed = hasher.paths.lock().unwrap();
	assert!(hashed.iter().all(|p| p.ends_with("touched.txt")));

	assert_eq!(
		kinds(&analysis),
		vec![
			(ActionKind::UpdateTarget, "grown.txt".to_string()),
			(ActionKind::NoAction, "same.txt".to_string()),
			(ActionKind::NoAction, "touched.txt".to_string()),
		]
	);
}

#[tokio::test]
async fn test_classification_is_deterministic() {
	let s = TempDir::new().unwrap();
	let t = TempDir::new().unwrap();
	for i in 0..50 {
		create_file(s.path(), &format!("dir{}/f{}.txt", i % 5, i), "data", 100 + i);
		if i % 3 == 0 {
			create_file(t.path(), &format!("dir{}/f{}.txt", i % 5, i), "other", 50);
		}
	}

	let first = kinds(&analyze(s.path(), t.path()).await);
	let second = kinds(&analyze(s.path(), t.path()).await);
	assert_eq!(first, second);

	let mut sorted = first.clone();
	sorted.sort_by(|a, b| a.1.cmp(&b.1));
	assert_eq!(first, sorted);
}

#[tokio::test]
async fn test_missing_source_is_fatal() {
	let dir = TempDir::new().unwrap();
	let result = SyncEngine::new(dir.path().join("missing"), dir.path(), Config::default())
		.analyze()
		.await;
	assert!(matches!(result, Err(dirsync::SyncError::Scan(dirsync::ScanError::NotFound { .. }))));
}

#[tokio::test]
async fn test_missing_target_scans_as_empty() {
	let s = TempDir::new().unwrap();
	create_file(s.path(), "a.txt", "a", 1);
	let target = s.path().join("not-yet");

	let analysis = SyncEngine::new(s.path(), &target, Config::default()).analyze().await.unwrap();
	assert!(analysis.target.is_empty());
	assert_eq!(kinds(&analysis), vec![(ActionKind::CopyToTarget, "a.txt".to_string())]);
	assert!(!target.exists());
}
