//! Core data types shared by the sync pipeline

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One of the two synchronized trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
	Source,
	Target,
}

impl Side {
	/// The opposite side
	pub fn other(self) -> Side {
		match self {
			Side::Source => Side::Target,
			Side::Target => Side::Source,
		}
	}
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Side::Source => write!(f, "source"),
			Side::Target => write!(f, "target"),
		}
	}
}

/// BLAKE3 digest of a file's bytes
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
	pub fn from_bytes(bytes: [u8; 32]) -> Self {
		ContentHash(blake3::Hash::from(bytes))
	}

	pub fn as_bytes(&self) -> &[u8; 32] {
		self.0.as_bytes()
	}
}

impl From<blake3::Hash> for ContentHash {
	fn from(h: blake3::Hash) -> Self {
		ContentHash(h)
	}
}

impl fmt::Display for ContentHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.to_hex())
	}
}

impl fmt::Debug for ContentHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let hex = self.0.to_hex();
		write!(f, "ContentHash({})", &hex.as_str()[..16])
	}
}

/// Metadata of one regular file present on one side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
	/// Path relative to the tree root, always `/`-separated
	pub relative_path: String,

	/// Size in bytes
	pub size: u64,

	/// Modification time, whole seconds since the Unix epoch
	pub mtime: i64,

	/// Sub-second part of the modification time
	pub mtime_nanos: u32,

	/// Content digest, only filled in when the classifier needed it
	pub content_hash: Option<ContentHash>,
}

impl FileRecord {
	pub fn new(relative_path: impl Into<String>, size: u64, mtime: i64) -> Self {
		FileRecord {
			relative_path: relative_path.into(),
			size,
			mtime,
			mtime_nanos: 0,
			content_hash: None,
		}
	}

	/// Set the sub-second part of the modification time
	pub fn with_nanos(mut self, nanos: u32) -> Self {
		self.mtime_nanos = nanos;
		self
	}

	/// Modification time as a `filetime::FileTime`, full precision
	pub fn file_time(&self) -> filetime::FileTime {
		filetime::FileTime::from_unix_time(self.mtime, self.mtime_nanos)
	}

	/// Absolute location of this file under `root`
	pub fn full_path(&self, root: &Path) -> PathBuf {
		join_relative(root, &self.relative_path)
	}
}

/// Join a `/`-separated relative path onto a root
pub fn join_relative(root: &Path, relative: &str) -> PathBuf {
	let mut path = root.to_path_buf();
	for part in relative.split('/').filter(|p| !p.is_empty()) {
		path.push(part);
	}
	path
}

/// A path that had to be left out of this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
	pub side: Side,
	pub path: String,
	pub reason: String,
}

impl fmt::Display for ScanWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}] {} skipped: {}", self.side, self.path, self.reason)
	}
}

/// Complete path → metadata map of one tree, sorted by relative path
#[derive(Debug, Clone)]
pub struct Inventory {
	side: Side,
	root: PathBuf,
	files: BTreeMap<String, FileRecord>,
	warnings: Vec<ScanWarning>,
}

impl Inventory {
	pub fn new(
		side: Side,
		root: PathBuf,
		files: BTreeMap<String, FileRecord>,
		warnings: Vec<ScanWarning>,
	) -> Self {
		Inventory { side, root, files, warnings }
	}

	/// Build an inventory from records, keyed by their relative path
	pub fn from_records(
		side: Side,
		root: impl Into<PathBuf>,
		records: impl IntoIterator<Item = FileRecord>,
	) -> Self {
		let files = records.into_iter().map(|r| (r.relative_path.clone(), r)).collect();
		Inventory { side, root: root.into(), files, warnings: Vec::new() }
	}

	pub fn side(&self) -> Side {
		self.side
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn get(&self, relative_path: &str) -> Option<&FileRecord> {
		self.files.get(relative_path)
	}

	pub fn contains(&self, relative_path: &str) -> bool {
		self.files.contains_key(relative_path)
	}

	/// Records in relative path order
	pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
		self.files.values()
	}

	pub fn paths(&self) -> impl Iterator<Item = &str> {
		self.files.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}

	pub fn total_bytes(&self) -> u64 {
		self.files.values().map(|f| f.size).sum()
	}

	pub fn warnings(&self) -> &[ScanWarning] {
		&self.warnings
	}
}


// vim: ts=4
