//! Conflict representation and resolution

use crate::types::FileRecord;

pub mod naming;
pub mod resolver;

pub use naming::{conflict_copy_name, CONFLICT_MARKER};
pub use resolver::ConflictResolver;

/// A path modified on both sides with no timestamp-based winner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
	/// Relative path shared by both versions
	pub path: String,

	/// Source version
	pub source: FileRecord,

	/// Target version
	pub target: FileRecord,
}

impl Conflict {
	/// Create a conflict from the two competing records of one path
	pub fn new(source: FileRecord, target: FileRecord) -> Self {
		Conflict { path: source.relative_path.clone(), source, target }
	}

	/// Whether both versions have the same size (content still differs)
	pub fn same_size(&self) -> bool {
		self.source.size == self.target.size
	}
}


// vim: ts=4
