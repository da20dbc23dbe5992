//! `.syncignore` file parsing and matching
//!
//! Uses the `ignore` crate (same as ripgrep) for gitignore-style pattern handling.

use super::ExclusionError;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Name of the per-root ignore file
pub const IGNORE_FILE_NAME: &str = ".syncignore";

/// Applies the `.syncignore` file found at a tree root
pub struct IgnoreFileMatcher {
	gitignore: Gitignore,
}

impl IgnoreFileMatcher {
	/// Load `.syncignore` from `base_path`, or `None` when there is no such file
	pub fn load(base_path: &Path) -> Result<Option<Self>, ExclusionError> {
		let ignore_file = base_path.join(IGNORE_FILE_NAME);
		if !ignore_file.is_file() {
			return Ok(None);
		}

		let mut builder = GitignoreBuilder::new(base_path);
		// add() returns Option<Error>, None on success
		if let Some(err) = builder.add(&ignore_file) {
			return Err(ExclusionError::IgnoreFile(format!(
				"Failed to add {}: {}",
				ignore_file.display(),
				err
			)));
		}

		let gitignore = builder.build().map_err(|e| ExclusionError::IgnoreFile(e.to_string()))?;
		Ok(Some(Self { gitignore }))
	}

	/// Check if a relative path (or any of its parent directories) is ignored
	pub fn is_ignored(&self, relative_path: &Path, is_dir: bool) -> bool {
		self.gitignore.matched_path_or_any_parents(relative_path, is_dir).is_ignore()
	}
}


// vim: ts=4
