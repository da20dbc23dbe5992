//! Exclusion and filtering system
//!
//! Combines built-in exclusions, user glob patterns and the optional
//! `.syncignore` file of a tree root. Paths are always checked relative to the root.

mod ignore;
mod patterns;

pub use self::ignore::{IgnoreFileMatcher, IGNORE_FILE_NAME};
pub use self::patterns::PatternMatcher;

pub use crate::error::ExclusionError;

use std::path::Path;

/// Combined exclusion engine that applies all configured filters
pub struct ExclusionEngine {
	pattern_matcher: PatternMatcher,
	ignore_matcher: Option<IgnoreFileMatcher>,
}

impl ExclusionEngine {
	/// Create a new exclusion engine for the tree rooted at `base_path`
	pub fn new(
		patterns: &[String],
		base_path: &Path,
		respect_ignore_file: bool,
	) -> Result<Self, ExclusionError> {
		let pattern_matcher = PatternMatcher::new(patterns)?;
		let ignore_matcher =
			if respect_ignore_file { IgnoreFileMatcher::load(base_path)? } else { None };

		Ok(Self { pattern_matcher, ignore_matcher })
	}

	/// Check if a relative path should be excluded from sync
	pub fn should_exclude(&self, relative_path: &Path, is_dir: bool) -> bool {
		if self.pattern_matcher.is_excluded(relative_path) {
			return true;
		}

		if let Some(ref ignore_matcher) = self.ignore_matcher {
			if ignore_matcher.is_ignored(relative_path, is_dir) {
				return true;
			}
		}

		false
	}
}


// vim: ts=4
