//! Pattern-based file exclusion using glob patterns

use super::ExclusionError;
use crate::conflict::naming::CONFLICT_MARKER;
use crate::executor::TEMP_SUFFIX;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Pattern matcher using globset for efficient matching
pub struct PatternMatcher {
	/// Compiled user exclusion patterns
	exclude_set: GlobSet,

	/// Always-excluded patterns (built-in)
	always_exclude: GlobSet,
}

impl PatternMatcher {
	/// Create a new pattern matcher from user exclusion patterns
	pub fn new(exclude_patterns: &[String]) -> Result<Self, ExclusionError> {
		let always_exclude = Self::build_always_excluded()?;
		let exclude_set = Self::build_glob_set(exclude_patterns)?;

		Ok(Self { exclude_set, always_exclude })
	}

	/// Build the always-excluded patterns
	fn build_always_excluded() -> Result<GlobSet, ExclusionError> {
		let patterns = vec![
			format!("**/*{}", TEMP_SUFFIX),          // in-flight copies
			format!("**/*{}*", CONFLICT_MARKER),     // keep-both conflict copies
			"**/.DS_Store".to_string(),              // macOS cruft
			"**/Thumbs.db".to_string(),              // Windows cruft
			"**/desktop.ini".to_string(),            // Windows cruft
		];

		Self::build_glob_set(&patterns)
	}

	/// Build a GlobSet from patterns
	fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ExclusionError> {
		let mut builder = GlobSetBuilder::new();

		for pattern in patterns {
			let glob = Glob::new(pattern)
				.map_err(|e| ExclusionError::InvalidPattern(format!("{}: {}", pattern, e)))?;
			builder.add(glob);
		}

		builder.build().map_err(|e| {
			ExclusionError::InvalidPattern(format!("Failed to build pattern set: {}", e))
		})
	}

	/// Check a single pattern without building a matcher
	pub fn validate(pattern: &str) -> Result<(), ExclusionError> {
		Glob::new(pattern)
			.map(|_| ())
			.map_err(|e| ExclusionError::InvalidPattern(format!("{}: {}", pattern, e)))
	}

	/// Check if a relative path is excluded by any pattern
	pub fn is_excluded(&self, path: &Path) -> bool {
		self.always_exclude.is_match(path) || self.exclude_set.is_match(path)
	}
}


// vim: ts=4
