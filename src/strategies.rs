//! Consolidated strategy and mode enums
//!
//! Each enum includes a FromStr implementation for CLI and config parsing and a
//! Display implementation producing the canonical spelling.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// CONFLICT DECISION
// ============================================================================

/// How one conflicting path is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictDecision {
	/// Source version overwrites the target
	#[serde(alias = "source")]
	SourceWins,

	/// Target version overwrites the source
	#[serde(alias = "target")]
	TargetWins,

	/// Target version is renamed aside, source version copied in its place
	KeepBoth,

	/// Leave both sides untouched
	Skip,
}

impl FromStr for ConflictDecision {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"s" | "source" | "source-wins" | "sourcewins" => Ok(Self::SourceWins),
			"t" | "target" | "target-wins" | "targetwins" => Ok(Self::TargetWins),
			"k" | "keep-both" | "keepboth" | "both" => Ok(Self::KeepBoth),
			"skip" => Ok(Self::Skip),
			_ => Err(format!(
				"Unknown conflict decision: {}. Valid options: source, target, keep-both, skip",
				s
			)),
		}
	}
}

impl std::fmt::Display for ConflictDecision {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::SourceWins => write!(f, "source-wins"),
			Self::TargetWins => write!(f, "target-wins"),
			Self::KeepBoth => write!(f, "keep-both"),
			Self::Skip => write!(f, "skip"),
		}
	}
}

impl ConflictDecision {
	/// Whether this decision changes any file
	pub fn settles_conflict(self) -> bool {
		!matches!(self, ConflictDecision::Skip)
	}
}

// ============================================================================
// LOG FORMAT
// ============================================================================

/// Format of diagnostic output on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
	Json,
	#[default]
	Pretty,
	Compact,
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"json" => Ok(Self::Json),
			"pretty" => Ok(Self::Pretty),
			"compact" => Ok(Self::Compact),
			_ => Err(format!("Unknown log format: {}. Valid options: json, pretty, compact", s)),
		}
	}
}

impl std::fmt::Display for LogFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Json => write!(f, "json"),
			Self::Pretty => write!(f, "pretty"),
			Self::Compact => write!(f, "compact"),
		}
	}
}


// vim: ts=4
