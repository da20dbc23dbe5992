//! Configuration for dirsync
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (--config, else ~/.config/dirsync/config.toml)
//! 3. Environment variables (DIRSYNC_* prefix)
//! 4. CLI flags (highest priority, applied by the binary)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::diff::DEFAULT_HASH_PARALLELISM;
use crate::error::ConfigError;
use crate::exclusion::PatternMatcher;
use crate::strategies::{ConflictDecision, LogFormat};
use crate::sync_log::{default_log_path, LOG_FILE_PREFIX};

/// Environment variable names
pub const ENV_DRY_RUN: &str = "DIRSYNC_DRY_RUN";
pub const ENV_AUTO_RESOLVE: &str = "DIRSYNC_AUTO_RESOLVE";
pub const ENV_LOG_FILE: &str = "DIRSYNC_LOG_FILE";
pub const ENV_LOG_DIR: &str = "DIRSYNC_LOG_DIR";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration of one sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// SYNC BEHAVIOR
	// ========================================================================
	/// Plan and log without touching either tree
	pub dry_run: bool,

	/// Decision applied to every conflict; `None` asks interactively
	pub auto_resolve: Option<ConflictDecision>,

	// ========================================================================
	// RUN LOG
	// ========================================================================
	/// Explicit path of the JSON run log
	pub log_file: Option<PathBuf>,

	/// Directory for the default `sync_log_<timestamp>.json`
	pub log_dir: PathBuf,

	// ========================================================================
	// EXCLUSION
	// ========================================================================
	/// Glob patterns to exclude from sync (e.g., "*.tmp", "node_modules")
	pub exclude_patterns: Vec<String>,

	/// Honor a `.syncignore` file at each tree root
	pub respect_ignore_file: bool,

	// ========================================================================
	// PERFORMANCE
	// ========================================================================
	/// Walker threads per tree
	pub scan_parallelism: usize,

	/// Files hashed concurrently
	pub hash_parallelism: usize,

	// ========================================================================
	// OUTPUT
	// ========================================================================
	/// Show progress during sync
	pub show_progress: bool,

	/// Skip the confirmation prompt
	pub assume_yes: bool,

	/// Log level (trace, debug, info, warn, error)
	pub log_level: String,

	/// Diagnostic log format
	pub log_format: LogFormat,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			dry_run: false,
			auto_resolve: None,

			log_file: None,
			log_dir: PathBuf::from("."),

			exclude_patterns: vec![],
			respect_ignore_file: true,

			scan_parallelism: 4,
			hash_parallelism: DEFAULT_HASH_PARALLELISM,

			show_progress: true,
			assume_yes: false,
			log_level: "info".to_string(),
			log_format: LogFormat::Pretty,
		}
	}
}

impl Config {
	/// Defaults, then the config file, then the process environment
	///
	/// An explicit `path` must exist; the default location is optional.
	pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
		let mut config = match path {
			Some(p) => Config::from_file(p)?,
			None => match default_config_path().filter(|p| p.is_file()) {
				Some(p) => Config::from_file(&p)?,
				None => Config::default(),
			},
		};
		config.apply_env()?;
		Ok(config)
	}

	/// Read a config file; `.json` and `.json5` as JSON5, anything else as TOML
	pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
		let content = fs::read_to_string(path)
			.map_err(|e| ConfigError::Read { path: path.to_path_buf(), source: e })?;
		Config::parse(&content, path)
	}

	/// Parse config text; the extension of `path` selects the format
	pub fn parse(content: &str, path: &Path) -> Result<Config, ConfigError> {
		let parse_err = |message: String| ConfigError::Parse { path: path.to_path_buf(), message };
		match path.extension().and_then(|e| e.to_str()) {
			Some("json") | Some("json5") => json5::from_str(content).map_err(|e| parse_err(e.to_string())),
			_ => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
		}
	}

	/// Apply `DIRSYNC_*` variables from the process environment
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_env_from(|key| std::env::var(key).ok())
	}

	/// Apply `DIRSYNC_*` variables from an arbitrary lookup
	pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(v) = lookup(ENV_DRY_RUN) {
			self.dry_run = parse_bool(ENV_DRY_RUN, &v)?;
		}
		if let Some(v) = lookup(ENV_AUTO_RESOLVE) {
			self.auto_resolve = if v.trim().is_empty() {
				None
			} else {
				Some(v.parse().map_err(|message| ConfigError::InvalidValue {
					key: ENV_AUTO_RESOLVE.to_string(),
					message,
				})?)
			};
		}
		if let Some(v) = lookup(ENV_LOG_FILE).filter(|v| !v.is_empty()) {
			self.log_file = Some(PathBuf::from(v));
		}
		if let Some(v) = lookup(ENV_LOG_DIR).filter(|v| !v.is_empty()) {
			self.log_dir = PathBuf::from(v);
		}
		Ok(())
	}

	/// Reject settings the engine cannot run with
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.scan_parallelism == 0 {
			return Err(invalid("scanParallelism", "must be at least 1"));
		}
		if self.hash_parallelism == 0 {
			return Err(invalid("hashParallelism", "must be at least 1"));
		}
		for pattern in &self.exclude_patterns {
			PatternMatcher::validate(pattern).map_err(|e| invalid("excludePatterns", &e.to_string()))?;
		}
		if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
			return Err(invalid(
				"logLevel",
				&format!("{} (expected one of {})", self.log_level, LOG_LEVELS.join(", ")),
			));
		}
		Ok(())
	}

	/// Where this run's JSON log goes
	pub fn log_path(&self, started_at: &DateTime<Utc>) -> PathBuf {
		match &self.log_file {
			Some(path) => path.clone(),
			None => default_log_path(&self.log_dir, started_at),
		}
	}

	/// Glob keeping this configuration's run logs out of the tree at `root`
	///
	/// `None` when logs are written outside `root`. An explicit log file is
	/// excluded by name; the default location by its `sync_log_*.json` pattern.
	pub fn log_exclusion(&self, root: &Path) -> Option<String> {
		let root = resolve_path(root)?;
		let (dir, file_pattern) = match &self.log_file {
			Some(file) => {
				let name = file.file_name()?.to_str()?;
				(file.parent().unwrap_or(Path::new("")), globset::escape(name))
			}
			None => (self.log_dir.as_path(), format!("{}*.json", globset::escape(LOG_FILE_PREFIX))),
		};
		let dir = resolve_path(dir)?;
		let relative = dir.strip_prefix(&root).ok()?;

		let mut parts = Vec::new();
		for component in relative.components() {
			parts.push(globset::escape(component.as_os_str().to_str()?));
		}
		parts.push(file_pattern);
		Some(parts.join("/"))
	}
}

/// Absolute form of `path` with symlinks resolved as far as it exists
fn resolve_path(path: &Path) -> Option<PathBuf> {
	let path = if path.as_os_str().is_empty() { Path::new(".") } else { path };
	let absolute = std::path::absolute(path).ok()?;

	let mut existing = absolute.as_path();
	let mut missing = Vec::new();
	loop {
		if let Ok(mut resolved) = existing.canonicalize() {
			resolved.extend(missing.iter().rev());
			return Some(resolved);
		}
		missing.push(existing.file_name()?);
		existing = existing.parent()?;
	}
}

/// `$XDG_CONFIG_HOME/dirsync/config.toml`, else `~/.config/dirsync/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
	let base = std::env::var_os("XDG_CONFIG_HOME")
		.filter(|v| !v.is_empty())
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
	Some(base.join("dirsync").join("config.toml"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(invalid(key, &format!("{} is not a boolean", value))),
	}
}

fn invalid(key: &str, message: &str) -> ConfigError {
	ConfigError::InvalidValue { key: key.to_string(), message: message.to_string() }
}


// vim: ts=4
