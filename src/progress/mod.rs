//! Progress display callback for CLI sync
//!
//! Renders scan counts per side, hashing progress and an `[i/N] path`
//! execution line on stderr, throttled to one redraw per 100 ms.

pub mod constants;

use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

use crate::callbacks::{ProgressCallback, ProgressEvent};
use crate::types::Side;

/// Progress display constants
pub use constants::*;

/// Per-side scan statistics
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SideStats {
	pub(crate) files: usize,
	pub(crate) bytes: u64,
	pub(crate) done: bool,
}

/// Shared state for progress tracking
#[derive(Debug)]
pub struct ProgressState {
	pub last_update: Mutex<Option<Instant>>,
	source: Mutex<SideStats>,
	target: Mutex<SideStats>,
}

impl ProgressState {
	pub fn new() -> Self {
		Self {
			last_update: Mutex::new(None),
			source: Mutex::new(SideStats::default()),
			target: Mutex::new(SideStats::default()),
		}
	}

	fn side(&self, side: Side) -> &Mutex<SideStats> {
		match side {
			Side::Source => &self.source,
			Side::Target => &self.target,
		}
	}

	/// True when a redraw is due; `force` always redraws
	fn should_draw(&self, force: bool) -> bool {
		let mut last = self.last_update.lock().unwrap_or_else(|e| e.into_inner());
		if !force {
			if let Some(t) = *last {
				if t.elapsed().as_millis() < UPDATE_THROTTLE_MS {
					return false;
				}
			}
		}
		*last = Some(Instant::now());
		true
	}
}

impl Default for ProgressState {
	fn default() -> Self {
		Self::new()
	}
}

/// CLI progress callback
pub struct CliProgressCallback {
	state: ProgressState,
}

impl CliProgressCallback {
	pub fn new() -> Self {
		Self { state: ProgressState::new() }
	}

	fn scan_line(&self) -> String {
		let fmt = |label: &str, s: SideStats| {
			format!(
				"{}: {}f/{:.1}MB{}",
				label,
				s.files,
				s.bytes as f64 / BYTES_PER_MB,
				if s.done { " ✓" } else { "" }
			)
		};
		let source = *self.state.source.lock().unwrap_or_else(|e| e.into_inner());
		let target = *self.state.target.lock().unwrap_or_else(|e| e.into_inner());
		format!("  Scanning: {} | {}", fmt("source", source), fmt("target", target))
	}
}

impl Default for CliProgressCallback {
	fn default() -> Self {
		Self::new()
	}
}

impl ProgressCallback for CliProgressCallback {
	fn on_event(&self, event: ProgressEvent) {
		let line = match event {
			ProgressEvent::Scanning { side, files, bytes } => {
				*self.state.side(side).lock().unwrap_or_else(|e| e.into_inner()) =
					SideStats { files, bytes, done: false };
				if !self.state.should_draw(false) {
					return;
				}
				self.scan_line()
			}
			ProgressEvent::Scanned { side, files, bytes, .. } => {
				*self.state.side(side).lock().unwrap_or_else(|e| e.into_inner()) =
					SideStats { files, bytes, done: true };
				self.state.should_draw(true);
				self.scan_line()
			}
			ProgressEvent::Hashing { done, total } => {
				if !self.state.should_draw(done == total) {
					return;
				}
				format!("  Comparing contents: {}/{}", done, total)
			}
			ProgressEvent::ActionStarted { index, total, kind, path } => {
				if !self.state.should_draw(index == 1 || index == total) {
					return;
				}
				format!("  {} [{}/{}] {} {}", progress_bar(index, total), index, total, kind.label(), shorten(&path))
			}
		};

		// Clear the rest of the previous line
		let mut err = std::io::stderr();
		let _ = write!(err, "\r{}\x1b[K", line);
		let _ = err.flush();
	}
}

fn progress_bar(done: usize, total: usize) -> String {
	let ratio = if total > 0 { done as f64 / total as f64 } else { 0.0 };
	let filled = (ratio.clamp(0.0, 1.0) * PROGRESS_BAR_WIDTH as f64) as usize;
	format!("[{}{}]", "=".repeat(filled), " ".repeat(PROGRESS_BAR_WIDTH - filled))
}

/// Keep the tail of long paths
fn shorten(path: &str) -> String {
	let count = path.chars().count();
	if count <= MAX_PATH_DISPLAY {
		return path.to_string();
	}
	let tail: String = path.chars().skip(count - (MAX_PATH_DISPLAY - 3)).collect();
	format!("...{}", tail)
}


// vim: ts=4
