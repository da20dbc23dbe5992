//! Interactive terminal prompts
//!
//! Generic over the reader and writer so the dialogue can be driven from tests.

use std::io::{BufRead, Write};

use crate::callbacks::ConflictCallback;
use crate::conflict::Conflict;
use crate::display::{format_mtime, format_size};
use crate::strategies::ConflictDecision;

/// Prompt text for a conflict decision
pub const CONFLICT_PROMPT: &str = "Choose action (s)ource wins, (t)arget wins, (k)eep both, skip: ";

/// Asks the user on a terminal
pub struct TerminalPrompt<R, W> {
	input: R,
	output: W,
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
	/// Prompt on the process stdin/stdout
	pub fn stdio() -> Self {
		TerminalPrompt::new(std::io::stdin().lock(), std::io::stdout())
	}
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
	pub fn new(input: R, output: W) -> Self {
		TerminalPrompt { input, output }
	}

	/// Read one line; `None` on EOF or read error
	fn read_line(&mut self) -> Option<String> {
		let mut line = String::new();
		match self.input.read_line(&mut line) {
			Ok(0) | Err(_) => None,
			Ok(_) => Some(line.trim().to_string()),
		}
	}

	/// Ask a yes/no question; anything but y/yes is no
	pub fn confirm(&mut self, question: &str) -> bool {
		let _ = write!(self.output, "{} (y/N) ", question);
		let _ = self.output.flush();
		matches!(self.read_line().map(|l| l.to_lowercase()).as_deref(), Some("y") | Some("yes"))
	}

	/// Consume the prompt, returning the writer
	pub fn into_output(self) -> W {
		self.output
	}
}

impl<R: BufRead, W: Write> ConflictCallback for TerminalPrompt<R, W> {
	fn decide(&mut self, conflict: &Conflict) -> ConflictDecision {
		let _ = writeln!(self.output);
		let _ = writeln!(self.output, "⚠️  Conflict: {}", conflict.path);
		let _ = writeln!(
			self.output,
			"   source: {:>10}  modified {}",
			format_size(conflict.source.size),
			format_mtime(conflict.source.mtime)
		);
		let _ = writeln!(
			self.output,
			"   target: {:>10}  modified {}",
			format_size(conflict.target.size),
			format_mtime(conflict.target.mtime)
		);

		loop {
			let _ = write!(self.output, "   {}", CONFLICT_PROMPT);
			let _ = self.output.flush();

			let Some(answer) = self.read_line() else {
				let _ = writeln!(self.output, "\n   EOF reached. Skipping conflict.");
				return ConflictDecision::Skip;
			};

			match answer.parse::<ConflictDecision>() {
				Ok(decision) => return decision,
				Err(_) => {
					let _ = writeln!(self.output, "   Invalid input: '{}'. Try again.", answer);
				}
			}
		}
	}
}


// vim: ts=4
