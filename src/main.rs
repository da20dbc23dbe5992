use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use dirsync::callbacks::{AutoResolve, ConflictCallback, NoProgress, ProgressCallback};
use dirsync::config::Config;
use dirsync::display::{render_analysis, render_report};
use dirsync::error::{ConfigError, SyncError};
use dirsync::logging::*;
use dirsync::progress::CliProgressCallback;
use dirsync::prompt::TerminalPrompt;
use dirsync::strategies::ConflictDecision;
use dirsync::plan::Action;
use dirsync::sync::{Analysis, SyncEngine};
use dirsync::utils::install_cancel_handler;

/// Exit code for fatal errors before or during the scan
const EXIT_FATAL: u8 = 2;

fn cli() -> Command {
	Command::new("dirsync")
		.version(env!("CARGO_PKG_VERSION"))
		.author("Szilard Hajba <szilu@symbion.hu>")
		.about("2-way directory sync utility")
		.arg(Arg::new("source").required(true).value_name("SOURCE").help("Source directory"))
		.arg(Arg::new("target").required(true).value_name("TARGET").help("Target directory"))
		.arg(
			Arg::new("dry-run")
				.short('n')
				.long("dry-run")
				.action(ArgAction::SetTrue)
				.help("Show what would be done without changing anything"),
		)
		.arg(
			Arg::new("log-file")
				.long("log-file")
				.value_name("PATH")
				.help("Where to write the JSON run log"),
		)
		.arg(
			Arg::new("auto-resolve")
				.long("auto-resolve")
				.value_name("POLICY")
				.value_parser(["source", "target", "keep-both", "skip"])
				.help("Resolve every conflict without asking"),
		)
		.arg(
			Arg::new("exclude")
				.short('e')
				.long("exclude")
				.value_name("GLOB")
				.action(ArgAction::Append)
				.help("Exclude paths matching GLOB (repeatable)"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("PATH")
				.help("Config file (TOML, or JSON5 with .json/.json5 extension)"),
		)
		.arg(
			Arg::new("yes")
				.short('y')
				.long("yes")
				.action(ArgAction::SetTrue)
				.help("Do not ask for confirmation"),
		)
		.arg(
			Arg::new("no-progress")
				.long("no-progress")
				.action(ArgAction::SetTrue)
				.help("Disable the progress display"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.conflicts_with("quiet")
				.help("Debug logging"),
		)
		.arg(
			Arg::new("quiet")
				.short('q')
				.long("quiet")
				.action(ArgAction::SetTrue)
				.help("Only log warnings and errors"),
		)
}

/// Config file and environment, then command-line flags on top
fn build_config(matches: &ArgMatches) -> Result<Config, ConfigError> {
	let mut config = Config::load(matches.get_one::<String>("config").map(Path::new))?;

	if matches.get_flag("dry-run") {
		config.dry_run = true;
	}
	if let Some(path) = matches.get_one::<String>("log-file") {
		config.log_file = Some(PathBuf::from(path));
	}
	if let Some(policy) = matches.get_one::<String>("auto-resolve") {
		let decision = policy.parse::<ConflictDecision>().map_err(|message| {
			ConfigError::InvalidValue { key: "--auto-resolve".to_string(), message }
		})?;
		config.auto_resolve = Some(decision);
	}
	if let Some(patterns) = matches.get_many::<String>("exclude") {
		config.exclude_patterns.extend(patterns.cloned());
	}
	if matches.get_flag("yes") {
		config.assume_yes = true;
	}
	if matches.get_flag("no-progress") {
		config.show_progress = false;
	}
	if matches.get_flag("verbose") {
		config.log_level = "debug".to_string();
	} else if matches.get_flag("quiet") {
		config.log_level = "warn".to_string();
	}

	config.validate()?;
	Ok(config)
}

/// Conflict resolution may read stdin; keep it off the async worker
fn resolve_blocking(
	engine: &SyncEngine,
	analysis: &Analysis,
	callback: &mut dyn ConflictCallback,
) -> Vec<Action> {
	tokio::task::block_in_place(|| engine.resolve_conflicts(analysis, callback))
}

async fn run(matches: &ArgMatches) -> Result<u8, SyncError> {
	let config = build_config(matches)?;
	init_tracing(&config.log_level, config.log_format);

	let source = matches.get_one::<String>("source").map(PathBuf::from).unwrap_or_default();
	let target = matches.get_one::<String>("target").map(PathBuf::from).unwrap_or_default();
	let dry_run = config.dry_run;
	let show_progress = config.show_progress && std::io::stderr().is_terminal();

	let cancel = Arc::new(AtomicBool::new(false));
	install_cancel_handler(cancel.clone());

	let progress: Arc<dyn ProgressCallback> =
		if show_progress { Arc::new(CliProgressCallback::new()) } else { Arc::new(NoProgress) };

	let engine = SyncEngine::new(&source, &target, config.clone())
		.with_progress(progress)
		.with_cancel_flag(cancel);

	if dry_run {
		eprintln!("Dry run: no files will be changed");
	}
	let analysis = engine.analyze().await?;
	if show_progress {
		eprintln!();
	}
	println!("{}", render_analysis(&analysis));

	let mut prompt = TerminalPrompt::stdio();
	let mut auto;
	let callback: &mut dyn ConflictCallback = match config.auto_resolve {
		Some(decision) => {
			auto = AutoResolve(decision);
			&mut auto
		}
		None => &mut prompt,
	};
	let actions = resolve_blocking(&engine, &analysis, callback);

	let changes = actions.iter().filter(|a| a.is_change()).count();
	if !dry_run && changes > 0 && !config.assume_yes {
		let question = format!("Proceed with synchronization of {} files?", changes);
		if !tokio::task::block_in_place(|| prompt.confirm(&question)) {
			println!("Aborted by user. No changes made.");
			return Ok(0);
		}
	}

	let report = engine.execute(&analysis, &actions).await?;
	if show_progress && changes > 0 && !dry_run {
		eprintln!();
	}
	println!("{}", render_report(&report, dry_run));

	Ok(report.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
	let matches = cli().get_matches();

	match run(&matches).await {
		Ok(code) => ExitCode::from(code),
		Err(e) => {
			error!("{}", e);
			eprintln!("Error: {}", e);
			ExitCode::from(EXIT_FATAL)
		}
	}
}


// vim: ts=4
