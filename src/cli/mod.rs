use colored::Colorize as _;

/// The subcommands of the `epl` binary.
pub mod commands;

/// Prints one progress line for a compilation stage, unless quiet mode is on. Progress goes to
/// standard error so the compiled program's own output stays clean on standard out.
pub fn step(quiet: bool, action: &str, object: &str) {
	if !quiet {
		eprintln!("{} {object}...", format!("{action:>12}").bold().green());
	}
}

/// Reports an error and the exit code the process should use for it.
pub fn report_error(error: &anyhow::Error) -> i32 {
	eprintln!("{} {error:#}", "Error:".bold().red());
	1
}
