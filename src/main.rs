// Bring the `Parser` trait into scope from `clap`, which allows parsing argument structs from the
// command line. We assign it to underscore to indicate clearly that it's not used outside of
// bringing its trait methods into scope.
use clap::Parser as _;

use epl::cli::{
	commands::{EplCommand as _, SubCommand},
	report_error,
};

/// The command-line arguments of the EPL compiler.
#[derive(clap::Parser)]
#[command(name = "epl", about = "The EPL compiler and interpreter")]
pub struct EplArguments {
	/// The command to run, such as `run` or `build`.
	#[command(subcommand)]
	pub command: SubCommand,
}

/// The main entry point: parse the arguments, run the chosen subcommand, and exit with whatever
/// code it produced (a program's own exit code for `run`/`build`, 1 on any compiler error).
fn main() {
	let code = match EplArguments::parse().command.execute() {
		Ok(code) => code,
		Err(error) => report_error(&error),
	};
	std::process::exit(code);
}
