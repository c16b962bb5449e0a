use build::BuildCommand;
use run::RunCommand;
use transpile::TranspileCommand;

pub mod build;
pub mod run;
pub mod transpile;

/// A subcommand of the `epl` binary.
#[enum_dispatch::enum_dispatch]
pub trait EplCommand {
	/// Executes this subcommand and returns the process exit code.
	fn execute(self) -> anyhow::Result<i32>;
}

#[derive(clap::Subcommand)]
#[enum_dispatch::enum_dispatch(EplCommand)]
pub enum SubCommand {
	/// Elaborate a program and run it on the interpreter.
	Run(RunCommand),
	/// Transpile a program to C, compile it with the system C compiler, and either write the
	/// binary or run it.
	Build(BuildCommand),
	/// Transpile a program to C and print the generated code.
	Transpile(TranspileCommand),
}
