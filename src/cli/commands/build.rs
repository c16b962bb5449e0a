use std::path::PathBuf;

use crate::{
	build_model,
	cli::{commands::EplCommand, step},
	compiler::{compile_c, run_binary, write_c},
	transpiler::transpile,
};

/// Compiles an EPL file to a native binary through C. Without `--output` the binary is run
/// immediately and its exit code propagated; with it, the binary is written and kept.
#[derive(clap::Parser)]
pub struct BuildCommand {
	/// The EPL source file to build.
	pub filename: String,

	/// Where to put the produced executable. When omitted, the executable lands in the
	/// temporary directory, is run immediately, and its exit code becomes ours.
	#[arg(short, long)]
	pub output: Option<PathBuf>,

	/// Print the generated C code with line numbers before compiling it.
	#[arg(long)]
	pub debug: bool,

	/// Also write the generated C code to the given file.
	#[arg(long, short = 'c')]
	pub emit_c: Option<PathBuf>,

	/// Suppress compiler progress output.
	#[arg(short, long)]
	pub quiet: bool,
}

impl EplCommand for BuildCommand {
	fn execute(self) -> anyhow::Result<i32> {
		step(self.quiet, "Reading", &self.filename);
		let source = std::fs::read_to_string(&self.filename)
			.map_err(|error| anyhow::anyhow!("error reading {}: {error}", self.filename))?;

		step(self.quiet, "Elaborating", "source code");
		let model = build_model(&source)?;

		step(self.quiet, "Transpiling", "to C");
		let c_code = transpile(&model)?;

		if self.debug {
			for (number, line) in c_code.lines().enumerate() {
				eprintln!("{:>4} {line}", number + 1);
			}
		}
		if let Some(emit_c) = &self.emit_c {
			std::fs::write(emit_c, &c_code)?;
		}

		step(self.quiet, "Compiling", "generated C code");
		let c_file = write_c(&c_code)?;
		let output = self
			.output
			.clone()
			.unwrap_or_else(|| std::env::temp_dir().join("epl_compiled"));
		compile_c(&c_file, &output)?;

		if self.output.is_some() {
			step(self.quiet, "Finished", &format!("build ready at {}", output.display()));
			return Ok(0);
		}

		step(self.quiet, "Running", "compiled binary");
		let code = run_binary(&output)?;
		Ok(code)
	}
}
