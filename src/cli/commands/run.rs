use crate::{build_model, cli::commands::EplCommand, cli::step, interpreter};

/// Elaborates an EPL file and runs its `main` function directly on the interpreter. The
/// function's integer result becomes the process exit code.
#[derive(clap::Parser)]
pub struct RunCommand {
	/// The EPL source file to run.
	pub filename: String,

	/// Suppress compiler progress output.
	#[arg(short, long)]
	pub quiet: bool,
}

impl EplCommand for RunCommand {
	fn execute(self) -> anyhow::Result<i32> {
		step(self.quiet, "Reading", &self.filename);
		let source = std::fs::read_to_string(&self.filename)
			.map_err(|error| anyhow::anyhow!("error reading {}: {error}", self.filename))?;

		step(self.quiet, "Elaborating", "source code");
		let model = build_model(&source)?;

		step(self.quiet, "Running", "main");
		let mut stdout = std::io::stdout();
		let code = interpreter::interpret(&model, &mut stdout)?;
		Ok(code)
	}
}
