use crate::{build_model, cli::commands::EplCommand, transpiler::transpile};

/// Transpiles an EPL file and prints the generated C code to standard out.
#[derive(clap::Parser)]
pub struct TranspileCommand {
	/// The EPL source file to transpile.
	pub filename: String,
}

impl EplCommand for TranspileCommand {
	fn execute(self) -> anyhow::Result<i32> {
		let source = std::fs::read_to_string(&self.filename)
			.map_err(|error| anyhow::anyhow!("error reading {}: {error}", self.filename))?;
		let model = build_model(&source)?;
		print!("{}", transpile(&model)?);
		Ok(0)
	}
}
