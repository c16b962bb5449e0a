//! The external toolchain driver: everything after C emission. This writes the generated
//! translation unit (and `builtins.h`) into the OS temporary directory, locates a C compiler on
//! the user's system, compiles, and runs the produced native binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::errors::{BinaryExecutionError, CompilerError};
use crate::BUILTINS_HEADER;

/// The C compilers we can use, in order of preference. These are iterated over and checked
/// against the user's `PATH`; if none is installed, building is impossible and an error is
/// returned.
static COMPILERS: &[&str] = &["gcc", "clang", "cc"];

/// Returns the command name of a C compiler installed on the user's system, or `None` if there is
/// no usable C compiler.
#[must_use]
pub fn get_c_compiler() -> Option<&'static str> {
	COMPILERS.iter().find(|compiler| which::which(compiler).is_ok()).copied()
}

/// Writes the generated C code, together with `builtins.h`, into the OS temporary directory.
/// Returns the path of the written C file; the header lands next to it, where the `#include`
/// finds it.
pub fn write_c(c_code: &str) -> anyhow::Result<PathBuf> {
	let directory = std::env::temp_dir();
	std::fs::write(directory.join("builtins.h"), BUILTINS_HEADER)
		.map_err(|error| anyhow::anyhow!("Error writing builtins.h: {error}"))?;
	let c_path = directory.join("epl_transpiled.c");
	std::fs::write(&c_path, c_code).map_err(|error| anyhow::anyhow!("Error writing transpiled C code: {error}"))?;
	Ok(c_path)
}

/// Compiles a C file into a native executable at the given output path.
pub fn compile_c(file_to_compile: &Path, output_path: &Path) -> anyhow::Result<()> {
	let compiler = get_c_compiler().ok_or_else(|| {
		anyhow::Error::new(CompilerError {
			message: "no C compiler found on this system".to_owned(),
		})
	})?;

	let output = std::process::Command::new(compiler)
		.arg("-w")
		.arg("-o")
		.arg(output_path)
		.arg(file_to_compile)
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.output()
		.map_err(|error| {
			anyhow::Error::new(CompilerError {
				message: format!("unable to spawn {compiler}: {error}"),
			})
		})?;

	if !output.status.success() {
		let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
		return Err(anyhow::Error::new(CompilerError {
			message: format!("{compiler} exited with {}\n{stderr}", output.status),
		}));
	}
	Ok(())
}

/// Runs a compiled native executable and returns its exit code. Termination by a signal is an
/// error: the compiled program did not run to completion.
pub fn run_binary(path: &Path) -> anyhow::Result<i32> {
	let status = std::process::Command::new(path).status().map_err(|error| {
		anyhow::Error::new(BinaryExecutionError {
			message: format!("unable to run {}: {error}", path.display()),
		})
	})?;

	match status.code() {
		Some(code) => Ok(code),
		None => Err(anyhow::Error::new(BinaryExecutionError {
			message: format!("binary terminated by signal: {status}"),
		})),
	}
}
