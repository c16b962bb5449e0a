//! # EPL
//!
//! An ahead-of-time compiler for EPL, a small statically typed expression language. Source text
//! is tokenized, parsed into a syntax tree, elaborated into a typed model with a strict
//! compile-time/runtime partitioning, and then either executed directly on a tree-walking
//! interpreter or transpiled to portable C and handed to whatever C compiler the system has.
//!
//! The distinguishing feature is partial evaluation: every sub-expression whose value does not
//! depend on runtime state is executed at build time and replaced by its value, so the emitted C
//! only contains the residual runtime program.

/// The built-in context: primitive types and native functions seeded into the root scope.
pub mod builtins;

/// The external C toolchain driver: locating a C compiler, compiling the generated translation
/// unit, and running the produced binary.
pub mod compiler;

/// The error types of every compilation stage.
pub mod errors;

/// The tree-walking interpreter, shared by the `run` driver and the build-time partial evaluator.
pub mod interpreter;

/// The lexer, which tokenizes source code into a stream of tokens.
pub mod lexer;

/// The elaborated semantic model and the elaborator that builds it.
pub mod model;

/// The parser, which parses a stream of tokens into an abstract syntax tree.
pub mod parser;

/// The C back-end.
pub mod transpiler;

/// The command-line interface: subcommands and progress reporting.
pub mod cli;

use errors::Error;

/// The C support header every generated translation unit includes. The build driver writes it
/// next to the generated C file.
pub const BUILTINS_HEADER: &str = include_str!("../builtins.h");

/// Convenience pipeline: source text to elaborated model.
pub fn build_model(source: &str) -> Result<model::Model, Error> {
	let mut tokens = lexer::tokenize(source)?;
	let program = parser::parse(&mut tokens)?;
	model::elaborate(&program)
}
