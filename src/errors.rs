use std::fmt;

use crate::lexer::Span;

/// Any error the compiler can produce, across all of its stages. The two families matter to the
/// drivers: compile-time errors always exit with code 1, while execution-time errors carry
/// whatever status the failing program (or external tool) produced.
#[derive(Debug)]
pub enum Error {
	/// A lexical or syntactic error from the tokenizer or parser.
	Parser(ParserError),
	/// A semantic error from elaboration: bad types, bad names, bad kinds.
	Model(ModelError),
	/// An interpreter failure that happened while folding a compile-time expression.
	Inliner(InlinerError),
	/// A runtime failure in the tree-walking interpreter.
	Interpreter(InterpreterError),
	/// The external C compiler rejected the generated translation unit.
	Compiler(CompilerError),
	/// The compiled binary terminated abnormally.
	BinaryExecution(BinaryExecutionError),
}

impl Error {
	/// Whether this error was produced before the program ever ran: lexing, parsing, elaboration,
	/// or compile-time folding.
	#[must_use]
	pub fn is_compile_time(&self) -> bool {
		matches!(self, Self::Parser(_) | Self::Model(_) | Self::Inliner(_))
	}
}

impl fmt::Display for Error {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Parser(error) => fmt::Display::fmt(error, formatter),
			Self::Model(error) => fmt::Display::fmt(error, formatter),
			Self::Inliner(error) => fmt::Display::fmt(error, formatter),
			Self::Interpreter(error) => fmt::Display::fmt(error, formatter),
			Self::Compiler(error) => fmt::Display::fmt(error, formatter),
			Self::BinaryExecution(error) => fmt::Display::fmt(error, formatter),
		}
	}
}

impl std::error::Error for Error {}

/// A lexical or syntactic error, pointing at the source position the tokenizer or parser had
/// reached when it gave up.
#[derive(Debug, Clone)]
pub struct ParserError {
	pub message: String,
	pub span: Span,
}

impl ParserError {
	pub fn new(message: impl Into<String>, span: Span) -> Self {
		Self {
			message: message.into(),
			span,
		}
	}
}

impl fmt::Display for ParserError {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "syntax error: {}\nfrom: {}", self.message, self.span)
	}
}

impl std::error::Error for ParserError {}

/// The kind of a semantic error. These are the checks elaboration performs while turning the
/// syntax tree into the typed model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelErrorKind {
	TypeMismatch { expected: String, got: String },
	AlreadyDefined { name: String },
	Undefined { name: String },
	KindMismatch { message: String },
	NotCompileTime,
	NotCallable,
	ArgumentCountMismatch { expected: usize, got: usize },
	NoSuchAttribute { name: String },
	NotInitialized { name: String },
	NoValue,
	FatalError { message: String },
}

impl fmt::Display for ModelErrorKind {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::TypeMismatch { expected, got } => write!(formatter, "type mismatch {expected} vs {got}"),
			Self::AlreadyDefined { name } => write!(formatter, "already defined name: {name}"),
			Self::Undefined { name } => write!(formatter, "undefined name: {name}"),
			Self::KindMismatch { message } => write!(formatter, "{message}"),
			Self::NotCompileTime => write!(formatter, "value is not known at compile time"),
			Self::NotCallable => write!(formatter, "not callable"),
			Self::ArgumentCountMismatch { expected, got } => {
				write!(formatter, "argument count mismatch: expected {expected}, got {got}")
			},
			Self::NoSuchAttribute { name } => write!(formatter, "no such attribute: {name}"),
			Self::NotInitialized { name } => write!(formatter, "variable not initialized: {name}"),
			Self::NoValue => write!(formatter, "expression has no value"),
			Self::FatalError { message } => write!(formatter, "{message}"),
		}
	}
}

/// A semantic error carrying the syntax node it was raised on. The node is kept as its
/// pretty-printed source form so the error can be reported long after the syntax tree is gone.
#[derive(Debug, Clone)]
pub struct ModelError {
	pub kind: ModelErrorKind,
	pub node: String,
	pub span: Span,
}

impl ModelError {
	pub fn new(kind: ModelErrorKind, node: impl fmt::Display, span: Span) -> Self {
		Self {
			kind,
			node: node.to_string(),
			span,
		}
	}
}

impl fmt::Display for ModelError {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "{}\nwhile parsing: {}\nfrom: {}", self.kind, self.node, self.span)
	}
}

impl std::error::Error for ModelError {}

/// A runtime fault. The interpreter raises these while running a program; the partial evaluator
/// converts them into an `InlinerError` when they happen at build time instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterError {
	/// The built-in `abort` was called.
	Abort,
	DivisionByZero,
	/// A name was read after being registered in its runtime context but before being bound.
	NotInitialized { name: String },
	/// The program has no `main` function to run.
	MissingMain,
	/// An I/O failure in a printing built-in.
	Output { message: String },
	/// An internal inconsistency between the model and the interpreter.
	Fatal { message: String },
}

impl fmt::Display for InterpreterError {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Abort => write!(formatter, "abort"),
			Self::DivisionByZero => write!(formatter, "division by zero"),
			Self::NotInitialized { name } => write!(formatter, "variable not initialized: {name}"),
			Self::MissingMain => write!(formatter, "no main function"),
			Self::Output { message } => write!(formatter, "output error: {message}"),
			Self::Fatal { message } => write!(formatter, "{message}"),
		}
	}
}

impl std::error::Error for InterpreterError {}

/// An interpreter failure that surfaced while folding an expression at build time. Unlike a plain
/// `InterpreterError` this is a compile-time error: the offending code would have faulted in
/// every execution, and it was caught before the program ever ran.
#[derive(Debug, Clone)]
pub struct InlinerError {
	pub cause: InterpreterError,
	pub span: Span,
}

impl fmt::Display for InlinerError {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "error while folding at compile time: {}\nfrom: {}", self.cause, self.span)
	}
}

impl std::error::Error for InlinerError {}

/// The external C compiler failed on the generated translation unit. This always indicates a bug
/// in the transpiler or a broken toolchain, never an error in the user's program.
#[derive(Debug, Clone)]
pub struct CompilerError {
	pub message: String,
}

impl fmt::Display for CompilerError {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "external C compiler failed: {}", self.message)
	}
}

impl std::error::Error for CompilerError {}

/// The compiled binary terminated abnormally, most likely killed by a signal.
#[derive(Debug, Clone)]
pub struct BinaryExecutionError {
	pub message: String,
}

impl fmt::Display for BinaryExecutionError {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "binary execution failed: {}", self.message)
	}
}

impl std::error::Error for BinaryExecutionError {}

impl From<ParserError> for Error {
	fn from(error: ParserError) -> Self {
		Self::Parser(error)
	}
}

impl From<ModelError> for Error {
	fn from(error: ModelError) -> Self {
		Self::Model(error)
	}
}

impl From<InlinerError> for Error {
	fn from(error: InlinerError) -> Self {
		Self::Inliner(error)
	}
}

impl From<InterpreterError> for Error {
	fn from(error: InterpreterError) -> Self {
		Self::Interpreter(error)
	}
}

impl From<CompilerError> for Error {
	fn from(error: CompilerError) -> Self {
		Self::Compiler(error)
	}
}

impl From<BinaryExecutionError> for Error {
	fn from(error: BinaryExecutionError) -> Self {
		Self::BinaryExecution(error)
	}
}
