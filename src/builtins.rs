//! The built-in context: the primitive types and native functions seeded into the root scope of
//! every program. Each built-in function carries a `compile_time` flag; a call to a
//! non-compile-time built-in (printing, `abort`) is pinned to runtime and never folded.

use std::io;

use crate::{
	errors::InterpreterError,
	model::{
		scope::{ScopeArena, Term},
		types::Type,
		Value,
	},
};

/// The signature and native implementation of one built-in function.
pub struct BuiltinFunction {
	pub parameters: &'static [Type],
	pub return_type: Type,
	/// Whether calls may be executed at build time when their arguments are known.
	pub compile_time: bool,
	pub implementation: fn(&mut dyn io::Write, &[Value]) -> Result<Value, InterpreterError>,
}

// Parameter lists live in named statics: `Type` carries a `Box` variant, so inline slice
// literals would not promote to `'static` inside the registry below.
static NO_PARAMETERS: [Type; 0] = [];
static INT: [Type; 1] = [Type::Int];
static INT_INT: [Type; 2] = [Type::Int, Type::Int];
static BOOL: [Type; 1] = [Type::Bool];
static BOOL_BOOL: [Type; 2] = [Type::Bool, Type::Bool];

fn integer(arguments: &[Value], index: usize) -> Result<i64, InterpreterError> {
	match arguments.get(index) {
		Some(Value::Integer(value)) => Ok(*value),
		other => Err(InterpreterError::Fatal {
			message: format!("built-in expected an integer argument, got {other:?}"),
		}),
	}
}

fn boolean(arguments: &[Value], index: usize) -> Result<bool, InterpreterError> {
	match arguments.get(index) {
		Some(Value::Bool(value)) => Ok(*value),
		other => Err(InterpreterError::Fatal {
			message: format!("built-in expected a boolean argument, got {other:?}"),
		}),
	}
}

fn write_line(output: &mut dyn io::Write, text: &str) -> Result<Value, InterpreterError> {
	writeln!(output, "{text}").map_err(|error| InterpreterError::Output {
		message: error.to_string(),
	})?;
	Ok(Value::Unit)
}

static BUILTIN_FUNCTIONS: phf::Map<&'static str, BuiltinFunction> = phf::phf_map! {
	"abort" => BuiltinFunction {
		parameters: &NO_PARAMETERS,
		return_type: Type::Void,
		compile_time: false,
		implementation: |_, _| Err(InterpreterError::Abort),
	},

	// Integer arithmetic
	"add" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Int,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Integer(integer(arguments, 0)?.wrapping_add(integer(arguments, 1)?))),
	},
	"sub" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Int,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Integer(integer(arguments, 0)?.wrapping_sub(integer(arguments, 1)?))),
	},
	"mul" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Int,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Integer(integer(arguments, 0)?.wrapping_mul(integer(arguments, 1)?))),
	},
	"div" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Int,
		compile_time: true,
		implementation: |_, arguments| {
			let divisor = integer(arguments, 1)?;
			if divisor == 0 {
				return Err(InterpreterError::DivisionByZero);
			}
			Ok(Value::Integer(integer(arguments, 0)?.wrapping_div(divisor)))
		},
	},
	"mod" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Int,
		compile_time: true,
		implementation: |_, arguments| {
			let divisor = integer(arguments, 1)?;
			if divisor == 0 {
				return Err(InterpreterError::DivisionByZero);
			}
			Ok(Value::Integer(integer(arguments, 0)?.wrapping_rem(divisor)))
		},
	},

	// Integer comparison
	"ieq" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(integer(arguments, 0)? == integer(arguments, 1)?)),
	},
	"ineq" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(integer(arguments, 0)? != integer(arguments, 1)?)),
	},
	"gt" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(integer(arguments, 0)? > integer(arguments, 1)?)),
	},
	"geq" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(integer(arguments, 0)? >= integer(arguments, 1)?)),
	},
	"lt" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(integer(arguments, 0)? < integer(arguments, 1)?)),
	},
	"leq" => BuiltinFunction {
		parameters: &INT_INT,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(integer(arguments, 0)? <= integer(arguments, 1)?)),
	},

	// Boolean operators
	"and" => BuiltinFunction {
		parameters: &BOOL_BOOL,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(boolean(arguments, 0)? && boolean(arguments, 1)?)),
	},
	"or" => BuiltinFunction {
		parameters: &BOOL_BOOL,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(boolean(arguments, 0)? || boolean(arguments, 1)?)),
	},
	"xor" => BuiltinFunction {
		parameters: &BOOL_BOOL,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(boolean(arguments, 0)? != boolean(arguments, 1)?)),
	},
	"not" => BuiltinFunction {
		parameters: &BOOL,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(!boolean(arguments, 0)?)),
	},
	"beq" => BuiltinFunction {
		parameters: &BOOL_BOOL,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(boolean(arguments, 0)? == boolean(arguments, 1)?)),
	},
	"bneq" => BuiltinFunction {
		parameters: &BOOL_BOOL,
		return_type: Type::Bool,
		compile_time: true,
		implementation: |_, arguments| Ok(Value::Bool(boolean(arguments, 0)? != boolean(arguments, 1)?)),
	},

	// Output
	"iprint" => BuiltinFunction {
		parameters: &INT,
		return_type: Type::Unit,
		compile_time: false,
		implementation: |output, arguments| write_line(output, &integer(arguments, 0)?.to_string()),
	},
	"bprint" => BuiltinFunction {
		parameters: &BOOL,
		return_type: Type::Unit,
		compile_time: false,
		implementation: |output, arguments| write_line(output, if boolean(arguments, 0)? { "true" } else { "false" }),
	},
};

/// Looks up a built-in function by its registry name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static BuiltinFunction> {
	BUILTIN_FUNCTIONS.get(name)
}

/// The names of all built-in functions, for diagnostics and C header checks.
pub fn names() -> impl Iterator<Item = &'static str> {
	BUILTIN_FUNCTIONS.keys().copied()
}

/// Installs the built-in context into the root scope: the primitive types, the boolean constants,
/// and every function in the registry.
pub fn install(scopes: &mut ScopeArena) {
	let root = scopes.current();

	for (name, ty) in [
		("Unit", Type::Unit),
		("Void", Type::Void),
		("Bool", Type::Bool),
		("Int", Type::Int),
		("Float", Type::Float),
	] {
		scopes
			.add_term(root, name, Term::Constant(Value::Type(ty)))
			.expect("the root scope starts empty");
	}

	scopes
		.add_term(root, "true", Term::Constant(Value::Bool(true)))
		.expect("the root scope starts empty");
	scopes
		.add_term(root, "false", Term::Constant(Value::Bool(false)))
		.expect("the root scope starts empty");

	for name in BUILTIN_FUNCTIONS.keys() {
		scopes
			.add_term(root, name, Term::Constant(Value::Builtin(name)))
			.expect("the root scope starts empty");
	}
}
