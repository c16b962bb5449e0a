//! The tree-walking interpreter. It is a pure function over model nodes and a frame arena, which
//! is what lets the elaborator call it to fold compile-time subtrees and the `run` driver call it
//! to execute whole programs, without the two ever diverging.

use std::collections::HashMap;
use std::io;

use crate::{
	builtins,
	errors::{Error, InterpreterError},
	model::{
		scope::Term, types::Type, Block, Definition, Expression, ExpressionKind, Model, OwnerId, Statement, Value,
		VariableId,
	},
};

/// How deep calls may nest before the interpreter gives up. This bounds runaway recursion both at
/// run time and during build-time folding.
const MAXIMUM_CALL_DEPTH: usize = 4096;

/// One runtime frame: the values of the variables of one owner, plus the frame it is lexically
/// nested under.
#[derive(Debug)]
struct Frame {
	parent: Option<usize>,
	owner: OwnerId,
	/// `None` marks a variable that is registered in this frame but not yet bound.
	slots: HashMap<VariableId, Option<Value>>,
}

/// The frame arena. Frame 0 is the root: the program's global state at run time, or the
/// build-time value store during elaboration. Frames are never popped, because function values
/// may keep referring to the frame they closed over.
#[derive(Debug)]
pub struct Frames {
	frames: Vec<Frame>,
}

impl Frames {
	#[must_use]
	pub fn new(root_owner: OwnerId) -> Self {
		Self {
			frames: vec![Frame {
				parent: None,
				owner: root_owner,
				slots: HashMap::new(),
			}],
		}
	}

	fn push(&mut self, parent: usize, owner: OwnerId) -> usize {
		self.frames.push(Frame {
			parent: Some(parent),
			owner,
			slots: HashMap::new(),
		});
		self.frames.len() - 1
	}

	/// Registers a variable in the given frame without binding it.
	fn declare(&mut self, frame: usize, variable: VariableId) {
		self.frames[frame].slots.insert(variable, None);
	}

	/// Binds a variable in the given frame, registering it if needed.
	fn bind(&mut self, frame: usize, variable: VariableId, value: Value) {
		self.frames[frame].slots.insert(variable, Some(value));
	}

	/// Assigns to a variable, walking the parent chain to find the frame it is registered in.
	/// A variable found in no frame is bound at the root; this happens when the elaborator
	/// replays writes whose declarations it already folded away.
	fn assign(&mut self, frame: usize, variable: VariableId, value: Value) {
		let mut current = Some(frame);
		while let Some(index) = current {
			if self.frames[index].slots.contains_key(&variable) {
				self.frames[index].slots.insert(variable, Some(value));
				return;
			}
			current = self.frames[index].parent;
		}
		self.bind(0, variable, value);
	}

	/// Reads a variable, walking the parent chain. `Ok(None)` means registered but unbound.
	fn read(&self, frame: usize, variable: VariableId) -> Option<&Option<Value>> {
		let mut current = Some(frame);
		while let Some(index) = current {
			if let Some(slot) = self.frames[index].slots.get(&variable) {
				return Some(slot);
			}
			current = self.frames[index].parent;
		}
		None
	}

	/// The nearest frame, starting at `frame` and walking outward, that belongs to the given
	/// owner. Function values capture this as their environment.
	fn find_environment(&self, frame: usize, owner: OwnerId) -> usize {
		let mut current = Some(frame);
		while let Some(index) = current {
			if self.frames[index].owner == owner {
				return index;
			}
			current = self.frames[index].parent;
		}
		0
	}

	/// Binds a value in the root frame. Used by the elaborator for the build-time store.
	pub fn root_bind(&mut self, variable: VariableId, value: Value) {
		self.bind(0, variable, value);
	}

	/// The root frame's value for a variable, if bound.
	#[must_use]
	pub fn root_value(&self, variable: VariableId) -> Option<Value> {
		self.frames[0].slots.get(&variable).and_then(Clone::clone)
	}

}

/// An evaluation in progress: the model, the frame arena, and the sink the printing built-ins
/// write to.
pub struct Machine<'a> {
	model: &'a Model,
	frames: &'a mut Frames,
	output: &'a mut dyn io::Write,
	depth: usize,
}

impl<'a> Machine<'a> {
	pub fn new(model: &'a Model, frames: &'a mut Frames, output: &'a mut dyn io::Write) -> Self {
		Self {
			model,
			frames,
			output,
			depth: 0,
		}
	}

	/// Evaluates an expression in the given frame.
	pub fn evaluate(&mut self, frame: usize, expression: &Expression) -> Result<Value, InterpreterError> {
		match &expression.kind {
			ExpressionKind::Constant(value) | ExpressionKind::Precompiled { value, .. } => Ok(value.clone()),

			ExpressionKind::Reference(variable) => match self.frames.read(frame, *variable) {
				Some(Some(value)) => Ok(value.clone()),
				_ => Err(InterpreterError::NotInitialized {
					name: self.model.variable(*variable).name.clone(),
				}),
			},

			ExpressionKind::FunctionReference(function) => {
				let environment = self.frames.find_environment(frame, self.model.function(*function).defining_owner);
				Ok(Value::Function {
					function: *function,
					environment,
				})
			},

			ExpressionKind::Call { callee, arguments } => {
				let callee = self.evaluate(frame, callee)?;
				let mut values = Vec::with_capacity(arguments.len());
				for argument in arguments {
					values.push(self.evaluate(frame, argument)?);
				}
				self.call(callee, values)
			},

			ExpressionKind::Assignment { destination, value } => {
				let value = self.evaluate(frame, value)?;
				self.frames.assign(frame, *destination, value);
				Ok(Value::Unit)
			},

			ExpressionKind::If {
				condition,
				on_true,
				on_false,
			} => {
				if self.truthy(frame, condition)? {
					self.execute_block(frame, on_true)
				} else if let Some(on_false) = on_false {
					self.execute_block(frame, on_false)
				} else {
					Ok(Value::Unit)
				}
			},

			ExpressionKind::While { condition, body } => {
				while self.truthy(frame, condition)? {
					self.execute_block(frame, body)?;
				}
				Ok(Value::Unit)
			},

			ExpressionKind::Block(block) => self.execute_block(frame, block),
		}
	}

	fn truthy(&mut self, frame: usize, condition: &Expression) -> Result<bool, InterpreterError> {
		match self.evaluate(frame, condition)? {
			Value::Bool(value) => Ok(value),
			other => Err(InterpreterError::Fatal {
				message: format!("condition did not evaluate to a boolean: {other:?}"),
			}),
		}
	}

	/// Executes the statements of a block in order. The result is the value of the final
	/// statement when it is an expression, and `Unit` otherwise.
	pub fn execute_block(&mut self, frame: usize, block: &Block) -> Result<Value, InterpreterError> {
		let mut result = Value::Unit;
		for statement in &block.statements {
			result = match statement {
				Statement::Definition(definition) => {
					self.execute_definition(frame, definition)?;
					Value::Unit
				},
				Statement::Expression(expression) => self.evaluate(frame, expression)?,
			};
		}
		Ok(result)
	}

	fn execute_definition(&mut self, frame: usize, definition: &Definition) -> Result<(), InterpreterError> {
		let Definition { variable, initializer, .. } = definition;
		match initializer {
			Some(initializer) => {
				let value = self.evaluate(frame, initializer)?;
				self.frames.bind(frame, *variable, value);
			},
			None => self.frames.declare(frame, *variable),
		}
		Ok(())
	}

	/// Calls a callable value with already-evaluated arguments.
	pub fn call(&mut self, callee: Value, arguments: Vec<Value>) -> Result<Value, InterpreterError> {
		match callee {
			Value::Function { function, environment } => {
				if self.depth >= MAXIMUM_CALL_DEPTH {
					return Err(InterpreterError::Fatal {
						message: "call depth limit exceeded".to_owned(),
					});
				}
				let entry = self.model.function(function);
				let Some(body) = &entry.body else {
					return Err(InterpreterError::Fatal {
						message: "called a function whose body is not elaborated yet".to_owned(),
					});
				};
				let frame = self.frames.push(environment, entry.owner);
				for (parameter, argument) in entry.parameters.iter().zip(arguments) {
					self.frames.bind(frame, *parameter, argument);
				}
				self.depth += 1;
				let result = self.execute_block(frame, body);
				self.depth -= 1;
				let result = result?;
				// A function declared without a result discards whatever its body produced.
				if entry.signature.return_type == Type::Unit {
					return Ok(Value::Unit);
				}
				Ok(result)
			},

			Value::Builtin(name) => {
				let builtin = builtins::lookup(name).ok_or_else(|| InterpreterError::Fatal {
					message: format!("unknown built-in function: {name}"),
				})?;
				(builtin.implementation)(self.output, &arguments)
			},

			other => Err(InterpreterError::Fatal {
				message: format!("value is not callable: {other:?}"),
			}),
		}
	}
}

/// Runs an elaborated program: executes the top-level statements in a fresh root frame, then
/// calls `main` and returns its integer result (or 0 when `main` returns something else).
pub fn interpret(model: &Model, output: &mut dyn io::Write) -> Result<i32, Error> {
	let root_owner = model.scopes.get(model.program.scope).owner();
	let mut frames = Frames::new(root_owner);
	let mut machine = Machine::new(model, &mut frames, output);

	machine.execute_block(0, &model.program)?;

	let callee = match model.scopes.resolve_from(model.program.scope, "main") {
		Some(Term::Function(function)) => Value::Function {
			function: *function,
			environment: 0,
		},
		Some(Term::Variable(variable)) => match machine.frames.read(0, *variable) {
			Some(Some(value)) => value.clone(),
			_ => return Err(Error::Interpreter(InterpreterError::MissingMain)),
		},
		Some(Term::Constant(value)) => value.clone(),
		None => return Err(Error::Interpreter(InterpreterError::MissingMain)),
	};

	if let Value::Function { function, .. } = &callee {
		if !model.function(*function).parameters.is_empty() {
			return Err(Error::Interpreter(InterpreterError::Fatal {
				message: "main must take no arguments".to_owned(),
			}));
		}
	}

	let result = machine.call(callee, Vec::new())?;
	Ok(match result {
		Value::Integer(value) => value as i32,
		_ => 0,
	})
}
