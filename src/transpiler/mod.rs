//! The C back-end. Emission is driven by the partial-evaluation classification: everything the
//! elaborator folded is emitted as its literal value, and only the residual runtime program
//! becomes C code. The output is a single translation unit that includes `builtins.h`.

use std::collections::HashMap;

use crate::{
	errors::{Error, ModelError, ModelErrorKind},
	model::{
		types::{FunctionType, Type},
		Block, Definition, EnumId, Expression, ExpressionKind, FunctionId, Model, Statement, Value, VariableId,
	},
	transpiler::output::Output,
};

/// The output tree.
pub mod output;

/// Transpiles an elaborated program to C source.
pub fn transpile(model: &Model) -> Result<String, Error> {
	let mut transpiler = Transpiler::new(model);
	transpiler.program()?;
	Ok(transpiler.render())
}

struct Transpiler<'model> {
	model: &'model Model,
	/// Enumeration and function-pointer typedefs, hoisted above everything else.
	typedefs: Output,
	/// Forward declarations for every emitted function.
	prototypes: Output,
	/// Function definitions.
	functions: Output,
	/// Global variable definitions.
	globals: Output,
	/// Declarations hoisted to the top of the generated `main`.
	main_prelude: Output,
	/// Top-level runtime statements, run at the start of the generated `main` in source order.
	main_body: Output,
	function_names: HashMap<FunctionId, String>,
	enum_names: HashMap<EnumId, String>,
	/// Function-pointer typedefs are emitted once per structural type.
	function_type_names: Vec<(FunctionType, String)>,
	next_temporary: usize,
}

impl<'model> Transpiler<'model> {
	fn new(model: &'model Model) -> Self {
		Self {
			model,
			typedefs: Output::new(),
			prototypes: Output::new(),
			functions: Output::new(),
			globals: Output::new(),
			main_prelude: Output::new(),
			main_body: Output::new(),
			function_names: HashMap::new(),
			enum_names: HashMap::new(),
			function_type_names: Vec::new(),
			next_temporary: 0,
		}
	}

	fn fatal(&self, message: impl Into<String>, node: &str) -> Error {
		Error::Model(ModelError::new(
			ModelErrorKind::FatalError { message: message.into() },
			node,
			self.model.program.span,
		))
	}

	// ------------------------------------------------------------------------------------------
	// Program assembly
	// ------------------------------------------------------------------------------------------

	fn program(&mut self) -> Result<(), Error> {
		for statement in &self.model.program.statements {
			match statement {
				Statement::Definition(definition) => self.emit_global(definition)?,
				Statement::Expression(expression) => {
					// Folded top-level work already happened at build time; everything else is
					// deferred into the generated main.
					let prelude = self.main_prelude.clone();
					let body = self.main_body.clone();
					self.emit_statement(expression, &prelude, &body)?;
				},
			}
		}

		let Some(main) = self.model.main_function() else {
			return Err(Error::Model(ModelError::new(
				ModelErrorKind::Undefined { name: "main".to_owned() },
				"main",
				self.model.program.span,
			)));
		};
		let name = self.function_name(main)?;
		let body = self.main_body.clone();
		if self.model.function(main).signature.return_type == Type::Int {
			body.push("return");
			body.push(format!("{name}()"));
			body.push(";");
			body.newline();
		} else {
			body.push(format!("{name}()"));
			body.push(";");
			body.newline();
			body.push("return 0");
			body.push(";");
			body.newline();
		}
		Ok(())
	}

	fn render(&self) -> String {
		let root = Output::new();
		root.push("#include \"builtins.h\"");
		root.newline();
		for section in [&self.typedefs, &self.prototypes, &self.globals, &self.functions] {
			if !section.is_empty() {
				root.newline();
				root.append(section);
			}
		}
		root.newline();
		root.push("int main(void) {");
		root.newline();
		let inner = root.indented_child();
		inner.append(&self.main_prelude);
		inner.append(&self.main_body);
		root.push("}");
		root.newline();
		root.render()
	}

	// ------------------------------------------------------------------------------------------
	// Definitions
	// ------------------------------------------------------------------------------------------

	/// Emits a top-level variable. Initializers the elaborator folded become C initializers;
	/// runtime initializers leave an uninitialized global that the generated main fills in, in
	/// source order with the other deferred statements.
	fn emit_global(&mut self, definition: &Definition) -> Result<(), Error> {
		let variable = self.model.variable(definition.variable);
		let name = self.variable_name(definition.variable);
		let c_type = self.c_type(&variable.ty)?;

		match &definition.initializer {
			Some(initializer) => {
				if let Some(literal) = self.literal_of(initializer)? {
					if variable.readonly {
						self.globals.push("const");
					}
					self.globals.push(c_type);
					self.globals.push(name);
					self.globals.push("=");
					self.globals.push(literal);
					self.globals.push(";");
					self.globals.newline();
				} else {
					self.globals.push(c_type);
					self.globals.push(name.clone());
					self.globals.push(";");
					self.globals.newline();

					let prelude = self.main_prelude.clone();
					let body = self.main_body.clone();
					if variable.ty == Type::Unit || initializer.ty == Type::Void {
						// The initializer runs for its effects; only the sentinel is stored.
						self.emit_statement(initializer, &prelude, &body)?;
						if initializer.ty != Type::Void {
							body.push(name);
							body.push("=");
							body.push("unit");
							body.push(";");
							body.newline();
						}
					} else {
						let value = Output::new();
						self.emit_expression(initializer, &prelude, &body, Some(&value))?;
						body.push(name);
						body.push("=");
						body.append(&value);
						body.push(";");
						body.newline();
					}
				}
			},
			None => {
				self.globals.push(c_type);
				self.globals.push(name);
				self.globals.push(";");
				self.globals.newline();
			},
		}
		Ok(())
	}

	/// Emits a local variable definition into the enclosing block.
	fn emit_local(&mut self, definition: &Definition, prelude: &Output, body: &Output) -> Result<(), Error> {
		let variable = self.model.variable(definition.variable);
		let name = self.variable_name(definition.variable);
		let c_type = self.c_type(&variable.ty)?;

		match &definition.initializer {
			Some(initializer) => {
				// An effectful initializer whose result is discarded (a Unit binding) runs as a
				// statement; the binding itself is just the sentinel.
				if variable.ty == Type::Unit && self.literal_of(initializer)?.is_none() {
					self.emit_statement(initializer, prelude, body)?;
					body.push("Unit");
					body.push(name);
					body.push("=");
					body.push("unit");
					body.push(";");
					body.newline();
					return Ok(());
				}

				let value = Output::new();
				self.emit_expression(initializer, prelude, body, Some(&value))?;
				if variable.readonly {
					body.push("const");
				}
				body.push(c_type);
				body.push(name);
				body.push("=");
				body.append(&value);
				body.push(";");
				body.newline();
			},
			None => {
				body.push(c_type);
				body.push(name);
				body.push(";");
				body.newline();
			},
		}
		Ok(())
	}

	// ------------------------------------------------------------------------------------------
	// Statements and expressions
	// ------------------------------------------------------------------------------------------

	/// Emits an expression used as a statement. Folded and effect-free expressions emit nothing.
	fn emit_statement(&mut self, expression: &Expression, prelude: &Output, body: &Output) -> Result<(), Error> {
		match &expression.kind {
			// Already executed at build time, or without effects.
			ExpressionKind::Precompiled { .. }
			| ExpressionKind::Constant(_)
			| ExpressionKind::Reference(_)
			| ExpressionKind::FunctionReference(_) => Ok(()),

			ExpressionKind::Assignment { destination, value } => {
				let value_out = Output::new();
				self.emit_expression(value, prelude, body, Some(&value_out))?;
				body.push(self.variable_name(*destination));
				body.push("=");
				body.append(&value_out);
				body.push(";");
				body.newline();
				Ok(())
			},

			ExpressionKind::Call { .. } => {
				let call = Output::new();
				self.emit_expression(expression, prelude, body, Some(&call))?;
				body.append(&call);
				body.push(";");
				body.newline();
				Ok(())
			},

			ExpressionKind::If {
				condition,
				on_true,
				on_false,
			} => self.emit_if(condition, on_true, on_false.as_ref(), prelude, body, None),

			ExpressionKind::While { condition, body: loop_body } => {
				self.emit_while(condition, loop_body, prelude, body)
			},

			ExpressionKind::Block(block) => {
				body.push("{");
				body.newline();
				let inner = body.indented_child();
				self.emit_block_contents(block, &inner, None)?;
				body.push("}");
				body.newline();
				Ok(())
			},
		}
	}

	/// Emits an expression. `result` is where the expression's value textually lands; statements
	/// that support the value (temporaries, branches) go into `body`, and their declarations into
	/// `prelude`.
	fn emit_expression(
		&mut self,
		expression: &Expression,
		prelude: &Output,
		body: &Output,
		result: Option<&Output>,
	) -> Result<(), Error> {
		// Everything the partial evaluator reduced emits as its value.
		if let Some(literal) = self.literal_of(expression)? {
			if let Some(result) = result {
				result.push(literal);
			}
			return Ok(());
		}

		match &expression.kind {
			ExpressionKind::Reference(variable) => {
				if let Some(result) = result {
					result.push(self.variable_name(*variable));
				}
				Ok(())
			},

			ExpressionKind::Call { callee, arguments } => {
				let callee_out = Output::new();
				self.emit_expression(callee, prelude, body, Some(&callee_out))?;
				let call = Output::new();
				call.append(&callee_out);
				call.push("(");
				for (index, argument) in arguments.iter().enumerate() {
					if index > 0 {
						call.push(",");
					}
					let argument_out = Output::new();
					self.emit_expression(argument, prelude, body, Some(&argument_out))?;
					call.append(&argument_out);
				}
				call.push(")");
				match result {
					Some(result) => result.append(&call),
					None => {
						body.append(&call);
						body.push(";");
						body.newline();
					},
				}
				Ok(())
			},

			ExpressionKind::If {
				condition,
				on_true,
				on_false,
			} => match result {
				None => self.emit_if(condition, on_true, on_false.as_ref(), prelude, body, None),
				Some(result) if expression.ty == Type::Unit => {
					self.emit_if(condition, on_true, on_false.as_ref(), prelude, body, None)?;
					result.push("unit");
					Ok(())
				},
				Some(result) => {
					let temporary = self.temporary();
					prelude.push(self.c_type(&expression.ty)?);
					prelude.push(temporary.clone());
					prelude.push(";");
					prelude.newline();
					self.emit_if(condition, on_true, on_false.as_ref(), prelude, body, Some(temporary.as_str()))?;
					result.push(temporary);
					Ok(())
				},
			},

			ExpressionKind::While { condition, body: loop_body } => {
				self.emit_while(condition, loop_body, prelude, body)?;
				if let Some(result) = result {
					result.push("unit");
				}
				Ok(())
			},

			ExpressionKind::Block(block) => match result {
				None => self.emit_statement(expression, prelude, body),
				Some(result) if expression.ty == Type::Unit => {
					self.emit_statement(expression, prelude, body)?;
					result.push("unit");
					Ok(())
				},
				Some(result) => {
					let temporary = self.temporary();
					prelude.push(self.c_type(&expression.ty)?);
					prelude.push(temporary.clone());
					prelude.push(";");
					prelude.newline();
					body.push("{");
					body.newline();
					let inner = body.indented_child();
					self.emit_block_contents(block, &inner, Some(temporary.as_str()))?;
					body.push("}");
					body.newline();
					result.push(temporary);
					Ok(())
				},
			},

			ExpressionKind::Assignment { .. } => {
				Err(self.fatal("an assignment cannot be emitted as a value", "assignment"))
			},

			// Handled by the literal path above.
			ExpressionKind::Precompiled { .. } | ExpressionKind::Constant(_) | ExpressionKind::FunctionReference(_) => {
				Ok(())
			},
		}
	}

	fn emit_if(
		&mut self,
		condition: &Expression,
		on_true: &Block,
		on_false: Option<&Block>,
		prelude: &Output,
		body: &Output,
		target: Option<&str>,
	) -> Result<(), Error> {
		let condition_out = Output::new();
		self.emit_expression(condition, prelude, body, Some(&condition_out))?;

		body.push("if (");
		body.append(&condition_out);
		body.push(") {");
		body.newline();
		let true_branch = body.indented_child();
		self.emit_block_contents(on_true, &true_branch, target)?;
		match on_false {
			Some(on_false) => {
				body.push("} else {");
				body.newline();
				let false_branch = body.indented_child();
				self.emit_block_contents(on_false, &false_branch, target)?;
				body.push("}");
				body.newline();
			},
			None => {
				body.push("}");
				body.newline();
			},
		}
		Ok(())
	}

	fn emit_while(
		&mut self,
		condition: &Expression,
		loop_body: &Block,
		_prelude: &Output,
		body: &Output,
	) -> Result<(), Error> {
		let condition_out = Output::new();
		let condition_prelude = Output::new();
		let condition_body = Output::new();
		self.emit_expression(condition, &condition_prelude, &condition_body, Some(&condition_out))?;

		if condition_prelude.is_empty() && condition_body.is_empty() {
			body.push("while (");
			body.append(&condition_out);
			body.push(") {");
			body.newline();
			let inner = body.indented_child();
			self.emit_block_contents(loop_body, &inner, None)?;
			body.push("}");
			body.newline();
		} else {
			// The condition needs statements of its own, so it is re-evaluated at the top of
			// every iteration.
			body.push("while (1) {");
			body.newline();
			let inner = body.indented_child();
			inner.append(&condition_prelude);
			inner.append(&condition_body);
			inner.push("if (!(");
			inner.append(&condition_out);
			inner.push(")) break");
			inner.push(";");
			inner.newline();
			self.emit_block_contents(loop_body, &inner, None)?;
			body.push("}");
			body.newline();
		}
		Ok(())
	}

	/// Emits a block's statements. With a `target`, the block's final expression is assigned into
	/// the named temporary instead of being emitted as a statement.
	fn emit_block_contents(&mut self, block: &Block, into: &Output, target: Option<&str>) -> Result<(), Error> {
		let prelude = into.child();
		let count = block.statements.len();
		for (index, statement) in block.statements.iter().enumerate() {
			let is_last = index + 1 == count;
			if is_last {
				if let (Some(target), Statement::Expression(expression)) = (target, statement) {
					// A result that never materialises (the branch ends in `abort`) cannot be
					// assigned anywhere.
					if expression.ty == Type::Void {
						self.emit_statement(expression, &prelude, into)?;
						continue;
					}
					let value = Output::new();
					self.emit_expression(expression, &prelude, into, Some(&value))?;
					into.push(target);
					into.push("=");
					into.append(&value);
					into.push(";");
					into.newline();
					continue;
				}
			}
			match statement {
				Statement::Definition(definition) => self.emit_local(definition, &prelude, into)?,
				Statement::Expression(expression) => self.emit_statement(expression, &prelude, into)?,
			}
		}
		Ok(())
	}

	// ------------------------------------------------------------------------------------------
	// Functions
	// ------------------------------------------------------------------------------------------

	/// The C symbol for a function, emitting its prototype and definition on first use. The name
	/// is cached before the body is emitted, so recursion terminates.
	fn function_name(&mut self, function: FunctionId) -> Result<String, Error> {
		if let Some(name) = self.function_names.get(&function) {
			return Ok(name.clone());
		}
		let entry = self.model.function(function);
		let name = format!(
			"{}_{}",
			entry.name.clone().unwrap_or_else(|| "function".to_owned()),
			function.0
		);
		self.function_names.insert(function, name.clone());

		let return_type = match &entry.signature.return_type {
			Type::Unit | Type::Void => "void".to_owned(),
			other => self.c_type(other)?,
		};
		let mut parameters = Vec::new();
		for parameter in &entry.parameters {
			let parameter_type = self.c_type(&self.model.variable(*parameter).ty)?;
			parameters.push(format!("{parameter_type} {}", self.variable_name(*parameter)));
		}
		let parameter_list = if parameters.is_empty() {
			"void".to_owned()
		} else {
			parameters.join(", ")
		};

		self.prototypes.push(format!("{return_type} {name}({parameter_list});"));
		self.prototypes.newline();

		let body = entry
			.body
			.as_ref()
			.ok_or_else(|| self.fatal("function body missing during emission", &name))?;

		let definition = self.functions.child();
		definition.push(format!("{return_type} {name}({parameter_list}) {{"));
		definition.newline();
		let inner = definition.indented_child();
		if matches!(entry.signature.return_type, Type::Unit | Type::Void) {
			self.emit_block_contents(body, &inner, None)?;
		} else {
			let temporary = self.temporary();
			inner.push(self.c_type(&entry.signature.return_type)?);
			inner.push(temporary.clone());
			inner.push(";");
			inner.newline();
			self.emit_block_contents(body, &inner, Some(temporary.as_str()))?;
			inner.push("return");
			inner.push(temporary);
			inner.push(";");
			inner.newline();
		}
		definition.push("}");
		definition.newline();
		definition.newline();

		Ok(name)
	}

	// ------------------------------------------------------------------------------------------
	// Types, names, and literals
	// ------------------------------------------------------------------------------------------

	fn variable_name(&self, variable: VariableId) -> String {
		format!("{}_{}", self.model.variable(variable).name, variable.0)
	}

	fn temporary(&mut self) -> String {
		let name = format!("tmp_{}", self.next_temporary);
		self.next_temporary += 1;
		name
	}

	/// The C name of an enumeration, emitting its typedef on first use. An enumeration without
	/// variants gets an `empty` tag so the C still compiles.
	fn enum_name(&mut self, enum_id: EnumId) -> String {
		if let Some(name) = self.enum_names.get(&enum_id) {
			return name.clone();
		}
		let entry = self.model.enumeration(enum_id);
		let name = format!("{}_{}", entry.name.clone().unwrap_or_else(|| "Enum".to_owned()), enum_id.0);
		self.enum_names.insert(enum_id, name.clone());

		let tags = if entry.values.is_empty() {
			vec![format!("{name}_empty")]
		} else {
			entry.values.iter().map(|value| format!("{name}_{value}")).collect::<Vec<_>>()
		};
		self.typedefs.push(format!("typedef enum {{ {} }} {name};", tags.join(", ")));
		self.typedefs.newline();
		name
	}

	/// The C typedef name of a function-pointer type, emitted once per structural type.
	fn function_type_name(&mut self, signature: &FunctionType) -> Result<String, Error> {
		if let Some((_, name)) = self.function_type_names.iter().find(|(known, _)| known == signature) {
			return Ok(name.clone());
		}
		let name = format!("Fn_{}", self.function_type_names.len());
		self.function_type_names.push((signature.clone(), name.clone()));

		let return_type = match &signature.return_type {
			Type::Unit | Type::Void => "void".to_owned(),
			other => self.c_type(other)?,
		};
		let parameters = signature
			.parameters
			.iter()
			.map(|parameter| self.c_type(parameter))
			.collect::<Result<Vec<_>, _>>()?;
		let parameter_list = if parameters.is_empty() {
			"void".to_owned()
		} else {
			parameters.join(", ")
		};
		self.typedefs.push(format!("typedef {return_type} (*{name})({parameter_list});"));
		self.typedefs.newline();
		Ok(name)
	}

	fn c_type(&mut self, ty: &Type) -> Result<String, Error> {
		match ty {
			Type::Unit => Ok("Unit".to_owned()),
			Type::Bool => Ok("Bool".to_owned()),
			Type::Int => Ok("Int".to_owned()),
			Type::Float => Ok("Float".to_owned()),
			Type::Enum(enum_id) => Ok(self.enum_name(*enum_id)),
			Type::Function(signature) => self.function_type_name(signature),
			Type::Void => Err(self.fatal("cannot declare a value of type Void", "Void")),
			Type::Meta => Err(self.fatal("a type value cannot be emitted as C", "Type")),
		}
	}

	/// The literal form of an expression the elaborator reduced to a value, if it did.
	fn literal_of(&mut self, expression: &Expression) -> Result<Option<String>, Error> {
		match &expression.kind {
			ExpressionKind::Precompiled { value, .. } | ExpressionKind::Constant(value) => {
				Ok(Some(self.literal(value)?))
			},
			ExpressionKind::FunctionReference(function) => Ok(Some(self.function_name(*function)?)),
			_ => Ok(None),
		}
	}

	/// The C literal for a value. Booleans are lowercased; enumeration variants become their
	/// typedef tags; functions become their symbols.
	fn literal(&mut self, value: &Value) -> Result<String, Error> {
		match value {
			Value::Unit => Ok("unit".to_owned()),
			Value::Bool(true) => Ok("true".to_owned()),
			Value::Bool(false) => Ok("false".to_owned()),
			Value::Integer(integer) => Ok(integer.to_string()),
			Value::Float(float) => Ok(format!("{float:?}")),
			Value::Variant { enum_id, index } => {
				let name = self.enum_name(*enum_id);
				let entry = self.model.enumeration(*enum_id);
				let variant = entry
					.values
					.get(*index)
					.ok_or_else(|| self.fatal("enumeration variant out of range", &name))?;
				Ok(format!("{name}_{variant}"))
			},
			Value::Function { function, .. } => self.function_name(*function),
			Value::Builtin(name) => Ok((*name).to_owned()),
			Value::Type(_) => Err(self.fatal("a type value cannot be emitted as C", "Type")),
		}
	}
}
