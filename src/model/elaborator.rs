//! Elaboration: one recursive pass over the syntax tree that resolves names, checks types,
//! computes runtime-dependency sets, and eagerly folds every expression whose value does not
//! depend on runtime state. The fold shares the tree-walking interpreter with the run-time
//! back-end; the build-time values live in the root frame of a persistent frame arena.

use crate::{
	errors::{Error, InlinerError, ModelError, ModelErrorKind},
	interpreter::{Frames, Machine},
	lexer::Span,
	model::{
		depends::{Dependency, DependencySet},
		scope::Term,
		types::{EnumType, FunctionType, Type},
		Block, Definition, EnumId, Expression, ExpressionKind, Function, FunctionId, Model, ScopeId, Statement, Value,
		Variable, VariableId,
	},
	parser::ast,
};

/// Elaborates a parsed program into a typed, partially evaluated model.
pub fn elaborate(program: &ast::Program) -> Result<Model, Error> {
	let mut elaborator = Elaborator::new();
	let scope = elaborator.model.scopes.enter();
	let block = elaborator.elaborate_statements(&program.statements, scope, program.span)?;
	elaborator.model.scopes.exit();
	elaborator.model.program = block;
	Ok(elaborator.model)
}

/// The elaboration state: the model being built, the build-time value store (the root frame of
/// `frames`), and a counter tracking how deep we are inside conditionally executed code.
struct Elaborator {
	model: Model,
	frames: Frames,
	/// How many `if` branches or `while` bodies enclose the current position. Assignments inside
	/// conditional code may run zero or many times, so they are pinned to runtime.
	conditional_depth: usize,
}

impl Elaborator {
	fn new() -> Self {
		let mut model = Model {
			scopes: crate::model::scope::ScopeArena::new(),
			variables: Vec::new(),
			functions: Vec::new(),
			enums: Vec::new(),
			program: Block {
				scope: ScopeId(0),
				statements: Vec::new(),
				ty: Type::Unit,
				runtime_depends: DependencySet::new(),
				span: Span::new(1, 1),
			},
		};
		crate::builtins::install(&mut model.scopes);
		Self {
			model,
			frames: Frames::new(crate::model::OwnerId(0)),
			conditional_depth: 0,
		}
	}

	fn error(&self, kind: ModelErrorKind, node: &dyn std::fmt::Display, span: Span) -> Error {
		Error::Model(ModelError::new(kind, node, span))
	}

	// ------------------------------------------------------------------------------------------
	// Statements and definitions
	// ------------------------------------------------------------------------------------------

	fn elaborate_statements(
		&mut self,
		statements: &[ast::Statement],
		scope: ScopeId,
		span: Span,
	) -> Result<Block, Error> {
		let mut elaborated = Vec::new();
		for statement in statements {
			match statement {
				ast::Statement::Var(var) => {
					if let Some(definition) = self.elaborate_var(var)? {
						elaborated.push(definition);
					}
				},
				ast::Statement::TypeAlias(alias) => self.elaborate_type_alias(alias)?,
				ast::Statement::Expression(expression) => {
					elaborated.push(Statement::Expression(self.elaborate_expression(expression)?));
				},
			}
		}

		let ty = match elaborated.last() {
			Some(Statement::Expression(expression)) => expression.ty.clone(),
			_ => Type::Unit,
		};
		let mut runtime_depends = DependencySet::new();
		for statement in &elaborated {
			match statement {
				Statement::Definition(definition) => {
					if let Some(initializer) = &definition.initializer {
						runtime_depends.extend(&initializer.runtime_depends);
					}
				},
				Statement::Expression(expression) => runtime_depends.extend(&expression.runtime_depends),
			}
		}

		Ok(Block {
			scope,
			statements: elaborated,
			ty,
			runtime_depends,
			span,
		})
	}

	/// Elaborates a block that introduces its own scope, such as an `if` branch or a braced
	/// expression.
	fn elaborate_block(&mut self, block: &ast::Block) -> Result<Block, Error> {
		let scope = self.model.scopes.enter();
		let result = self.elaborate_statements(&block.statements, scope, block.span);
		self.model.scopes.exit();
		result
	}

	/// Elaborates a `let`/`var` definition. Returns `None` for definitions that exist only at
	/// compile time (functions, enumerations, type values): those register scope terms and leave
	/// nothing behind for the back-ends.
	fn elaborate_var(&mut self, var: &ast::Var) -> Result<Option<Statement>, Error> {
		// A named function definition registers its term before its body is elaborated, so the
		// body can refer to the function recursively.
		if let Some(ast::Expression::Function(function)) = &var.value {
			if var.readonly && var.type_annotation.is_none() {
				self.elaborate_function(function, Some(var.name.clone()), var)?;
				return Ok(None);
			}
		}

		let annotation = match &var.type_annotation {
			Some(annotation) => Some(self.resolve_type(annotation)?),
			None => None,
		};
		let initializer = match &var.value {
			Some(ast::Expression::Enum(enumeration)) => Some(self.elaborate_enum(enumeration, Some(var.name.clone()))),
			Some(value) => Some(self.elaborate_expression(value)?),
			None => None,
		};

		let ty = match (&annotation, &initializer) {
			(Some(declared), Some(initializer)) => {
				if !declared.assignable_from(&initializer.ty) {
					return Err(self.error(
						ModelErrorKind::TypeMismatch {
							expected: self.model.type_name(declared),
							got: self.model.type_name(&initializer.ty),
						},
						var,
						var.span,
					));
				}
				declared.clone()
			},
			(Some(declared), None) => declared.clone(),
			(None, Some(initializer)) => initializer.ty.clone(),
			(None, None) => {
				return Err(self.error(
					ModelErrorKind::KindMismatch {
						message: format!("no type specified for: {}", var.name),
					},
					var,
					var.span,
				))
			},
		};

		// Type-valued definitions (enumerations, aliases through `let`) are compile-time terms.
		if ty == Type::Meta {
			return self.define_constant(var, initializer).map(|()| None);
		}

		let variable_id = VariableId(self.model.variables.len());
		self.model.variables.push(Variable {
			name: var.name.clone(),
			readonly: var.readonly,
			ty,
			owner: self.model.scopes.current_owner(),
			runtime_depends: initializer
				.as_ref()
				.map(|initializer| initializer.runtime_depends.clone())
				.unwrap_or_default(),
			span: var.span,
		});

		let scope = self.model.scopes.current();
		self.model
			.scopes
			.add_term(scope, &var.name, Term::Variable(variable_id))
			.map_err(|name| self.error(ModelErrorKind::AlreadyDefined { name }, var, var.span))?;

		// When the initializer folded, remember the value: later reads of this variable can fold
		// against it.
		if let Some(initializer) = &initializer {
			if initializer.runtime_depends.is_empty() {
				if let Some(value) = self.known_value(initializer) {
					self.frames.root_bind(variable_id, value);
				}
			}
		}

		Ok(Some(Statement::Definition(Definition {
			variable: variable_id,
			initializer,
			span: var.span,
		})))
	}

	/// Registers a definition whose value is a type: a named enumeration or an alias introduced
	/// with `let`.
	fn define_constant(&mut self, var: &ast::Var, initializer: Option<Expression>) -> Result<(), Error> {
		if !var.readonly {
			return Err(self.error(
				ModelErrorKind::KindMismatch {
					message: format!("types must be immutable: {}", var.name),
				},
				var,
				var.span,
			));
		}
		let Some(initializer) = initializer else {
			return Err(self.error(ModelErrorKind::NoValue, var, var.span));
		};
		if !initializer.runtime_depends.is_empty() {
			return Err(self.error(ModelErrorKind::NotCompileTime, var, var.span));
		}
		let value = match self.known_value(&initializer) {
			Some(value) => value,
			None => self.fold_value(&initializer)?,
		};
		let scope = self.model.scopes.current();
		self.model
			.scopes
			.add_term(scope, &var.name, Term::Constant(value))
			.map_err(|name| self.error(ModelErrorKind::AlreadyDefined { name }, var, var.span))?;
		Ok(())
	}

	fn elaborate_type_alias(&mut self, alias: &ast::TypeAlias) -> Result<(), Error> {
		let target = self.resolve_type(&alias.target)?;
		let scope = self.model.scopes.current();
		self.model
			.scopes
			.add_term(scope, &alias.name, Term::Constant(Value::Type(target)))
			.map_err(|name| self.error(ModelErrorKind::AlreadyDefined { name }, alias, alias.span))?;
		Ok(())
	}

	// ------------------------------------------------------------------------------------------
	// Expressions
	// ------------------------------------------------------------------------------------------

	fn elaborate_expression(&mut self, expression: &ast::Expression) -> Result<Expression, Error> {
		let elaborated = match expression {
			ast::Expression::Term(term) => self.elaborate_term(term)?,
			ast::Expression::Value(value) => elaborate_literal(value),
			ast::Expression::Call(call) => self.elaborate_call(call)?,
			ast::Expression::AttributeAccess(access) => self.elaborate_attribute_access(access)?,
			ast::Expression::Assignment(assignment) => self.elaborate_assignment(assignment)?,
			ast::Expression::If(if_expression) => self.elaborate_if(if_expression)?,
			ast::Expression::While(while_loop) => self.elaborate_while(while_loop)?,
			ast::Expression::Block(block) => {
				let block = self.elaborate_block(block)?;
				Expression {
					ty: block.ty.clone(),
					runtime_depends: block.runtime_depends.clone(),
					span: block.span,
					kind: ExpressionKind::Block(block),
				}
			},
			ast::Expression::Function(function) => {
				let function_id = self.elaborate_function(function, None, function)?;
				Expression {
					kind: ExpressionKind::FunctionReference(function_id),
					ty: Type::Function(Box::new(self.model.functions[function_id.0].signature.clone())),
					runtime_depends: DependencySet::new(),
					span: function.span,
				}
			},
			ast::Expression::Enum(enumeration) => self.elaborate_enum(enumeration, None),
			ast::Expression::Tuple(tuple) => {
				return Err(self.error(
					ModelErrorKind::KindMismatch {
						message: "tuple types are not supported".to_owned(),
					},
					tuple,
					tuple.span,
				))
			},
		};
		self.maybe_fold(elaborated)
	}

	fn elaborate_term(&mut self, term: &ast::Term) -> Result<Expression, Error> {
		let Some(resolved) = self.model.scopes.resolve(&term.name).cloned() else {
			return Err(self.error(ModelErrorKind::Undefined { name: term.name.clone() }, term, term.span));
		};

		Ok(match resolved {
			Term::Variable(variable_id) => {
				let variable = &self.model.variables[variable_id.0];
				// Only a mutable variable read across a function boundary is opaque at build
				// time; everything else just propagates whatever the variable itself depends on.
				let runtime_depends = if variable.owner == self.model.scopes.current_owner() || variable.readonly {
					variable.runtime_depends.clone()
				} else {
					DependencySet::from_iter([Dependency::Variable(variable_id)])
				};
				Expression {
					kind: ExpressionKind::Reference(variable_id),
					ty: variable.ty.clone(),
					runtime_depends,
					span: term.span,
				}
			},
			Term::Function(function_id) => Expression {
				kind: ExpressionKind::FunctionReference(function_id),
				ty: Type::Function(Box::new(self.model.functions[function_id.0].signature.clone())),
				runtime_depends: DependencySet::new(),
				span: term.span,
			},
			Term::Constant(value) => Expression {
				ty: value.type_of(&self.model),
				kind: ExpressionKind::Constant(value),
				runtime_depends: DependencySet::new(),
				span: term.span,
			},
		})
	}

	fn elaborate_call(&mut self, call: &ast::Call) -> Result<Expression, Error> {
		let callee = self.elaborate_expression(&call.callee)?;
		let mut arguments = Vec::new();
		for argument in &call.arguments {
			arguments.push(self.elaborate_expression(argument)?);
		}

		let Type::Function(signature) = callee.ty.clone() else {
			return Err(self.error(ModelErrorKind::NotCallable, call, call.span));
		};
		if signature.parameters.len() != arguments.len() {
			return Err(self.error(
				ModelErrorKind::ArgumentCountMismatch {
					expected: signature.parameters.len(),
					got: arguments.len(),
				},
				call,
				call.span,
			));
		}
		for (parameter, argument) in signature.parameters.iter().zip(&arguments) {
			if !parameter.assignable_from(&argument.ty) {
				return Err(self.error(
					ModelErrorKind::TypeMismatch {
						expected: self.model.type_name(parameter),
						got: self.model.type_name(&argument.ty),
					},
					call,
					call.span,
				));
			}
		}

		let mut runtime_depends = callee.runtime_depends.clone();
		for argument in &arguments {
			runtime_depends.extend(&argument.runtime_depends);
		}
		runtime_depends.extend(&self.callee_call_depends(&callee));

		Ok(Expression {
			kind: ExpressionKind::Call {
				callee: Box::new(callee),
				arguments,
			},
			ty: signature.return_type.clone(),
			runtime_depends,
			span: call.span,
		})
	}

	/// What a call to the given callee depends on beyond its arguments. This is only known when
	/// the callee itself is statically known; an opaque callee contributes nothing, which is
	/// safe because function values can only be produced by literals and references.
	fn callee_call_depends(&self, callee: &Expression) -> DependencySet {
		match self.known_value(callee) {
			Some(Value::Function { function, .. }) => self.model.functions[function.0].call_runtime_depends.clone(),
			Some(Value::Builtin(name)) => {
				let builtin = crate::builtins::lookup(name).expect("built-in values come from the registry");
				if builtin.compile_time {
					DependencySet::new()
				} else {
					DependencySet::from_iter([Dependency::Builtin(name)])
				}
			},
			_ => DependencySet::new(),
		}
	}

	fn elaborate_assignment(&mut self, assignment: &ast::Assignment) -> Result<Expression, Error> {
		let resolved = self.model.scopes.resolve(&assignment.destination).cloned();
		let Some(term) = resolved else {
			return Err(self.error(
				ModelErrorKind::Undefined {
					name: assignment.destination.clone(),
				},
				assignment,
				assignment.span,
			));
		};
		let Term::Variable(destination) = term else {
			return Err(self.error(
				ModelErrorKind::KindMismatch {
					message: format!("destination is not assignable: {}", assignment.destination),
				},
				assignment,
				assignment.span,
			));
		};
		if self.model.variables[destination.0].readonly {
			return Err(self.error(
				ModelErrorKind::KindMismatch {
					message: format!("variable is immutable: {}", assignment.destination),
				},
				assignment,
				assignment.span,
			));
		}

		let value = self.elaborate_expression(&assignment.value)?;
		let destination_type = self.model.variables[destination.0].ty.clone();
		if !destination_type.assignable_from(&value.ty) {
			return Err(self.error(
				ModelErrorKind::TypeMismatch {
					expected: self.model.type_name(&destination_type),
					got: self.model.type_name(&value.ty),
				},
				assignment,
				assignment.span,
			));
		}

		let crosses_owner = self.model.variables[destination.0].owner != self.model.scopes.current_owner();
		let mut runtime_depends = value.runtime_depends.clone();
		// An assignment can only run at build time if every earlier write to the destination also
		// did; the destination's own dependency set records exactly that.
		runtime_depends.extend(&self.model.variables[destination.0].runtime_depends);
		if crosses_owner || self.conditional_depth > 0 {
			runtime_depends.insert(Dependency::Variable(destination));
		}

		// Promote the destination: from here on its value carries whatever was assigned into it.
		let mut promoted = value.runtime_depends.clone();
		if crosses_owner || self.conditional_depth > 0 {
			promoted.insert(Dependency::Variable(destination));
		}
		self.model.variables[destination.0].runtime_depends.extend(&promoted);

		// Keep the build-time store in sync: a statically known write applies now. A write pinned
		// to runtime leaves the store holding the pre-write value, which stays reachable only
		// where that is still correct: the promotion above guards every later read, and a
		// compile-time loop wants exactly the pre-loop value as its starting state.
		if runtime_depends.is_empty() {
			if let Some(value) = self.known_value(&value) {
				self.frames.root_bind(destination, value);
			}
		}

		Ok(Expression {
			kind: ExpressionKind::Assignment {
				destination,
				value: Box::new(value),
			},
			ty: Type::Unit,
			runtime_depends,
			span: assignment.span,
		})
	}

	fn elaborate_attribute_access(&mut self, access: &ast::AttributeAccess) -> Result<Expression, Error> {
		let object = self.elaborate_expression(&access.object)?;
		if !object.runtime_depends.is_empty() {
			return Err(self.error(ModelErrorKind::NotCompileTime, access, access.span));
		}
		let value = match self.known_value(&object) {
			Some(value) => value,
			None => self.fold_value(&object)?,
		};

		if let Value::Type(Type::Enum(enum_id)) = value {
			let enumeration = &self.model.enums[enum_id.0];
			let Some(index) = enumeration.values.iter().position(|value| value == &access.attribute) else {
				return Err(self.error(
					ModelErrorKind::NoSuchAttribute {
						name: access.attribute.clone(),
					},
					access,
					access.span,
				));
			};
			return Ok(Expression {
				kind: ExpressionKind::Constant(Value::Variant { enum_id, index }),
				ty: Type::Enum(enum_id),
				runtime_depends: DependencySet::new(),
				span: access.span,
			});
		}

		Err(self.error(
			ModelErrorKind::NoSuchAttribute {
				name: access.attribute.clone(),
			},
			access,
			access.span,
		))
	}

	fn elaborate_if(&mut self, if_expression: &ast::If) -> Result<Expression, Error> {
		let condition = self.elaborate_expression(&if_expression.condition)?;
		if !Type::Bool.assignable_from(&condition.ty) {
			return Err(self.error(
				ModelErrorKind::TypeMismatch {
					expected: "Bool".to_owned(),
					got: self.model.type_name(&condition.ty),
				},
				if_expression,
				if_expression.span,
			));
		}

		self.conditional_depth += 1;
		let on_true = self.elaborate_block(&if_expression.on_true);
		let on_false = if_expression.on_false.as_ref().map(|block| self.elaborate_block(block));
		self.conditional_depth -= 1;
		let on_true = on_true?;
		let on_false = on_false.transpose()?;

		let ty = match &on_false {
			Some(on_false) if on_false.ty == on_true.ty => on_true.ty.clone(),
			_ => Type::Unit,
		};

		let mut runtime_depends = condition.runtime_depends.clone();
		runtime_depends.extend(&on_true.runtime_depends);
		if let Some(on_false) = &on_false {
			runtime_depends.extend(&on_false.runtime_depends);
		}

		Ok(Expression {
			kind: ExpressionKind::If {
				condition: Box::new(condition),
				on_true,
				on_false,
			},
			ty,
			runtime_depends,
			span: if_expression.span,
		})
	}

	fn elaborate_while(&mut self, while_loop: &ast::While) -> Result<Expression, Error> {
		// Mark every variable the loop assigns before elaborating the condition: the condition is
		// re-evaluated every iteration, so it must not fold against the pre-loop value of a
		// variable the body is about to change.
		let mut targets = Vec::new();
		collect_assignment_targets(&while_loop.body.statements, &mut targets);
		let mut marked = Vec::new();
		for name in &targets {
			if let Some(Term::Variable(variable_id)) = self.model.scopes.resolve(name).cloned() {
				self.model.variables[variable_id.0]
					.runtime_depends
					.insert(Dependency::Variable(variable_id));
				if !marked.contains(&variable_id) {
					marked.push(variable_id);
				}
			}
		}

		let condition = self.elaborate_expression(&while_loop.condition)?;
		if !Type::Bool.assignable_from(&condition.ty) {
			return Err(self.error(
				ModelErrorKind::TypeMismatch {
					expected: "Bool".to_owned(),
					got: self.model.type_name(&condition.ty),
				},
				while_loop,
				while_loop.span,
			));
		}

		self.conditional_depth += 1;
		let body = self.elaborate_block(&while_loop.body);
		self.conditional_depth -= 1;
		let body = body?;

		let mut runtime_depends = condition.runtime_depends.clone();
		runtime_depends.extend(&body.runtime_depends);

		// A loop whose only dependencies are its own local counters is a compile-time loop: run
		// it now, and the counters' final values become statically known again.
		let current_owner = self.model.scopes.current_owner();
		let compile_time_loop = !runtime_depends.is_empty()
			&& runtime_depends.iter().all(|dependency| match dependency {
				Dependency::Variable(variable_id) => {
					let variable = &self.model.variables[variable_id.0];
					variable.owner == current_owner
						&& !variable.readonly
						&& variable.runtime_depends.is_subset(&runtime_depends)
				},
				Dependency::Builtin(_) => false,
			});

		if compile_time_loop {
			return self.fold_loop(condition, body, &runtime_depends, &marked, while_loop.span);
		}

		Ok(Expression {
			kind: ExpressionKind::While {
				condition: Box::new(condition),
				body,
			},
			ty: Type::Unit,
			runtime_depends,
			span: while_loop.span,
		})
	}

	/// Runs a compile-time loop at build time and replaces it with assignments of the final
	/// values, so the runtime state after the (now absent) loop matches the build-time state.
	/// Only variables declared outside the loop get a final-value assignment; the loop's own
	/// locals disappear together with it.
	fn fold_loop(
		&mut self,
		condition: Expression,
		body: Block,
		loop_variables: &DependencySet,
		outer_variables: &[VariableId],
		span: Span,
	) -> Result<Expression, Error> {
		// The outer counters need build-time values to start from: their definitions bound them
		// in the store before the loop marked them.
		for variable_id in loop_variables.variables().filter(|id| outer_variables.contains(id)) {
			if self.frames.root_value(variable_id).is_none() {
				// A counter without a statically known starting value; the loop stays at runtime.
				return Ok(Expression {
					kind: ExpressionKind::While {
						condition: Box::new(condition),
						body,
					},
					ty: Type::Unit,
					runtime_depends: loop_variables.clone(),
					span,
				});
			}
		}

		let loop_expression = Expression {
			kind: ExpressionKind::While {
				condition: Box::new(condition),
				body,
			},
			ty: Type::Unit,
			runtime_depends: DependencySet::new(),
			span,
		};
		self.fold_value(&loop_expression)?;

		let mut statements = Vec::new();
		for variable_id in loop_variables.variables().collect::<Vec<_>>() {
			self.model.variables[variable_id.0].runtime_depends.clear();
			if !outer_variables.contains(&variable_id) {
				continue;
			}
			let Some(value) = self.frames.root_value(variable_id) else {
				continue;
			};
			let ty = self.model.variables[variable_id.0].ty.clone();
			statements.push(Statement::Expression(Expression {
				kind: ExpressionKind::Assignment {
					destination: variable_id,
					value: Box::new(Expression {
						ty,
						kind: ExpressionKind::Constant(value),
						runtime_depends: DependencySet::new(),
						span,
					}),
				},
				ty: Type::Unit,
				runtime_depends: DependencySet::from_iter([Dependency::Variable(variable_id)]),
				span,
			}));
		}

		Ok(Expression {
			kind: ExpressionKind::Block(Block {
				scope: self.model.scopes.current(),
				statements,
				ty: Type::Unit,
				runtime_depends: loop_variables.clone(),
				span,
			}),
			ty: Type::Unit,
			runtime_depends: loop_variables.clone(),
			span,
		})
	}

	fn elaborate_enum(&mut self, enumeration: &ast::Enum, name: Option<String>) -> Expression {
		let enum_id = EnumId(self.model.enums.len());
		self.model.enums.push(EnumType {
			name,
			values: enumeration.values.clone(),
		});
		Expression {
			kind: ExpressionKind::Constant(Value::Type(Type::Enum(enum_id))),
			ty: Type::Meta,
			runtime_depends: DependencySet::new(),
			span: enumeration.span,
		}
	}

	// ------------------------------------------------------------------------------------------
	// Functions
	// ------------------------------------------------------------------------------------------

	fn elaborate_function(
		&mut self,
		function: &ast::Function,
		name: Option<String>,
		node: &dyn std::fmt::Display,
	) -> Result<FunctionId, Error> {
		let defining_owner = self.model.scopes.current_owner();
		let defining_scope = self.model.scopes.current();

		let mut parameter_types = Vec::new();
		for argument in &function.arguments {
			parameter_types.push(self.resolve_type(&argument.type_expression)?);
		}
		let return_type = match &function.return_type {
			Some(return_type) => self.resolve_type(return_type)?,
			None => Type::Unit,
		};

		let function_id = FunctionId(self.model.functions.len());
		self.model.functions.push(Function {
			name: name.clone(),
			parameters: Vec::new(),
			signature: FunctionType {
				parameters: parameter_types.clone(),
				return_type: return_type.clone(),
			},
			body: None,
			scope: defining_scope,
			owner: defining_owner,
			defining_owner,
			call_runtime_depends: DependencySet::new(),
			span: function.span,
		});

		// Named functions are visible inside their own bodies.
		if let Some(name) = &name {
			self.model
				.scopes
				.add_term(defining_scope, name, Term::Function(function_id))
				.map_err(|name| self.error(ModelErrorKind::AlreadyDefined { name }, node, function.span))?;
		}

		// The body is a fresh runtime boundary, and elaborates as straight-line code regardless
		// of where the literal appeared.
		let saved_depth = std::mem::replace(&mut self.conditional_depth, 0);
		let scope = self.model.scopes.enter_function();
		let owner = self.model.scopes.current_owner();

		let mut parameters = Vec::new();
		for (argument, parameter_type) in function.arguments.iter().zip(&parameter_types) {
			let variable_id = VariableId(self.model.variables.len());
			self.model.variables.push(Variable {
				name: argument.name.clone(),
				readonly: true,
				ty: parameter_type.clone(),
				owner,
				// A parameter is the original source of runtime-ness: its value only exists once
				// the call happens.
				runtime_depends: DependencySet::from_iter([Dependency::Variable(variable_id)]),
				span: argument.span,
			});
			self.model
				.scopes
				.add_term(scope, &argument.name, Term::Variable(variable_id))
				.map_err(|name| self.error(ModelErrorKind::AlreadyDefined { name }, node, argument.span))?;
			parameters.push(variable_id);
		}

		let body = self.elaborate_statements(&function.body.statements, scope, function.body.span);
		self.model.scopes.exit();
		self.conditional_depth = saved_depth;
		let body = body?;

		// A body that never returns (ends in `abort`) satisfies any declared return type.
		if !return_type.assignable_from(&body.ty) && body.ty != Type::Void {
			return Err(self.error(
				ModelErrorKind::TypeMismatch {
					expected: self.model.type_name(&return_type),
					got: self.model.type_name(&body.ty),
				},
				node,
				function.span,
			));
		}

		let mut call_runtime_depends = body.runtime_depends.clone();
		call_runtime_depends.remove_variables(|variable_id| self.model.variables[variable_id.0].owner == owner);

		let entry = &mut self.model.functions[function_id.0];
		entry.parameters = parameters;
		entry.body = Some(body);
		entry.scope = scope;
		entry.owner = owner;
		entry.call_runtime_depends = call_runtime_depends;

		Ok(function_id)
	}

	// ------------------------------------------------------------------------------------------
	// Types, folding, and build-time values
	// ------------------------------------------------------------------------------------------

	/// Evaluates a type position: the expression must be free of runtime dependencies and its
	/// value must be a type.
	fn resolve_type(&mut self, expression: &ast::Expression) -> Result<Type, Error> {
		let elaborated = self.elaborate_expression(expression)?;
		if !elaborated.runtime_depends.is_empty() {
			return Err(self.error(ModelErrorKind::NotCompileTime, expression, expression.span()));
		}
		let value = match self.known_value(&elaborated) {
			Some(value) => value,
			None => self.fold_value(&elaborated)?,
		};
		match value {
			Value::Type(ty) => Ok(ty),
			other => Err(self.error(
				ModelErrorKind::TypeMismatch {
					expected: "Type".to_owned(),
					got: self.model.type_name(&other.type_of(&self.model)),
				},
				expression,
				expression.span(),
			)),
		}
	}

	/// The fold step: an expression with no runtime dependencies is executed against the
	/// build-time store and replaced by its value. Kinds that are already values (or must stay
	/// by-reference) pass through unchanged.
	fn maybe_fold(&mut self, expression: Expression) -> Result<Expression, Error> {
		if !expression.runtime_depends.is_empty() {
			return Ok(expression);
		}
		match &expression.kind {
			ExpressionKind::Constant(_)
			| ExpressionKind::Reference(_)
			| ExpressionKind::FunctionReference(_)
			| ExpressionKind::Precompiled { .. }
			| ExpressionKind::Assignment { .. } => return Ok(expression),
			_ => {},
		}

		let value = self.fold_value(&expression)?;
		if !value.is_portable() {
			return Ok(expression);
		}

		Ok(Expression {
			ty: expression.ty.clone(),
			runtime_depends: DependencySet::new(),
			span: expression.span,
			kind: ExpressionKind::Precompiled {
				original: Box::new(expression),
				value,
			},
		})
	}

	/// Runs the interpreter over an expression against the build-time store. Failures become
	/// compile-time inliner errors.
	fn fold_value(&mut self, expression: &Expression) -> Result<Value, Error> {
		let mut sink = std::io::sink();
		let mut machine = Machine::new(&self.model, &mut self.frames, &mut sink);
		machine.evaluate(0, expression).map_err(|cause| {
			Error::Inliner(InlinerError {
				cause,
				span: expression.span,
			})
		})
	}

	/// The statically known value of an elaborated expression, when it has one without further
	/// evaluation: folded results, constants, function references, and reads of variables whose
	/// values sit in the build-time store.
	fn known_value(&self, expression: &Expression) -> Option<Value> {
		match &expression.kind {
			ExpressionKind::Precompiled { value, .. } => Some(value.clone()),
			ExpressionKind::Constant(value) => Some(value.clone()),
			ExpressionKind::FunctionReference(function) => Some(Value::Function {
				function: *function,
				environment: 0,
			}),
			ExpressionKind::Reference(variable) if expression.runtime_depends.is_empty() => {
				self.frames.root_value(*variable)
			},
			_ => None,
		}
	}
}

/// The type and value of a literal.
fn elaborate_literal(value: &ast::Value) -> Expression {
	let (model_value, ty) = match &value.value {
		ast::LiteralValue::Integer(integer) => (Value::Integer(*integer), Type::Int),
		ast::LiteralValue::Float(float) => (Value::Float(*float), Type::Float),
	};
	Expression {
		kind: ExpressionKind::Constant(model_value),
		ty,
		runtime_depends: DependencySet::new(),
		span: value.span,
	}
}

/// Collects the destination names of every assignment in a statement list, recursing into nested
/// blocks, branches, loops, and function literals. Used to pre-mark loop counters before a
/// `while` is elaborated.
fn collect_assignment_targets(statements: &[ast::Statement], targets: &mut Vec<String>) {
	for statement in statements {
		match statement {
			ast::Statement::Expression(expression) => collect_expression_targets(expression, targets),
			ast::Statement::Var(var) => {
				if let Some(value) = &var.value {
					collect_expression_targets(value, targets);
				}
			},
			ast::Statement::TypeAlias(_) => {},
		}
	}
}

fn collect_expression_targets(expression: &ast::Expression, targets: &mut Vec<String>) {
	match expression {
		ast::Expression::Assignment(assignment) => {
			targets.push(assignment.destination.clone());
			collect_expression_targets(&assignment.value, targets);
		},
		ast::Expression::Call(call) => {
			collect_expression_targets(&call.callee, targets);
			for argument in &call.arguments {
				collect_expression_targets(argument, targets);
			}
		},
		ast::Expression::AttributeAccess(access) => collect_expression_targets(&access.object, targets),
		ast::Expression::If(if_expression) => {
			collect_expression_targets(&if_expression.condition, targets);
			collect_assignment_targets(&if_expression.on_true.statements, targets);
			if let Some(on_false) = &if_expression.on_false {
				collect_assignment_targets(&on_false.statements, targets);
			}
		},
		ast::Expression::While(while_loop) => {
			collect_expression_targets(&while_loop.condition, targets);
			collect_assignment_targets(&while_loop.body.statements, targets);
		},
		ast::Expression::Block(block) => collect_assignment_targets(&block.statements, targets),
		ast::Expression::Function(function) => collect_assignment_targets(&function.body.statements, targets),
		ast::Expression::Term(_) | ast::Expression::Value(_) | ast::Expression::Enum(_) | ast::Expression::Tuple(_) => {},
	}
}
