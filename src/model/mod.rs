//! The elaborated semantic model: the typed, name-resolved, partially evaluated representation
//! that sits between the syntax tree and the two back-ends. Model nodes are tagged unions stored
//! behind arena indices; scopes, variables, functions and enumerations all live in flat vectors
//! on `Model` and refer to each other by id.

use crate::{
	builtins,
	lexer::Span,
	model::{
		depends::DependencySet,
		scope::{ScopeArena, Term},
		types::{EnumType, FunctionType, Type},
	},
};

/// Runtime-dependency sets.
pub mod depends;
/// The elaborator that builds a `Model` from a syntax tree.
pub mod elaborator;
/// The arena-allocated scope tree.
pub mod scope;
/// The type system.
pub mod types;

pub use elaborator::elaborate;

/// The id of a variable in `Model::variables`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(pub(crate) usize);

/// The id of a function in `Model::functions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub(crate) usize);

/// The id of an enumeration type in `Model::enums`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnumId(pub(crate) usize);

/// The id of a scope in the scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub(crate) usize);

/// The id of a runtime boundary: the program is owner 0, and every function body gets a fresh
/// owner. Two variables share an owner exactly when they live in the same runtime frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(pub(crate) usize);

/// A materialised constant. Values are created at build time by the partial evaluator and at run
/// time by the interpreter; both use this one representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Unit,
	Bool(bool),
	Integer(i64),
	Float(f64),
	/// One variant of an enumeration type.
	Variant { enum_id: EnumId, index: usize },
	/// A type as a first-class compile-time value. These never survive to runtime.
	Type(Type),
	/// A function, together with the frame it closes over. Environment 0 is the program's root
	/// frame; values with a deeper environment are only meaningful inside the evaluation that
	/// created them.
	Function { function: FunctionId, environment: usize },
	/// A built-in function, identified by its registry name.
	Builtin(&'static str),
}

impl Value {
	/// The static type of this value.
	#[must_use]
	pub fn type_of(&self, model: &Model) -> Type {
		match self {
			Self::Unit => Type::Unit,
			Self::Bool(_) => Type::Bool,
			Self::Integer(_) => Type::Int,
			Self::Float(_) => Type::Float,
			Self::Variant { enum_id, .. } => Type::Enum(*enum_id),
			Self::Type(_) => Type::Meta,
			Self::Function { function, .. } => Type::Function(Box::new(model.functions[function.0].signature.clone())),
			Self::Builtin(name) => {
				let builtin = builtins::lookup(name).expect("built-in values are only created from the registry");
				Type::Function(Box::new(FunctionType {
					parameters: builtin.parameters.to_vec(),
					return_type: builtin.return_type.clone(),
				}))
			},
		}
	}

	/// Whether this value can be embedded in the model as a fold result. Function values that
	/// close over a build-time call frame cannot: the frame does not exist at runtime.
	#[must_use]
	pub fn is_portable(&self) -> bool {
		!matches!(self, Self::Function { environment, .. } if *environment != 0)
	}
}

/// A `let`/`var` binding or a function parameter. The initializer lives on the `Definition`
/// statement, not here; the variable itself only carries what references need to know.
#[derive(Debug, Clone)]
pub struct Variable {
	pub name: String,
	pub readonly: bool,
	pub ty: Type,
	/// The runtime boundary the variable belongs to.
	pub owner: OwnerId,
	/// The runtime values this variable's own value depends on. Empty means the variable's value
	/// is known at build time. Function parameters depend on themselves: they are the original
	/// source of runtime-ness.
	pub runtime_depends: DependencySet,
	pub span: Span,
}

/// A function: a literal or a named definition. The body is `None` only while the function is
/// being elaborated, which is observable exactly when a zero-dependency call to a function is
/// folded from inside that same function's body.
#[derive(Debug, Clone)]
pub struct Function {
	pub name: Option<String>,
	pub parameters: Vec<VariableId>,
	pub signature: FunctionType,
	pub body: Option<Block>,
	/// The scope of the function's body.
	pub scope: ScopeId,
	/// The runtime boundary of the function's body.
	pub owner: OwnerId,
	/// The runtime boundary the function was defined in. Calls bind their frame under the frame
	/// of this owner, which is what makes lexical scoping work at run time.
	pub defining_owner: OwnerId,
	/// What a call to this function depends on beyond its arguments: the body's dependencies
	/// minus everything the function itself owns.
	pub call_runtime_depends: DependencySet,
	pub span: Span,
}

/// A lexical block: a scope, its statements, and the type of its result. The result of a block is
/// the value of its final statement when that statement is an expression, and `Unit` otherwise.
#[derive(Debug, Clone)]
pub struct Block {
	pub scope: ScopeId,
	pub statements: Vec<Statement>,
	pub ty: Type,
	pub runtime_depends: DependencySet,
	pub span: Span,
}

/// One statement in a block.
#[derive(Debug, Clone)]
pub enum Statement {
	Definition(Definition),
	Expression(Expression),
}

/// A variable definition statement. Compile-time definitions (functions, types, enumerations)
/// register scope terms instead and produce no statement at all.
#[derive(Debug, Clone)]
pub struct Definition {
	pub variable: VariableId,
	pub initializer: Option<Expression>,
	pub span: Span,
}

/// An elaborated expression: a kind, a type, and the set of runtime values it depends on.
#[derive(Debug, Clone)]
pub struct Expression {
	pub kind: ExpressionKind,
	pub ty: Type,
	pub runtime_depends: DependencySet,
	pub span: Span,
}

impl Expression {
	/// The folded value of this expression, when partial evaluation reduced it to one.
	#[must_use]
	pub fn precompiled_value(&self) -> Option<&Value> {
		match &self.kind {
			ExpressionKind::Precompiled { value, .. } => Some(value),
			_ => None,
		}
	}
}

/// The kinds of elaborated expressions.
#[derive(Debug, Clone)]
pub enum ExpressionKind {
	/// A literal or a term that resolved to a compile-time constant.
	Constant(Value),
	/// A read of a variable.
	Reference(VariableId),
	/// A function literal or a reference to a named function.
	FunctionReference(FunctionId),
	Call {
		callee: Box<Expression>,
		arguments: Vec<Expression>,
	},
	Assignment {
		destination: VariableId,
		value: Box<Expression>,
	},
	If {
		condition: Box<Expression>,
		on_true: Block,
		on_false: Option<Block>,
	},
	While {
		condition: Box<Expression>,
		body: Block,
	},
	Block(Block),
	/// An expression that partial evaluation already reduced to a value. The original expression
	/// is kept for traceability; the back-ends only look at the value.
	Precompiled {
		original: Box<Expression>,
		value: Value,
	},
}

/// The elaborated program: every arena plus the top-level block.
#[derive(Debug)]
pub struct Model {
	pub scopes: ScopeArena,
	pub variables: Vec<Variable>,
	pub functions: Vec<Function>,
	pub enums: Vec<EnumType>,
	pub program: Block,
}

impl Model {
	#[must_use]
	pub fn variable(&self, id: VariableId) -> &Variable {
		&self.variables[id.0]
	}

	#[must_use]
	pub fn function(&self, id: FunctionId) -> &Function {
		&self.functions[id.0]
	}

	#[must_use]
	pub fn enumeration(&self, id: EnumId) -> &EnumType {
		&self.enums[id.0]
	}

	/// Renders a type's name against this model's enumeration arena.
	#[must_use]
	pub fn type_name(&self, ty: &Type) -> String {
		ty.name(&self.enums)
	}

	/// Resolves the user's `main` function in the program scope.
	#[must_use]
	pub fn main_function(&self) -> Option<FunctionId> {
		match self.scopes.resolve_from(self.program.scope, "main") {
			Some(Term::Function(function)) => Some(*function),
			_ => None,
		}
	}
}
