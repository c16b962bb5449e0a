//! The abstract syntax tree produced by the parser. Nodes are plain data: elaboration into the
//! typed model happens separately, and the nodes themselves stay immutable after parsing.
//!
//! Every node implements `Display` by printing itself back as EPL source. This is what semantic
//! errors embed when reporting the offending node, and it round-trips: parsing the printed form
//! yields an equivalent tree.

use std::fmt;

use crate::lexer::Span;

/// Indents every line of the given text by one tab. Used by the block and program printers.
fn indent(text: &str) -> String {
	text.lines().map(|line| format!("\t{line}")).collect::<Vec<_>>().join("\n")
}

/// An entire source file: a sequence of statements in one top-level scope.
#[derive(Debug, Clone)]
pub struct Program {
	pub statements: Vec<Statement>,
	pub span: Span,
}

impl fmt::Display for Program {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		let statements = self.statements.iter().map(ToString::to_string).collect::<Vec<_>>();
		write!(formatter, "{}", statements.join("\n"))
	}
}

/// One statement: either a definition that registers a name, or an expression evaluated for its
/// value or effect.
#[derive(Debug, Clone)]
pub enum Statement {
	Var(Var),
	TypeAlias(TypeAlias),
	Expression(Expression),
}

impl Statement {
	#[must_use]
	pub fn span(&self) -> Span {
		match self {
			Self::Var(var) => var.span,
			Self::TypeAlias(alias) => alias.span,
			Self::Expression(expression) => expression.span(),
		}
	}
}

impl fmt::Display for Statement {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Var(var) => fmt::Display::fmt(var, formatter),
			Self::TypeAlias(alias) => fmt::Display::fmt(alias, formatter),
			Self::Expression(expression) => fmt::Display::fmt(expression, formatter),
		}
	}
}

/// A `let` or `var` binding. Named function definitions (`fn name(..) { .. }`) and named
/// enumerations (`enum Name { .. }`) parse into this same node with the literal as the value, so
/// the rest of the compiler only ever sees one kind of definition.
#[derive(Debug, Clone)]
pub struct Var {
	pub name: String,
	pub type_annotation: Option<Expression>,
	pub readonly: bool,
	pub value: Option<Expression>,
	pub span: Span,
}

impl fmt::Display for Var {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		let keyword = if self.readonly { "let" } else { "var" };
		write!(formatter, "{keyword} {}", self.name)?;
		if let Some(annotation) = &self.type_annotation {
			write!(formatter, ": {annotation}")?;
		}
		if let Some(value) = &self.value {
			write!(formatter, " = {value}")?;
		}
		Ok(())
	}
}

/// A `type T = U` alias definition.
#[derive(Debug, Clone)]
pub struct TypeAlias {
	pub name: String,
	pub target: Expression,
	pub span: Span,
}

impl fmt::Display for TypeAlias {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "type {} = {}", self.name, self.target)
	}
}

/// An expression node.
#[derive(Debug, Clone)]
pub enum Expression {
	Term(Term),
	Value(Value),
	Call(Call),
	AttributeAccess(AttributeAccess),
	Assignment(Assignment),
	If(If),
	While(While),
	Block(Block),
	Function(Function),
	Enum(Enum),
	Tuple(Tuple),
}

impl Expression {
	#[must_use]
	pub fn span(&self) -> Span {
		match self {
			Self::Term(term) => term.span,
			Self::Value(value) => value.span,
			Self::Call(call) => call.span,
			Self::AttributeAccess(access) => access.span,
			Self::Assignment(assignment) => assignment.span,
			Self::If(if_expression) => if_expression.span,
			Self::While(while_loop) => while_loop.span,
			Self::Block(block) => block.span,
			Self::Function(function) => function.span,
			Self::Enum(enumeration) => enumeration.span,
			Self::Tuple(tuple) => tuple.span,
		}
	}
}

impl fmt::Display for Expression {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Term(term) => fmt::Display::fmt(term, formatter),
			Self::Value(value) => fmt::Display::fmt(value, formatter),
			Self::Call(call) => fmt::Display::fmt(call, formatter),
			Self::AttributeAccess(access) => fmt::Display::fmt(access, formatter),
			Self::Assignment(assignment) => fmt::Display::fmt(assignment, formatter),
			Self::If(if_expression) => fmt::Display::fmt(if_expression, formatter),
			Self::While(while_loop) => fmt::Display::fmt(while_loop, formatter),
			Self::Block(block) => fmt::Display::fmt(block, formatter),
			Self::Function(function) => fmt::Display::fmt(function, formatter),
			Self::Enum(enumeration) => fmt::Display::fmt(enumeration, formatter),
			Self::Tuple(tuple) => fmt::Display::fmt(tuple, formatter),
		}
	}
}

/// A use of a name.
#[derive(Debug, Clone)]
pub struct Term {
	pub name: String,
	pub span: Span,
}

impl fmt::Display for Term {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "{}", self.name)
	}
}

/// A literal value together with its literal kind.
#[derive(Debug, Clone)]
pub struct Value {
	pub value: LiteralValue,
	pub span: Span,
}

/// The payload of a literal. The kind doubles as the literal's type name.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
	Integer(i64),
	Float(f64),
}

impl fmt::Display for Value {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.value {
			LiteralValue::Integer(integer) => write!(formatter, "{integer}"),
			LiteralValue::Float(float) => write!(formatter, "{float:?}"),
		}
	}
}

/// A function invocation: `callee(argument, ...)`.
#[derive(Debug, Clone)]
pub struct Call {
	pub callee: Box<Expression>,
	pub arguments: Vec<Expression>,
	pub span: Span,
}

impl fmt::Display for Call {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		let arguments = self.arguments.iter().map(ToString::to_string).collect::<Vec<_>>();
		write!(formatter, "{}({})", self.callee, arguments.join(", "))
	}
}

/// An attribute access: `object.attribute`. Used to reach the variants of an enumeration.
#[derive(Debug, Clone)]
pub struct AttributeAccess {
	pub object: Box<Expression>,
	pub attribute: String,
	pub span: Span,
}

impl fmt::Display for AttributeAccess {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "{}.{}", self.object, self.attribute)
	}
}

/// A mutation of an existing `var` binding. Only valid as a statement.
#[derive(Debug, Clone)]
pub struct Assignment {
	pub destination: String,
	pub value: Box<Expression>,
	pub span: Span,
}

impl fmt::Display for Assignment {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "{} = {}", self.destination, self.value)
	}
}

/// An `if` expression with an optional `else` block.
#[derive(Debug, Clone)]
pub struct If {
	pub condition: Box<Expression>,
	pub on_true: Block,
	pub on_false: Option<Block>,
	pub span: Span,
}

impl fmt::Display for If {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "if {} {}", self.condition, self.on_true)?;
		if let Some(on_false) = &self.on_false {
			write!(formatter, " else {on_false}")?;
		}
		Ok(())
	}
}

/// A `while` loop.
#[derive(Debug, Clone)]
pub struct While {
	pub condition: Box<Expression>,
	pub body: Block,
	pub span: Span,
}

impl fmt::Display for While {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "while {} {}", self.condition, self.body)
	}
}

/// A braced block of statements, itself an expression whose value is the value of its final
/// expression statement.
#[derive(Debug, Clone)]
pub struct Block {
	pub statements: Vec<Statement>,
	pub span: Span,
}

impl fmt::Display for Block {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.statements.is_empty() {
			return write!(formatter, "{{}}");
		}
		let statements = self.statements.iter().map(ToString::to_string).collect::<Vec<_>>();
		write!(formatter, "{{\n{}\n}}", indent(&statements.join("\n")))
	}
}

/// A function literal: `fn(a: T, b: U) -> R { .. }`. Named definitions reuse this node inside a
/// `Var`.
#[derive(Debug, Clone)]
pub struct Function {
	pub arguments: Vec<Argument>,
	pub return_type: Option<Box<Expression>>,
	pub body: Block,
	pub span: Span,
}

impl fmt::Display for Function {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		let arguments = self.arguments.iter().map(ToString::to_string).collect::<Vec<_>>();
		write!(formatter, "fn({})", arguments.join(", "))?;
		if let Some(return_type) = &self.return_type {
			write!(formatter, " -> {return_type}")?;
		}
		write!(formatter, " {}", self.body)
	}
}

/// One declared function parameter.
#[derive(Debug, Clone)]
pub struct Argument {
	pub name: String,
	pub type_expression: Expression,
	pub span: Span,
}

impl fmt::Display for Argument {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(formatter, "{}: {}", self.name, self.type_expression)
	}
}

/// An enumeration literal: `enum { a, b, c }`. Evaluates at compile time to a new type whose
/// variants are reachable as attributes.
#[derive(Debug, Clone)]
pub struct Enum {
	pub values: Vec<String>,
	pub span: Span,
}

impl fmt::Display for Enum {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.values.is_empty() {
			return write!(formatter, "enum {{}}");
		}
		write!(formatter, "enum {{ {} }}", self.values.join(", "))
	}
}

/// A parenthesized tuple of types: `(A, B)`. Recognized by the parser for forward compatibility;
/// the elaborator currently rejects it.
#[derive(Debug, Clone)]
pub struct Tuple {
	pub members: Vec<Expression>,
	pub span: Span,
}

impl fmt::Display for Tuple {
	fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
		let members = self.members.iter().map(ToString::to_string).collect::<Vec<_>>();
		write!(formatter, "({})", members.join(", "))
	}
}
