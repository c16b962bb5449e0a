use crate::model::EnumId;

/// A static type in the elaborated model. Primitives are inline variants; enumerations are
/// arena-allocated and referenced by id, so two enumerations with identical variant lists are
/// still distinct types. Function types compare structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
	/// The empty result type. `Unit` is absorbing on assignment: a value of any type can be
	/// assigned where `Unit` is expected, and is discarded.
	Unit,
	/// The type of expressions that never produce a value, such as a call to `abort`.
	Void,
	Bool,
	Int,
	/// Recognized but without built-in operators.
	Float,
	/// The type of types themselves. Terms like `Int`, aliases, and enumeration literals have
	/// this type; it exists only at compile time and never reaches the interpreter's runtime
	/// frames or the transpiler.
	Meta,
	Enum(EnumId),
	Function(Box<FunctionType>),
}

impl Type {
	/// Whether a value of type `other` can be assigned to a destination of this type. Types must
	/// match exactly, with one exception: `Unit` accepts (and discards) anything.
	#[must_use]
	pub fn assignable_from(&self, other: &Type) -> bool {
		*self == Type::Unit || self == other
	}

	/// Renders this type's name for error messages and diagnostics. Enumeration types need the
	/// enum arena to recover their names.
	#[must_use]
	pub fn name(&self, enums: &[EnumType]) -> String {
		match self {
			Self::Unit => "Unit".to_owned(),
			Self::Void => "Void".to_owned(),
			Self::Bool => "Bool".to_owned(),
			Self::Int => "Int".to_owned(),
			Self::Float => "Float".to_owned(),
			Self::Meta => "Type".to_owned(),
			Self::Enum(enum_id) => {
				let enumeration = &enums[enum_id.0];
				enumeration
					.name
					.clone()
					.unwrap_or_else(|| format!("enum {{ {} }}", enumeration.values.join(", ")))
			},
			Self::Function(function_type) => {
				let parameters = function_type.parameters.iter().map(|parameter| parameter.name(enums)).collect::<Vec<_>>();
				format!("fn({}) -> {}", parameters.join(", "), function_type.return_type.name(enums))
			},
		}
	}
}

/// The structural type of a function: parameter types and a return type. Functions declared
/// without a return type return `Unit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
	pub parameters: Vec<Type>,
	pub return_type: Type,
}

/// An enumeration type created by an `enum { .. }` expression. The name is filled in when the
/// enumeration is bound to one in a definition, and is only used for display and C emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
	pub name: Option<String>,
	pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
	use super::{FunctionType, Type};

	#[test]
	fn unit_absorbs_everything() {
		assert!(Type::Unit.assignable_from(&Type::Int));
		assert!(Type::Unit.assignable_from(&Type::Bool));
		assert!(!Type::Int.assignable_from(&Type::Unit));
		assert!(!Type::Bool.assignable_from(&Type::Int));
	}

	#[test]
	fn function_types_compare_structurally() {
		let first = Type::Function(Box::new(FunctionType {
			parameters: vec![Type::Int, Type::Bool],
			return_type: Type::Int,
		}));
		let second = Type::Function(Box::new(FunctionType {
			parameters: vec![Type::Int, Type::Bool],
			return_type: Type::Int,
		}));
		let third = Type::Function(Box::new(FunctionType {
			parameters: vec![Type::Int],
			return_type: Type::Int,
		}));
		assert_eq!(first, second);
		assert_ne!(first, third);
	}
}
