use epl::errors::{Error, InterpreterError, ModelErrorKind};
use epl::interpreter::{Frames, Machine};
use epl::model::{scope::Term, types::Type, ExpressionKind, Model, Statement, Value};
use unindent::unindent;

fn model_of(source: &str) -> Model {
	epl::build_model(source).expect("program should elaborate")
}

fn error_of(source: &str) -> Error {
	epl::build_model(source).expect_err("program should be rejected")
}

/// The kind of a semantic error, panicking on any other error family.
fn model_error_kind(source: &str) -> ModelErrorKind {
	match error_of(source) {
		Error::Model(error) => error.kind,
		other => panic!("expected a model error, got: {other}"),
	}
}

/// The statements of the first defined function's body.
fn function_body(model: &Model, name: &str) -> Vec<Statement> {
	let Some(Term::Function(function)) = model.scopes.resolve_from(model.program.scope, name) else {
		panic!("no function named {name}");
	};
	model.function(*function).body.as_ref().expect("body should be elaborated").statements.clone()
}

mod folding {
	use super::*;

	#[test]
	fn constant_calls_fold_to_their_values() {
		let model = model_of("fn main() -> Int { add(2, 3) }");
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[0] else {
			panic!("expected an expression");
		};
		assert_eq!(expression.precompiled_value(), Some(&Value::Integer(5)));
	}

	#[test]
	fn folding_reaches_nested_subexpressions() {
		// The outer call stays (it reads a parameter), but the constant inner call is reduced.
		let model = model_of("fn bump(n: Int) -> Int { add(n, mul(2, 3)) }");
		let body = function_body(&model, "bump");
		let Statement::Expression(outer) = &body[0] else {
			panic!("expected an expression");
		};
		let ExpressionKind::Call { arguments, .. } = &outer.kind else {
			panic!("outer call should remain a call, got: {:?}", outer.kind);
		};
		assert_eq!(arguments[1].precompiled_value(), Some(&Value::Integer(6)));
	}

	#[test]
	fn pure_recursion_folds_at_the_call_site() {
		let model = model_of(&unindent(
			"
			fn f(n: Int) -> Int {
				if ieq(n, 0) { 1 } else { mul(n, f(sub(n, 1))) }
			}
			fn main() -> Int { f(5) }
			",
		));
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[0] else {
			panic!("expected an expression");
		};
		assert_eq!(expression.precompiled_value(), Some(&Value::Integer(120)));
	}

	#[test]
	fn readonly_bindings_are_transparent() {
		let model = model_of("let x = 7 fn main() -> Int { add(x, 1) }");
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[0] else {
			panic!("expected an expression");
		};
		assert_eq!(expression.precompiled_value(), Some(&Value::Integer(8)));
	}

	#[test]
	fn impure_builtins_never_fold() {
		let model = model_of("fn main() { iprint(42) }");
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[0] else {
			panic!("expected an expression");
		};
		assert!(expression.precompiled_value().is_none());
		assert!(!expression.runtime_depends.is_empty());
	}

	#[test]
	fn folded_values_match_reinterpretation() {
		// A folded expression and its original must agree: interpreting the original yields the
		// precompiled value.
		let model = model_of("fn main() -> Int { add(add(2, 3), mul(4, 5)) }");
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[0] else {
			panic!("expected an expression");
		};
		let ExpressionKind::Precompiled { original, value } = &expression.kind else {
			panic!("expected a folded expression");
		};

		let root_owner = model.scopes.get(model.program.scope).owner();
		let mut frames = Frames::new(root_owner);
		let mut sink = std::io::sink();
		let mut machine = Machine::new(&model, &mut frames, &mut sink);
		let reinterpreted = machine.evaluate(0, original).expect("original should evaluate");
		assert_eq!(&reinterpreted, value);
	}

	#[test]
	fn compile_time_faults_surface_as_inliner_errors() {
		let error = error_of("let x = div(1, 0)");
		let Error::Inliner(inliner) = error else {
			panic!("expected an inliner error, got: {error}");
		};
		assert_eq!(inliner.cause, InterpreterError::DivisionByZero);
		assert!(error_of("let x = div(1, 0)").is_compile_time());
	}
}

mod runtime_depends {
	use super::*;

	#[test]
	fn mutable_reads_across_functions_are_runtime() {
		let model = model_of("var y: Int = 0 fn main() -> Int { y = 1 y }");
		let body = function_body(&model, "main");
		let Statement::Expression(read) = &body[1] else {
			panic!("expected an expression");
		};
		assert!(matches!(read.kind, ExpressionKind::Reference(_)));
		assert!(!read.runtime_depends.is_empty());
	}

	#[test]
	fn same_owner_and_readonly_reads_are_not_runtime() {
		let model = model_of("let x = 7 fn main() -> Int { x }");
		let body = function_body(&model, "main");
		let Statement::Expression(read) = &body[0] else {
			panic!("expected an expression");
		};
		assert!(matches!(read.kind, ExpressionKind::Reference(_)));
		assert!(read.runtime_depends.is_empty());
	}

	#[test]
	fn calls_inherit_the_callee_dependency_set() {
		// `report` prints, so calling it can never fold, even with constant arguments.
		let model = model_of(&unindent(
			"
			fn report(n: Int) { iprint(n) }
			fn main() { report(3) }
			",
		));
		let body = function_body(&model, "main");
		let Statement::Expression(call) = &body[0] else {
			panic!("expected an expression");
		};
		assert!(call.precompiled_value().is_none());
		assert!(!call.runtime_depends.is_empty());
	}

	#[test]
	fn name_resolution_is_stable() {
		let model = model_of("let x = 1 fn main() -> Int { x }");
		let first = model.scopes.resolve_from(model.program.scope, "x");
		let second = model.scopes.resolve_from(model.program.scope, "x");
		let (Some(Term::Variable(first)), Some(Term::Variable(second))) = (first, second) else {
			panic!("x should resolve to a variable");
		};
		assert_eq!(first, second);
	}
}

mod scopes {
	use super::*;

	#[test]
	fn redefinition_in_the_same_scope_is_rejected() {
		assert!(matches!(
			model_error_kind("let x = 1 let x = 2"),
			ModelErrorKind::AlreadyDefined { .. }
		));
	}

	#[test]
	fn shadowing_across_scopes_is_allowed() {
		// `not` is a built-in, but definitions in inner scopes may shadow the built-in context.
		let model = model_of("let not = 5 fn main() -> Int { add(not, 2) }");
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[0] else {
			panic!("expected an expression");
		};
		assert_eq!(expression.precompiled_value(), Some(&Value::Integer(7)));
	}

	#[test]
	fn undefined_names_are_rejected() {
		assert!(matches!(
			model_error_kind("fn main() -> Int { nope }"),
			ModelErrorKind::Undefined { .. }
		));
	}

	#[test]
	fn inner_scopes_shadow_outer_bindings() {
		let model = model_of("let x = 1 fn main() -> Int { let x = 2 add(x, 0) }");
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[1] else {
			panic!("expected an expression");
		};
		assert_eq!(expression.precompiled_value(), Some(&Value::Integer(2)));
	}
}

mod type_checking {
	use super::*;

	#[test]
	fn annotation_mismatches_report_both_types() {
		let error = error_of("let x: Bool = add(1, 2)");
		let Error::Model(model_error) = &error else {
			panic!("expected a model error, got: {error}");
		};
		assert_eq!(
			model_error.kind,
			ModelErrorKind::TypeMismatch {
				expected: "Bool".to_owned(),
				got: "Int".to_owned(),
			}
		);
		// The message and the source position both surface in the formatted error.
		let formatted = error.to_string();
		assert!(formatted.contains("type mismatch Bool vs Int"), "got: {formatted}");
		assert!(formatted.contains("line 1"), "got: {formatted}");
	}

	#[test]
	fn argument_types_are_checked() {
		assert!(matches!(
			model_error_kind("fn main() -> Int { add(1, true) }"),
			ModelErrorKind::TypeMismatch { .. }
		));
	}

	#[test]
	fn argument_counts_are_checked() {
		assert!(matches!(
			model_error_kind("fn main() -> Int { add(1) }"),
			ModelErrorKind::ArgumentCountMismatch { expected: 2, got: 1 }
		));
	}

	#[test]
	fn only_functions_are_callable() {
		assert!(matches!(model_error_kind("fn main() -> Int { 5(2) }"), ModelErrorKind::NotCallable));
	}

	#[test]
	fn assignment_to_immutable_bindings_is_rejected() {
		let error = error_of("let x = 1 fn main() { x = 2 }");
		let Error::Model(model_error) = &error else {
			panic!("expected a model error, got: {error}");
		};
		assert!(model_error.to_string().contains("immutable"), "got: {model_error}");
	}

	#[test]
	fn condition_must_be_boolean() {
		assert!(matches!(
			model_error_kind("fn main() { if 1 { } }"),
			ModelErrorKind::TypeMismatch { .. }
		));
	}

	#[test]
	fn declared_return_types_are_checked() {
		assert!(matches!(
			model_error_kind("fn f() -> Bool { 1 }"),
			ModelErrorKind::TypeMismatch { .. }
		));
	}

	#[test]
	fn if_unifies_equal_branch_types_and_defaults_to_unit() {
		let model = model_of("fn f(c: Bool) -> Int { if c { 1 } else { 2 } }");
		let body = function_body(&model, "f");
		let Statement::Expression(unified) = &body[0] else {
			panic!("expected an expression");
		};
		assert_eq!(unified.ty, Type::Int);

		let model = model_of("fn g(c: Bool) { if c { 1 } }");
		let body = function_body(&model, "g");
		let Statement::Expression(unit) = &body[0] else {
			panic!("expected an expression");
		};
		assert_eq!(unit.ty, Type::Unit);
	}

	#[test]
	fn empty_blocks_have_unit_type_and_no_dependencies() {
		let model = model_of("fn main() { let u = {} }");
		let body = function_body(&model, "main");
		let Statement::Definition(definition) = &body[0] else {
			panic!("expected a definition");
		};
		let initializer = definition.initializer.as_ref().expect("u has an initializer");
		assert_eq!(initializer.ty, Type::Unit);
		assert!(initializer.runtime_depends.is_empty());
	}
}

mod enums_and_types {
	use super::*;

	#[test]
	fn enum_variants_are_attributes_of_the_type() {
		let model = model_of("enum Color { red, green, blue } let c = Color.green");
		let Statement::Definition(definition) = &model.program.statements[0] else {
			panic!("expected a definition");
		};
		let initializer = definition.initializer.as_ref().expect("c has an initializer");
		assert!(matches!(
			initializer.kind,
			ExpressionKind::Constant(Value::Variant { index: 1, .. })
		));
	}

	#[test]
	fn unknown_variants_are_rejected() {
		assert!(matches!(
			model_error_kind("enum Color { red } let c = Color.purple"),
			ModelErrorKind::NoSuchAttribute { .. }
		));
	}

	#[test]
	fn type_aliases_resolve_to_their_targets() {
		let model = model_of("type MyInt = Int let v: MyInt = 3 fn main() -> Int { v }");
		let Statement::Definition(definition) = &model.program.statements[0] else {
			panic!("expected a definition");
		};
		assert_eq!(model.variable(definition.variable).ty, Type::Int);
	}

	#[test]
	fn type_positions_must_be_compile_time() {
		assert!(matches!(
			model_error_kind("var t = 0 fn main() { let x: t = 1 }"),
			ModelErrorKind::NotCompileTime
		));
	}

	#[test]
	fn tuple_types_are_reserved() {
		assert!(matches!(
			model_error_kind("fn f(pair: (Int, Int)) { }"),
			ModelErrorKind::KindMismatch { .. }
		));
	}
}

mod compile_time_loops {
	use super::*;

	#[test]
	fn loops_over_local_counters_fold() {
		let model = model_of(&unindent(
			"
			fn triangle() -> Int {
				var i = 0
				var total = 0
				while lt(i, 5) {
					total = add(total, i)
					i = add(i, 1)
				}
				total
			}
			fn main() -> Int { triangle() }
			",
		));
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[0] else {
			panic!("expected an expression");
		};
		assert_eq!(expression.precompiled_value(), Some(&Value::Integer(10)));
	}

	#[test]
	fn loops_touching_parameters_stay_at_runtime_but_calls_still_fold() {
		let model = model_of(&unindent(
			"
			fn total(n: Int) -> Int {
				var i = n
				var sum = 0
				while gt(i, 0) {
					sum = add(sum, i)
					i = sub(i, 1)
				}
				sum
			}
			fn main() -> Int { total(4) }
			",
		));
		// The loop itself cannot fold (it reads the parameter), but a call with a constant
		// argument can.
		let body = function_body(&model, "main");
		let Statement::Expression(expression) = &body[0] else {
			panic!("expected an expression");
		};
		assert_eq!(expression.precompiled_value(), Some(&Value::Integer(10)));
	}

	#[test]
	fn loops_over_globals_stay_at_runtime() {
		let model = model_of(&unindent(
			"
			var i: Int = 0
			fn main() -> Int {
				i = 3
				while gt(i, 0) {
					i = sub(i, 1)
				}
				i
			}
			",
		));
		let body = function_body(&model, "main");
		let Statement::Expression(while_statement) = &body[1] else {
			panic!("expected an expression");
		};
		assert!(matches!(while_statement.kind, ExpressionKind::While { .. }));
		assert!(!while_statement.runtime_depends.is_empty());
	}
}
