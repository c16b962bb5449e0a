use epl::lexer::tokenize;
use epl::parser::{ast, parse};
use unindent::unindent;

/// Helper to parse a source string into a program, panicking with the parser's message on
/// failure.
fn program_of(source: &str) -> ast::Program {
	let mut tokens = tokenize(source).expect("source should tokenize");
	parse(&mut tokens).expect("source should parse")
}

mod statements {
	use super::*;

	#[test]
	fn let_and_var_definitions() {
		let program = program_of("let x: Int = 7 var y = 0");
		assert_eq!(program.statements.len(), 2);
		let ast::Statement::Var(x) = &program.statements[0] else {
			panic!("expected a definition");
		};
		assert_eq!(x.name, "x");
		assert!(x.readonly);
		assert!(x.type_annotation.is_some());
		let ast::Statement::Var(y) = &program.statements[1] else {
			panic!("expected a definition");
		};
		assert!(!y.readonly);
		assert!(y.type_annotation.is_none());
	}

	#[test]
	fn named_functions_desugar_to_bindings() {
		let program = program_of("fn main() -> Int { 0 }");
		let ast::Statement::Var(var) = &program.statements[0] else {
			panic!("expected a definition");
		};
		assert_eq!(var.name, "main");
		assert!(var.readonly);
		assert!(matches!(var.value, Some(ast::Expression::Function(_))));
	}

	#[test]
	fn named_enums_desugar_to_bindings() {
		let program = program_of("enum Color { red, green, blue }");
		let ast::Statement::Var(var) = &program.statements[0] else {
			panic!("expected a definition");
		};
		assert_eq!(var.name, "Color");
		let Some(ast::Expression::Enum(enumeration)) = &var.value else {
			panic!("expected an enum literal");
		};
		assert_eq!(enumeration.values, vec!["red", "green", "blue"]);
	}

	#[test]
	fn assignments_are_statements() {
		let program = program_of("var y = 0 fn main() { y = 1 }");
		let ast::Statement::Var(main) = &program.statements[1] else {
			panic!("expected a definition");
		};
		let Some(ast::Expression::Function(function)) = &main.value else {
			panic!("expected a function");
		};
		assert!(matches!(
			function.body.statements[0],
			ast::Statement::Expression(ast::Expression::Assignment(_))
		));
	}

	#[test]
	fn type_aliases() {
		let program = program_of("type MyInt = Int");
		assert!(matches!(program.statements[0], ast::Statement::TypeAlias(_)));
	}
}

mod expressions {
	use super::*;

	/// Digs the body of the first named function out of a program.
	fn body_of(program: &ast::Program) -> &ast::Block {
		let ast::Statement::Var(var) = &program.statements[0] else {
			panic!("expected a definition");
		};
		let Some(ast::Expression::Function(function)) = &var.value else {
			panic!("expected a function");
		};
		&function.body
	}

	#[test]
	fn calls_nest_and_take_argument_lists() {
		let program = program_of("fn main() -> Int { add(mul(2, 3), 4) }");
		let ast::Statement::Expression(ast::Expression::Call(call)) = &body_of(&program).statements[0] else {
			panic!("expected a call");
		};
		assert_eq!(call.arguments.len(), 2);
		assert!(matches!(&call.arguments[0], ast::Expression::Call(_)));
	}

	#[test]
	fn attribute_access_chains_off_any_expression() {
		let program = program_of("enum Color { red } let c = Color.red");
		let ast::Statement::Var(c) = &program.statements[1] else {
			panic!("expected a definition");
		};
		let Some(ast::Expression::AttributeAccess(access)) = &c.value else {
			panic!("expected an attribute access");
		};
		assert_eq!(access.attribute, "red");
	}

	#[test]
	fn if_with_and_without_else() {
		let program = program_of("fn f(c: Bool) { if c { 1 } if c { 1 } else { 2 } }");
		let body = body_of(&program);
		let ast::Statement::Expression(ast::Expression::If(first)) = &body.statements[0] else {
			panic!("expected an if");
		};
		assert!(first.on_false.is_none());
		let ast::Statement::Expression(ast::Expression::If(second)) = &body.statements[1] else {
			panic!("expected an if");
		};
		assert!(second.on_false.is_some());
	}

	#[test]
	fn negative_integer_literals() {
		let program = program_of("let x = -42");
		let ast::Statement::Var(var) = &program.statements[0] else {
			panic!("expected a definition");
		};
		let Some(ast::Expression::Value(value)) = &var.value else {
			panic!("expected a literal");
		};
		assert_eq!(value.value, ast::LiteralValue::Integer(-42));
	}

	#[test]
	fn srcmaps_point_at_source_lines() {
		let program = program_of("let x = 1\nlet y = 2");
		assert_eq!(program.statements[0].span().line, 1);
		assert_eq!(program.statements[1].span().line, 2);
	}
}

mod round_trip {
	use super::*;

	/// Parsing, pretty-printing, and reparsing must converge: the printed form of the reparsed
	/// tree equals the printed form of the original tree.
	fn assert_round_trips(source: &str) {
		let first = program_of(source).to_string();
		let second = program_of(&first).to_string();
		assert_eq!(first, second, "pretty-printed program should reparse to itself");
	}

	#[test]
	fn definitions_round_trip() {
		assert_round_trips(&unindent(
			"
			enum Color { red, green, blue }
			type MyInt = Int
			let x: Int = 7
			var y = 0
			let c = Color.green
			",
		));
	}

	#[test]
	fn control_flow_round_trips() {
		assert_round_trips(&unindent(
			"
			var y: Int = 0
			fn pick(flag: Bool) -> Int {
				if flag { 1 } else { 2 }
			}
			fn main() -> Int {
				y = 3
				while gt(y, 0) {
					y = sub(y, 1)
				}
				pick(true)
			}
			",
		));
	}

	#[test]
	fn function_literals_round_trip() {
		assert_round_trips("var f = fn(a: Int, b: Int) -> Int { add(a, b) }");
	}

	#[test]
	fn empty_blocks_and_enums_round_trip() {
		assert_round_trips("enum Nothing {} fn noop() {} let u = {}");
	}
}

mod errors {
	use super::*;

	#[test]
	fn unclosed_block_is_a_parse_error() {
		let mut tokens = tokenize("fn main() { add(1, 2)").unwrap();
		let error = parse(&mut tokens).unwrap_err();
		assert!(error.message.contains("end of file"), "got: {}", error.message);
	}

	#[test]
	fn stray_punctuation_is_a_parse_error() {
		let mut tokens = tokenize("let x = ,").unwrap();
		assert!(parse(&mut tokens).is_err());
	}

	#[test]
	fn parse_errors_carry_positions() {
		let mut tokens = tokenize("let x = 1\nlet y = =").unwrap();
		let error = parse(&mut tokens).unwrap_err();
		assert_eq!(error.span.line, 2);
	}
}
