use epl::errors::{Error, InterpreterError};
use epl::interpreter::interpret;
use unindent::unindent;

/// Runs a program on the interpreter, returning its exit code and captured output.
fn run(source: &str) -> (i32, String) {
	let model = epl::build_model(source).expect("program should elaborate");
	let mut output = Vec::new();
	let code = interpret(&model, &mut output).expect("program should run");
	(code, String::from_utf8(output).expect("output should be UTF-8"))
}

/// Runs a program expected to fail at runtime, returning the interpreter error.
fn run_error(source: &str) -> InterpreterError {
	let model = epl::build_model(source).expect("program should elaborate");
	let mut output = Vec::new();
	match interpret(&model, &mut output) {
		Ok(code) => panic!("program unexpectedly succeeded with exit code {code}"),
		Err(Error::Interpreter(error)) => error,
		Err(other) => panic!("expected an interpreter error, got: {other}"),
	}
}

mod exit_codes {
	use super::*;

	#[test]
	fn main_returns_its_integer_result() {
		assert_eq!(run("fn main() -> Int { add(2, 3) }").0, 5);
	}

	#[test]
	fn globals_are_visible_from_main() {
		assert_eq!(run("let x = 7 fn main() -> Int { x }").0, 7);
	}

	#[test]
	fn mutable_globals_are_assignable_from_main() {
		assert_eq!(run("var y: Int = 0 fn main() -> Int { y = 1 y }").0, 1);
	}

	#[test]
	fn recursion_computes_factorials() {
		let source = unindent(
			"
			fn f(n: Int) -> Int {
				if ieq(n, 0) { 1 } else { mul(n, f(sub(n, 1))) }
			}
			fn main() -> Int { f(5) }
			",
		);
		assert_eq!(run(&source).0, 120);
	}

	#[test]
	fn unit_main_exits_zero() {
		assert_eq!(run("fn main() { iprint(42) }").0, 0);
	}

	#[test]
	fn top_level_statements_run_before_main() {
		let source = unindent(
			"
			var y: Int = 0
			fn bump() { y = add(y, 10) }
			bump()
			bump()
			fn main() -> Int { y }
			",
		);
		assert_eq!(run(&source).0, 20);
	}
}

mod output {
	use super::*;

	#[test]
	fn iprint_writes_integers_with_newlines() {
		assert_eq!(run("fn main() { iprint(42) }").1, "42\n");
	}

	#[test]
	fn bprint_writes_lowercase_booleans() {
		assert_eq!(run("fn main() { bprint(true) bprint(false) }").1, "true\nfalse\n");
	}

	#[test]
	fn output_follows_execution_order() {
		let source = unindent(
			"
			fn count(n: Int) {
				var i = 1
				while leq(i, n) {
					iprint(i)
					i = add(i, 1)
				}
			}
			fn main() { count(3) }
			",
		);
		assert_eq!(run(&source).1, "1\n2\n3\n");
	}
}

mod control_flow {
	use super::*;

	#[test]
	fn branches_follow_the_condition() {
		let source = "fn pick(flag: Bool) -> Int { if flag { 1 } else { 2 } } fn main() -> Int { pick(false) }";
		assert_eq!(run(source).0, 2);
	}

	#[test]
	fn while_loops_over_runtime_state() {
		let source = unindent(
			"
			var acc: Int = 0
			var i: Int = 0
			fn main() -> Int {
				i = 3
				while gt(i, 0) {
					acc = add(acc, i)
					i = sub(i, 1)
				}
				acc
			}
			",
		);
		assert_eq!(run(&source).0, 6);
	}

	#[test]
	fn compile_time_loops_leave_correct_runtime_state() {
		let source = unindent(
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
		);
		assert_eq!(run(&source).0, 10);
	}

	#[test]
	fn function_values_are_first_class() {
		let source = unindent(
			"
			var double = fn(n: Int) -> Int { mul(n, 2) }
			fn main() -> Int { double(21) }
			",
		);
		assert_eq!(run(&source).0, 42);
	}

	#[test]
	fn enums_flow_through_bindings() {
		let source = unindent(
			"
			enum Color { red, green, blue }
			fn main() -> Int {
				let c = Color.blue
				0
			}
			",
		);
		assert_eq!(run(&source).0, 0);
	}
}

mod runtime_errors {
	use super::*;

	#[test]
	fn abort_stops_execution() {
		let error = run_error("var z: Int = 0 fn main() -> Int { z = 1 if gt(z, 0) { abort() } 0 }");
		assert_eq!(error, InterpreterError::Abort);
		assert_eq!(error.to_string(), "abort");
	}

	#[test]
	fn division_by_runtime_zero_fails() {
		let error = run_error("var d: Int = 1 fn main() -> Int { d = 0 div(1, d) }");
		assert_eq!(error, InterpreterError::DivisionByZero);
	}

	#[test]
	fn reading_an_unassigned_variable_fails() {
		let error = run_error("var u: Int fn main() -> Int { u }");
		assert!(matches!(error, InterpreterError::NotInitialized { .. }));
	}

	#[test]
	fn programs_without_main_are_rejected() {
		let error = run_error("let x = 1");
		assert_eq!(error, InterpreterError::MissingMain);
	}
}
