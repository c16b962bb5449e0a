use epl::transpiler::transpile;
use unindent::unindent;

/// Transpiles a program and returns the generated C source.
fn c_of(source: &str) -> String {
	let model = epl::build_model(source).expect("program should elaborate");
	transpile(&model).expect("program should transpile")
}

mod folding {
	use super::*;

	#[test]
	fn folded_calls_emit_their_literal_values() {
		let c = c_of("fn main() -> Int { add(2, 3) }");
		assert!(c.contains('5'), "got:\n{c}");
		assert!(!c.contains("add("), "the folded call should not survive, got:\n{c}");
	}

	#[test]
	fn folded_recursion_emits_a_single_literal() {
		let c = c_of(&unindent(
			"
			fn f(n: Int) -> Int {
				if ieq(n, 0) { 1 } else { mul(n, f(sub(n, 1))) }
			}
			fn main() -> Int { f(5) }
			",
		));
		assert!(c.contains("120"), "got:\n{c}");
		// The fully folded helper is dead code and is not emitted at all.
		assert!(!c.contains("f_"), "got:\n{c}");
	}

	#[test]
	fn impure_calls_survive_transpilation() {
		let c = c_of("fn main() { iprint(42) }");
		assert!(c.contains("iprint(42)"), "got:\n{c}");
	}
}

mod globals {
	use super::*;

	#[test]
	fn readonly_globals_become_const_definitions() {
		let c = c_of("let x = 7 fn main() -> Int { x }");
		assert!(c.contains("const Int x_0 = 7;"), "got:\n{c}");
	}

	#[test]
	fn mutable_globals_and_assignments_survive() {
		let c = c_of("var y: Int = 0 fn main() -> Int { y = 1 y }");
		assert!(c.contains("Int y_0 = 0;"), "got:\n{c}");
		assert!(!c.contains("const Int y_0"), "got:\n{c}");
		assert!(c.contains("y_0 = 1;"), "got:\n{c}");
	}

	#[test]
	fn runtime_initializers_are_deferred_into_main() {
		let c = c_of(&unindent(
			"
			var y: Int = 0
			fn bump() -> Int { y = add(y, 1) y }
			let z = bump()
			fn main() -> Int { z }
			",
		));
		// z cannot be initialized statically, so the global is bare and main fills it in.
		assert!(c.contains("Int z_1;"), "got:\n{c}");
		assert!(c.contains("z_1 = bump_0()"), "got:\n{c}");
	}
}

mod structure {
	use super::*;

	#[test]
	fn the_unit_includes_the_support_header() {
		let c = c_of("fn main() { }");
		assert!(c.starts_with("#include \"builtins.h\""), "got:\n{c}");
	}

	#[test]
	fn main_returns_the_user_result() {
		let c = c_of("fn main() -> Int { add(2, 3) }");
		assert!(c.contains("int main(void) {"), "got:\n{c}");
		assert!(c.contains("return main_0();"), "got:\n{c}");
	}

	#[test]
	fn unit_main_returns_zero() {
		let c = c_of("fn main() { iprint(1) }");
		assert!(c.contains("main_0();"), "got:\n{c}");
		assert!(c.contains("return 0;"), "got:\n{c}");
	}

	#[test]
	fn functions_get_prototypes() {
		let c = c_of("var y: Int = 0 fn touch() { y = 1 } fn main() { touch() }");
		assert!(c.contains("void touch_0(void);"), "got:\n{c}");
		assert!(c.contains("void touch_0(void) {"), "got:\n{c}");
	}

	#[test]
	fn runtime_loops_emit_while_statements() {
		let c = c_of(&unindent(
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
		));
		assert!(c.contains("while (gt(i_1, 0)) {"), "got:\n{c}");
	}

	#[test]
	fn branch_results_flow_through_a_temporary() {
		let c = c_of(&unindent(
			"
			var flag = true
			fn main() -> Int {
				if flag { 1 } else { 2 }
			}
			",
		));
		assert!(c.contains("if (flag_0) {"), "got:\n{c}");
		assert!(c.contains("tmp_"), "got:\n{c}");
	}
}

mod support_header {
	#[test]
	fn every_builtin_has_a_c_counterpart() {
		// The generated C calls built-ins by their registry names, so each one must exist in the
		// shipped header.
		for name in epl::builtins::names() {
			assert!(epl::BUILTINS_HEADER.contains(name), "builtins.h is missing {name}");
		}
	}

	#[test]
	fn the_header_provides_the_primitive_types() {
		for fragment in ["typedef int Int;", "typedef bool Bool;", "typedef char Unit;"] {
			assert!(epl::BUILTINS_HEADER.contains(fragment), "builtins.h is missing {fragment}");
		}
	}
}

mod types {
	use super::*;

	#[test]
	fn enums_become_typedefs_with_prefixed_tags() {
		let c = c_of(&unindent(
			"
			enum Color { red, green, blue }
			fn main() -> Int {
				let c = Color.green
				0
			}
			",
		));
		assert!(
			c.contains("typedef enum { Color_0_red, Color_0_green, Color_0_blue } Color_0;"),
			"got:\n{c}"
		);
		assert!(c.contains("Color_0_green"), "got:\n{c}");
	}

	#[test]
	fn empty_enums_get_an_empty_tag() {
		let c = c_of("enum Nothing {} fn main() -> Int { var n: Nothing 0 }");
		assert!(c.contains("typedef enum { Nothing_0_empty } Nothing_0;"), "got:\n{c}");
	}

	#[test]
	fn function_pointer_types_are_emitted_once() {
		let c = c_of(&unindent(
			"
			var f = fn(a: Int) -> Int { a }
			var g = fn(a: Int) -> Int { mul(a, 2) }
			fn main() -> Int { g(f(3)) }
			",
		));
		assert_eq!(c.matches("typedef Int (*Fn_0)(Int);").count(), 1, "got:\n{c}");
	}

	#[test]
	fn unit_values_use_the_sentinel() {
		let c = c_of("fn main() { let u = {} }");
		assert!(c.contains("Unit u_0 = unit;"), "got:\n{c}");
	}
}
