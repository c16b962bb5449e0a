//! The output tree the transpiler emits C into. Emission frequently needs to back-fill text at an
//! earlier position — typedefs above the code that first needed them, temporaries above the
//! statement that computes into them — so the output is a tree of append-only segments with
//! shareable insertion points, rendered once at the end instead of concatenated at every step.

use std::cell::RefCell;
use std::rc::Rc;

/// A node in the output tree. Cloning an `Output` clones the handle, not the node: both handles
/// keep appending to the same segment list, which is exactly what an insertion point is.
#[derive(Clone)]
pub struct Output {
	node: Rc<RefCell<OutputNode>>,
}

struct OutputNode {
	indent: bool,
	segments: Vec<Segment>,
}

enum Segment {
	Text(String),
	Child(Output),
}

impl Output {
	#[must_use]
	pub fn new() -> Self {
		Self {
			node: Rc::new(RefCell::new(OutputNode {
				indent: false,
				segments: Vec::new(),
			})),
		}
	}

	/// Appends a text fragment.
	pub fn push(&self, fragment: impl Into<String>) {
		self.node.borrow_mut().segments.push(Segment::Text(fragment.into()));
	}

	/// Appends a line break.
	pub fn newline(&self) {
		self.push("\n");
	}

	/// Appends a new child node and returns a handle to it. Anything pushed into the child later
	/// renders at this position.
	pub fn child(&self) -> Output {
		let child = Output::new();
		self.append(&child);
		child
	}

	/// Appends a new child node whose rendered lines are indented by two spaces.
	pub fn indented_child(&self) -> Output {
		let child = Output::new();
		child.node.borrow_mut().indent = true;
		self.append(&child);
		child
	}

	/// Appends an existing node as a child.
	pub fn append(&self, child: &Output) {
		self.node.borrow_mut().segments.push(Segment::Child(Output {
			node: Rc::clone(&child.node),
		}));
	}

	/// Whether nothing has been emitted into this node or any of its children.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.node.borrow().segments.iter().all(|segment| match segment {
			Segment::Text(text) => text.is_empty(),
			Segment::Child(child) => child.is_empty(),
		})
	}

	/// Renders the tree to text. Adjacent fragments are joined with a single space, except around
	/// the punctuation that C readers expect to hug its neighbors: nothing before `)`, `,`, `;`
	/// or `(`, nothing after `(`, and nothing around line breaks.
	#[must_use]
	pub fn render(&self) -> String {
		let node = self.node.borrow();
		let mut rendered = String::new();
		for segment in &node.segments {
			let atom = match segment {
				Segment::Text(text) => text.clone(),
				Segment::Child(child) => child.render(),
			};
			if atom.is_empty() {
				continue;
			}
			if needs_space(&rendered, &atom) {
				rendered.push(' ');
			}
			rendered.push_str(&atom);
		}
		if node.indent {
			indent_lines(&rendered)
		} else {
			rendered
		}
	}
}

impl Default for Output {
	fn default() -> Self {
		Self::new()
	}
}

fn needs_space(previous: &str, next: &str) -> bool {
	let Some(last) = previous.chars().last() else {
		return false;
	};
	let Some(first) = next.chars().next() else {
		return false;
	};
	if last == '\n' || first == '\n' || last == '(' {
		return false;
	}
	!matches!(first, ')' | ',' | ';' | '(')
}

/// Prepends two spaces to every non-empty line.
fn indent_lines(text: &str) -> String {
	let trailing_newline = text.ends_with('\n');
	let mut indented = text
		.lines()
		.map(|line| if line.is_empty() { String::new() } else { format!("  {line}") })
		.collect::<Vec<_>>()
		.join("\n");
	if trailing_newline {
		indented.push('\n');
	}
	indented
}

#[cfg(test)]
mod tests {
	use super::Output;

	#[test]
	fn fragments_join_with_single_spaces() {
		let output = Output::new();
		output.push("const");
		output.push("Int");
		output.push("x");
		output.push("=");
		output.push("7");
		output.push(";");
		assert_eq!(output.render(), "const Int x = 7;");
	}

	#[test]
	fn call_punctuation_hugs_its_neighbors() {
		let output = Output::new();
		for fragment in ["add", "(", "2", ",", "3", ")", ";"] {
			output.push(fragment);
		}
		assert_eq!(output.render(), "add(2, 3);");
	}

	#[test]
	fn children_are_insertion_points() {
		let output = Output::new();
		let prelude = output.child();
		output.push("body");
		output.push(";");
		prelude.push("Int");
		prelude.push("tmp");
		prelude.push(";");
		assert_eq!(output.render(), "Int tmp; body;");
	}

	#[test]
	fn indented_children_indent_every_line() {
		let output = Output::new();
		output.push("{");
		output.newline();
		let inner = output.indented_child();
		inner.push("a");
		inner.push(";");
		inner.newline();
		inner.push("b");
		inner.push(";");
		inner.newline();
		output.push("}");
		assert_eq!(output.render(), "{\n  a;\n  b;\n}");
	}
}
