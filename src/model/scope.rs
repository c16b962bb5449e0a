use std::collections::HashMap;

use crate::model::{FunctionId, OwnerId, ScopeId, Value, VariableId};

/// What a name in a scope resolves to: a variable binding, a named function, or a constant known
/// at elaboration time (built-in functions, types, enumeration variants, `true` and `false`).
#[derive(Debug, Clone)]
pub enum Term {
	Variable(VariableId),
	Function(FunctionId),
	Constant(Value),
}

/// One scope in the scope tree. Scopes are arena-allocated in `ScopeArena` and refer to each
/// other by index; building an actual tree of parent/child references in Rust would need
/// `Rc<RefCell<..>>` cycles with weak back-links, and the arena avoids all of that. Scopes are
/// never removed, so an index is a permanent id.
#[derive(Debug)]
pub struct Scope {
	/// The scope this one is nested in. `None` only for the root scope holding the built-ins.
	parent: Option<ScopeId>,
	/// The runtime boundary this scope belongs to: the innermost enclosing function, or the
	/// program itself. A reference to a mutable variable from a different owner is what makes an
	/// expression depend on runtime state.
	owner: OwnerId,
	/// The names defined in this exact scope. Parent scopes are consulted by the resolver, not
	/// stored here.
	terms: HashMap<String, Term>,
}

impl Scope {
	#[must_use]
	pub fn owner(&self) -> OwnerId {
		self.owner
	}

	#[must_use]
	pub fn parent(&self) -> Option<ScopeId> {
		self.parent
	}
}

/// The scope tree as a flat arena, with a cursor for the scope currently being elaborated.
#[derive(Debug)]
pub struct ScopeArena {
	scopes: Vec<Scope>,
	current: ScopeId,
	next_owner: usize,
}

impl ScopeArena {
	/// Creates the arena with a single root scope. The root holds the built-in context and owns
	/// the program's runtime boundary.
	#[must_use]
	pub fn new() -> Self {
		Self {
			scopes: vec![Scope {
				parent: None,
				owner: OwnerId(0),
				terms: HashMap::new(),
			}],
			current: ScopeId(0),
			next_owner: 1,
		}
	}

	#[must_use]
	pub fn current(&self) -> ScopeId {
		self.current
	}

	#[must_use]
	pub fn current_owner(&self) -> OwnerId {
		self.scopes[self.current.0].owner
	}

	#[must_use]
	pub fn get(&self, scope: ScopeId) -> &Scope {
		&self.scopes[scope.0]
	}

	/// Enters a new child scope of the current scope with the same owner, and makes it current.
	pub fn enter(&mut self) -> ScopeId {
		self.push_scope(self.scopes[self.current.0].owner)
	}

	/// Enters a new child scope with a fresh owner. Used for function bodies: the new owner is
	/// the runtime boundary that separates the function's variables from everything outside it.
	pub fn enter_function(&mut self) -> ScopeId {
		let owner = OwnerId(self.next_owner);
		self.next_owner += 1;
		self.push_scope(owner)
	}

	fn push_scope(&mut self, owner: OwnerId) -> ScopeId {
		let id = ScopeId(self.scopes.len());
		self.scopes.push(Scope {
			parent: Some(self.current),
			owner,
			terms: HashMap::new(),
		});
		self.current = id;
		id
	}

	/// Leaves the current scope, returning to its parent. Leaving the root scope is a logic error
	/// in the elaborator, not something user code can cause.
	pub fn exit(&mut self) {
		self.current = self.scopes[self.current.0].parent.unwrap_or(ScopeId(0));
	}

	/// Adds a term to the given scope. Fails by returning the name when the name already exists
	/// in that exact scope; shadowing a name from an outer scope is allowed, redefinition within
	/// one scope is not.
	pub fn add_term(&mut self, scope: ScopeId, name: &str, term: Term) -> Result<(), String> {
		let terms = &mut self.scopes[scope.0].terms;
		if terms.contains_key(name) {
			return Err(name.to_owned());
		}
		terms.insert(name.to_owned(), term);
		Ok(())
	}

	/// Resolves a name starting from the given scope and walking outward through parents. The
	/// innermost match wins.
	#[must_use]
	pub fn resolve_from(&self, scope: ScopeId, name: &str) -> Option<&Term> {
		let mut current = Some(scope);
		while let Some(scope_id) = current {
			let scope = &self.scopes[scope_id.0];
			if let Some(term) = scope.terms.get(name) {
				return Some(term);
			}
			current = scope.parent;
		}
		None
	}

	/// Resolves a name from the current scope outward.
	#[must_use]
	pub fn resolve(&self, name: &str) -> Option<&Term> {
		self.resolve_from(self.current, name)
	}
}

impl Default for ScopeArena {
	fn default() -> Self {
		Self::new()
	}
}
