use std::collections::BTreeSet;

use crate::model::VariableId;

/// One runtime dependency of an expression: either a mutable variable whose value is only known
/// at runtime, or a built-in function with side effects that must not run at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dependency {
	Variable(VariableId),
	Builtin(&'static str),
}

/// The set of runtime dependencies of an expression. An empty set is the license to fold: the
/// expression can be executed at build time and replaced by its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
	entries: BTreeSet<Dependency>,
}

impl DependencySet {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn insert(&mut self, dependency: Dependency) {
		self.entries.insert(dependency);
	}

	pub fn remove(&mut self, dependency: &Dependency) {
		self.entries.remove(dependency);
	}

	#[must_use]
	pub fn contains(&self, dependency: &Dependency) -> bool {
		self.entries.contains(dependency)
	}

	/// Unions another set into this one.
	pub fn extend(&mut self, other: &DependencySet) {
		self.entries.extend(other.entries.iter().copied());
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Whether every entry of this set is contained in `other`.
	#[must_use]
	pub fn is_subset(&self, other: &DependencySet) -> bool {
		self.entries.is_subset(&other.entries)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
		self.entries.iter()
	}

	/// The variables in this set, skipping built-in entries.
	pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
		self.entries.iter().filter_map(|dependency| match dependency {
			Dependency::Variable(variable) => Some(*variable),
			Dependency::Builtin(_) => None,
		})
	}

	/// Removes every variable for which the predicate returns true. Used to subtract a function's
	/// own parameters and locals when computing what its calls depend on.
	pub fn remove_variables(&mut self, mut predicate: impl FnMut(VariableId) -> bool) {
		self.entries.retain(|dependency| match dependency {
			Dependency::Variable(variable) => !predicate(*variable),
			Dependency::Builtin(_) => true,
		});
	}
}

impl FromIterator<Dependency> for DependencySet {
	fn from_iter<T: IntoIterator<Item = Dependency>>(iterator: T) -> Self {
		Self {
			entries: iterator.into_iter().collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{Dependency, DependencySet};
	use crate::model::VariableId;

	#[test]
	fn union_and_subtraction() {
		let mut set = DependencySet::new();
		set.insert(Dependency::Variable(VariableId(0)));
		set.insert(Dependency::Builtin("iprint"));

		let mut other = DependencySet::new();
		other.insert(Dependency::Variable(VariableId(1)));
		set.extend(&other);

		assert!(!set.is_empty());
		set.remove_variables(|_| true);
		assert!(set.contains(&Dependency::Builtin("iprint")));
		assert_eq!(set.variables().count(), 0);
	}
}
