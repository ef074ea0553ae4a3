use std::collections::{btree_map, BTreeMap, BTreeSet};

/// A delimiter-bounded expression found in a template.
///
/// Two expressions are equal if they start at the same position and have the same full text.
/// Expressions are ordered by their start position.
#[derive(Debug, Clone)]
pub struct Expression {
	start: usize,
	full_text: String,
	inner_text: String,
}

impl Expression {
	pub(crate) fn new(start: usize, full_text: String, inner_text: String) -> Self {
		Self {
			start,
			full_text,
			inner_text,
		}
	}

	/// The byte offset of the start delimiter in the template.
	#[inline]
	pub fn start(&self) -> usize {
		self.start
	}

	/// The byte offset just past the end delimiter in the template.
	#[inline]
	pub fn end(&self) -> usize {
		self.start + self.full_text.len()
	}

	/// The byte range of the full expression in the template.
	#[inline]
	pub fn range(&self) -> std::ops::Range<usize> {
		self.start..self.end()
	}

	/// The text of the expression, including the delimiters.
	#[inline]
	pub fn full_text(&self) -> &str {
		&self.full_text
	}

	/// The raw text between the start and end delimiter.
	#[inline]
	pub fn inner_text(&self) -> &str {
		&self.inner_text
	}
}

impl PartialEq for Expression {
	fn eq(&self, other: &Self) -> bool {
		self.start == other.start && self.full_text == other.full_text
	}
}

impl Eq for Expression {}

impl PartialOrd for Expression {
	#[inline]
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Expression {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.start
			.cmp(&other.start)
			.then_with(|| self.full_text.cmp(&other.full_text))
	}
}

impl std::hash::Hash for Expression {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.start.hash(state);
		self.full_text.hash(state);
	}
}

impl std::fmt::Display for Expression {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.full_text)
	}
}

/// The expressions found in a template, in order of appearance.
///
/// Each expression carries the byte offsets of escape characters in the surrounding plain text.
/// Those escape characters only prevent delimiter collisions and are removed when the template is expanded.
/// The set attached to an expression holds the escapes between the previous expression and this one.
/// The set of the last expression also holds the escapes in the text following it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
	entries: BTreeMap<Expression, BTreeSet<usize>>,
}

impl ScanResult {
	pub(crate) fn new(entries: BTreeMap<Expression, BTreeSet<usize>>) -> Self {
		Self { entries }
	}

	/// Check if no expressions were found.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Get the number of expressions found.
	#[inline]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Iterate over the expressions and their escape offsets, in order of appearance.
	#[inline]
	pub fn iter(&self) -> btree_map::Iter<'_, Expression, BTreeSet<usize>> {
		self.entries.iter()
	}

	/// Iterate over the expressions, in order of appearance.
	#[inline]
	pub fn expressions(&self) -> btree_map::Keys<'_, Expression, BTreeSet<usize>> {
		self.entries.keys()
	}

	/// Get the escape offsets attached to an expression.
	#[inline]
	pub fn escapes(&self, expression: &Expression) -> Option<&BTreeSet<usize>> {
		self.entries.get(expression)
	}

	/// Get the last expression in the template.
	#[inline]
	pub fn last(&self) -> Option<&Expression> {
		self.entries.keys().next_back()
	}
}

impl<'a> IntoIterator for &'a ScanResult {
	type Item = (&'a Expression, &'a BTreeSet<usize>);
	type IntoIter = btree_map::Iter<'a, Expression, BTreeSet<usize>>;

	#[inline]
	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::assert;

	fn expression(start: usize, full_text: &str, inner_text: &str) -> Expression {
		Expression::new(start, full_text.into(), inner_text.into())
	}

	#[test]
	fn end_is_derived_from_full_text() {
		let expression = expression(6, "${ipsum}", "ipsum");
		assert!(expression.end() == 14);
		assert!(expression.range() == (6..14));
		assert!(expression.to_string() == "${ipsum}");
	}

	#[test]
	fn equality_ignores_inner_text() {
		assert!(expression(0, "{{a}}", "{a}") == expression(0, "{{a}}", "a"));
		assert!(expression(0, "{a}", "a") != expression(1, "{a}", "a"));
		assert!(expression(0, "{a}", "a") != expression(0, "{b}", "b"));
	}

	#[test]
	fn ordered_by_start() {
		let mut entries = BTreeMap::new();
		entries.insert(expression(10, "${b}", "b"), BTreeSet::new());
		entries.insert(expression(2, "${a}", "a"), BTreeSet::new());
		entries.insert(expression(2, "${a}", "a"), BTreeSet::from([0]));
		let scan = ScanResult::new(entries);

		assert!(scan.len() == 2);
		let starts: Vec<_> = scan.expressions().map(Expression::start).collect();
		assert!(starts == [2, 10]);
		assert!(scan.last().map(Expression::inner_text) == Some("b"));
		assert!(scan.escapes(&expression(2, "${a}", "a")) == Some(&BTreeSet::from([0])));
	}
}
