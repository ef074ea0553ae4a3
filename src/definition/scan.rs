use std::collections::{BTreeMap, BTreeSet};

use super::Definition;
use crate::error::UnmatchedDelimiter;
use crate::{Expression, ScanResult};

impl Definition {
	/// Find the next start token at or after `from`.
	///
	/// Escaped characters and quoted text are never considered.
	/// A quote without a closing quote before the next start token is an error.
	///
	/// Returns [`None`] if there is no start token in the rest of the template.
	pub fn index_of(&self, template: &str, from: usize) -> Result<Option<usize>, UnmatchedDelimiter> {
		let bytes = template.as_bytes();
		let mut starts = NextMatch::new(|haystack: &[u8]| self.start_finder.find(haystack));

		let mut position = from;
		while position < bytes.len() {
			let Some(start) = starts.at_or_after(bytes, position) else {
				return Ok(None);
			};
			if let Some(found) = self.specials.find(&bytes[position..=start]) {
				let special = position + found;
				match self.skip(template, special)? {
					Some(next) => {
						position = next;
						continue;
					},
					None if special < start => {
						position = special + 1;
						continue;
					},
					None => (),
				}
			}
			return Ok(Some(start));
		}
		Ok(None)
	}

	/// Find the end token that closes the start token at `open`.
	///
	/// Start tokens inside the expression increase the nesting level,
	/// so each of them needs its own end token first.
	/// After a nested start or end token, scanning continues at the next character.
	///
	/// Returns the position of the closing end token.
	pub fn match_end(&self, template: &str, open: usize) -> Result<usize, UnmatchedDelimiter> {
		let bytes = template.as_bytes();
		let mut starts = NextMatch::new(|haystack: &[u8]| self.start_finder.find(haystack));
		let mut ends = NextMatch::new(|haystack: &[u8]| self.end_finder.find(haystack));

		let mut nested = 0usize;
		let mut position = open + self.start.len();
		while position < bytes.len() {
			let Some(end) = ends.at_or_after(bytes, position) else {
				break;
			};
			let start = starts.at_or_after(bytes, position).filter(|&start| start < end);
			let candidate = start.unwrap_or(end);

			if let Some(found) = self.specials.find(&bytes[position..=candidate]) {
				let special = position + found;
				match self.skip(template, special)? {
					Some(next) => {
						position = next;
						continue;
					},
					None if special < candidate => {
						position = special + 1;
						continue;
					},
					None => (),
				}
			}

			if start.is_some() {
				nested += 1;
			} else if nested == 0 {
				return Ok(end);
			} else {
				nested -= 1;
			}
			position = next_char(template, candidate);
		}
		Err(self.unmatched(template, open))
	}

	/// Get the expression that starts with the start token at `open`.
	pub fn expression_at(&self, template: &str, open: usize) -> Result<Expression, UnmatchedDelimiter> {
		let close = self.match_end(template, open)?;
		let inner_text = &template[open + self.start.len()..close];
		let mut full_text = String::with_capacity(self.start.len() + inner_text.len() + self.end.len());
		full_text.push_str(&self.start);
		full_text.push_str(inner_text);
		full_text.push_str(&self.end);
		Ok(Expression::new(open, full_text, inner_text.to_owned()))
	}

	/// Find all expressions after `offset`, and the escapes in the plain text around them.
	pub(super) fn scan(&self, template: &str, offset: usize) -> Result<ScanResult, UnmatchedDelimiter> {
		let mut expressions = BTreeSet::new();
		let mut position = offset;
		while let Some(open) = self.index_of(template, position)? {
			let expression = self.expression_at(template, open)?;
			position = expression.end();
			expressions.insert(expression);
		}

		let count = expressions.len();
		let mut entries = BTreeMap::new();
		let mut plain_start = offset;
		for (i, expression) in expressions.into_iter().enumerate() {
			let mut escapes = BTreeSet::new();
			self.collect_escapes(template, plain_start, expression.start(), &mut escapes)?;
			if i + 1 == count {
				self.collect_escapes(template, expression.end(), template.len(), &mut escapes)?;
			}
			plain_start = expression.end();
			entries.insert(expression, escapes);
		}
		Ok(ScanResult::new(entries))
	}

	/// Collect the positions of escape characters in the plain text between `from` and `limit`.
	///
	/// Escape characters inside quoted text are not collected.
	fn collect_escapes(&self, template: &str, from: usize, limit: usize, escapes: &mut BTreeSet<usize>) -> Result<(), UnmatchedDelimiter> {
		let bytes = template.as_bytes();
		let mut position = from;
		while position < limit {
			let Some(found) = self.specials.find(&bytes[position..limit]) else {
				break;
			};
			let candidate = position + found;
			if let Some(literal) = self.quote_literal(bytes[candidate]) {
				position = literal.skip_literal(template, candidate)?;
			} else if bytes[candidate..].starts_with(self.escape_token.as_bytes()) {
				escapes.insert(candidate);
				position = skip_escaped(template, candidate, self.escape_token.len());
			} else {
				position = candidate + 1;
			}
		}
		Ok(())
	}

	/// Skip over an escape sequence or a quoted literal at `position`.
	///
	/// Returns the position to continue scanning at,
	/// or [`None`] if the character at `position` has no special meaning.
	fn skip(&self, template: &str, position: usize) -> Result<Option<usize>, UnmatchedDelimiter> {
		let bytes = &template.as_bytes()[position..];
		if bytes.starts_with(self.escape_token.as_bytes()) {
			return Ok(Some(skip_escaped(template, position, self.escape_token.len())));
		}
		match self.quote_literal(bytes[0]) {
			Some(literal) => Ok(Some(literal.skip_literal(template, position)?)),
			None => Ok(None),
		}
	}

	/// Skip over the quoted literal that starts at `open`.
	///
	/// Quotes of the other kind inside the literal open a nested literal that must be closed first.
	/// Nested literals are tracked with an explicit stack, so deep nesting can not overflow the call stack.
	///
	/// Returns the position just past the closing quote.
	fn skip_literal(&self, template: &str, open: usize) -> Result<usize, UnmatchedDelimiter> {
		let bytes = template.as_bytes();
		let mut stack: Vec<(&Definition, usize)> = vec![(self, open)];
		let mut position = open + self.start.len();

		while let Some(&(literal, opened_at)) = stack.last() {
			let Some(found) = literal.literal_needles.find(&bytes[position..]) else {
				// Report the innermost literal, that is the one that must be closed first.
				return Err(literal.unmatched(template, opened_at));
			};
			let candidate = position + found;
			let rest = &bytes[candidate..];

			if rest.starts_with(literal.escape_token.as_bytes()) {
				position = skip_escaped(template, candidate, literal.escape_token.len());
			} else if let Some(nested) = literal.quote_literal(rest[0]) {
				stack.push((nested, candidate));
				position = candidate + nested.start.len();
			} else if rest.starts_with(literal.end.as_bytes()) {
				stack.pop();
				position = candidate + literal.end.len();
			} else {
				position = candidate + 1;
			}
		}
		Ok(position)
	}
}

/// Get the position of the character after the one at `position`.
fn next_char(template: &str, position: usize) -> usize {
	position + template[position..].chars().next().map_or(1, char::len_utf8)
}

/// Get the position after an escape character and the character it escapes.
///
/// An escape character at the end of the template escapes nothing.
fn skip_escaped(template: &str, position: usize, escape_len: usize) -> usize {
	let escaped = position + escape_len;
	let escaped_len = template[escaped..].chars().next().map_or(0, char::len_utf8);
	escaped + escaped_len
}

/// A small set of bytes to search for.
#[derive(Debug, Clone, Copy)]
pub(super) struct Needles {
	bytes: [u8; 4],
	len: usize,
}

impl Needles {
	/// Create a set from the given bytes, ignoring duplicates.
	pub(super) fn new(bytes: &[u8]) -> Self {
		let mut needles = Self { bytes: [0; 4], len: 0 };
		for &byte in bytes {
			if !needles.bytes[..needles.len].contains(&byte) {
				needles.bytes[needles.len] = byte;
				needles.len += 1;
			}
		}
		needles
	}

	/// Find the first occurrence of any of the bytes.
	pub(super) fn find(&self, haystack: &[u8]) -> Option<usize> {
		match self.bytes[..self.len] {
			[] => None,
			[a] => memchr::memchr(a, haystack),
			[a, b] => memchr::memchr2(a, b, haystack),
			[a, b, c] => memchr::memchr3(a, b, c, haystack),
			ref needles => haystack.iter().position(|byte| needles.contains(byte)),
		}
	}
}

/// The next match of a search in a haystack, remembered while the scan position advances.
///
/// Scanning only moves forward, so a match after the current position stays valid.
/// This avoids searching the same text over and over.
struct NextMatch<F> {
	find: F,
	next: Option<usize>,
	exhausted: bool,
}

impl<F: Fn(&[u8]) -> Option<usize>> NextMatch<F> {
	fn new(find: F) -> Self {
		Self {
			find,
			next: None,
			exhausted: false,
		}
	}

	/// Get the first match at or after `position`.
	fn at_or_after(&mut self, haystack: &[u8], position: usize) -> Option<usize> {
		if self.exhausted {
			return None;
		}
		if let Some(next) = self.next.filter(|&next| next >= position) {
			return Some(next);
		}
		match (self.find)(&haystack[position.min(haystack.len())..]) {
			Some(found) => {
				self.next = Some(position + found);
				self.next
			},
			None => {
				self.exhausted = true;
				None
			},
		}
	}
}
