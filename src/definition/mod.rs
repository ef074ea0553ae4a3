use std::sync::Arc;

use memchr::memmem;

use crate::cache::{MemoryCache, ScanCache};
use crate::error::{InterpolateError, InvalidDefinition, UnmatchedDelimiter};
use crate::format::Formatter;
use crate::{ScanResult, Template};

pub mod predefined;
mod scan;

use scan::Needles;

/// A delimiter convention: start and end tokens, an escape character and quote handling.
///
/// A definition finds all expressions like `${name}` in a template,
/// and can interpolate them with values computed by a [`Formatter`].
///
/// The escape character makes the following character literal text,
/// so it can never open or close an expression.
/// Text quoted with single or double quotes can be excluded from scanning:
/// delimiters inside such a quoted span are not treated as delimiters.
///
/// Scan results of [`Self::find_all()`] are cached per template text.
/// The cache can be replaced with [`Self::with_cache()`].
///
/// Commonly used conventions are available in the [`predefined`] module.
pub struct Definition {
	start: String,
	end: String,
	escape: char,
	escape_token: String,
	skip_single_quote: bool,
	skip_double_quote: bool,

	start_finder: memmem::Finder<'static>,
	end_finder: memmem::Finder<'static>,

	/// First bytes of the escape character and the quote characters that are skipped.
	specials: Needles,

	/// Same as `specials`, plus the first byte of the end token.
	literal_needles: Needles,

	cache: Box<dyn ScanCache>,
}

impl Definition {
	/// Create a new definition.
	///
	/// `start` and `end` are the tokens that open and close an expression.
	/// They must not be empty.
	///
	/// If `skip_single_quote` or `skip_double_quote` is set,
	/// text between single or double quotes is skipped when looking for delimiters.
	pub fn new(
		start: impl Into<String>,
		end: impl Into<String>,
		escape: char,
		skip_single_quote: bool,
		skip_double_quote: bool,
	) -> Result<Self, InvalidDefinition> {
		let start = start.into();
		let end = end.into();
		if start.is_empty() || end.is_empty() {
			return Err(InvalidDefinition { start, end });
		}
		Ok(Self::from_parts(start, end, escape, skip_single_quote, skip_double_quote))
	}

	/// Create a definition from tokens that are known to be non-empty.
	pub(crate) fn from_parts(start: String, end: String, escape: char, skip_single_quote: bool, skip_double_quote: bool) -> Self {
		debug_assert!(!start.is_empty() && !end.is_empty());
		let escape_token = escape.to_string();

		let mut specials = vec![escape_token.as_bytes()[0]];
		if skip_single_quote && start != "'" {
			specials.push(b'\'');
		}
		if skip_double_quote && start != "\"" {
			specials.push(b'"');
		}
		let mut literal_needles = specials.clone();
		literal_needles.push(end.as_bytes()[0]);

		Self {
			start_finder: memmem::Finder::new(start.as_bytes()).into_owned(),
			end_finder: memmem::Finder::new(end.as_bytes()).into_owned(),
			specials: Needles::new(&specials),
			literal_needles: Needles::new(&literal_needles),
			start,
			end,
			escape,
			escape_token,
			skip_single_quote,
			skip_double_quote,
			cache: Box::new(MemoryCache::new()),
		}
	}

	/// Replace the cache used to memoize scan results.
	pub fn with_cache(mut self, cache: impl ScanCache + 'static) -> Self {
		self.cache = Box::new(cache);
		self
	}

	/// The token that opens an expression.
	#[inline]
	pub fn start(&self) -> &str {
		&self.start
	}

	/// The token that closes an expression.
	#[inline]
	pub fn end(&self) -> &str {
		&self.end
	}

	/// The escape character.
	#[inline]
	pub fn escape(&self) -> char {
		self.escape
	}

	/// Check if text between single quotes is skipped.
	#[inline]
	pub fn skip_single_quote(&self) -> bool {
		self.skip_single_quote
	}

	/// Check if text between double quotes is skipped.
	#[inline]
	pub fn skip_double_quote(&self) -> bool {
		self.skip_double_quote
	}

	/// Find all expressions in a template.
	///
	/// The result is cached.
	/// Calling this again with the same template returns the cached result,
	/// until it is evicted with [`Self::remove_cache()`].
	pub fn find_all(&self, template: &str) -> Result<Arc<ScanResult>, UnmatchedDelimiter> {
		self.find_all_with(template, 0, true)
	}

	/// Find all expressions in a template, starting at the byte offset `offset`.
	///
	/// Text before `offset` is ignored.
	/// The result is only cached if `cacheable` is true and `offset` is zero.
	pub fn find_all_with(&self, template: &str, offset: usize, cacheable: bool) -> Result<Arc<ScanResult>, UnmatchedDelimiter> {
		let use_cache = cacheable && offset == 0;
		if use_cache {
			if let Some(cached) = self.cache.get(template) {
				tracing::trace!(start = %self.start, expressions = cached.len(), "scan cache hit");
				return Ok(cached);
			}
		}

		let result = Arc::new(self.scan(template, offset)?);
		tracing::trace!(start = %self.start, offset, expressions = result.len(), "scanned template");
		if use_cache {
			Ok(self.cache.insert(template, result))
		} else {
			Ok(result)
		}
	}

	/// Evict the cached scan result of a template.
	///
	/// Does nothing if the template is not cached.
	pub fn remove_cache(&self, template: &str) {
		tracing::debug!(start = %self.start, "evicting cached scan result");
		self.cache.remove(template);
	}

	/// Evict all cached scan results.
	pub fn clear_cache(&self) {
		tracing::debug!(start = %self.start, "clearing scan cache");
		self.cache.clear();
	}

	/// Find all expressions in a template, and keep them for expansion.
	///
	/// The scan result is cached like with [`Self::find_all()`].
	pub fn prepare<'a>(&self, template: &'a str) -> Result<Template<'a>, UnmatchedDelimiter> {
		self.prepare_with(template, 0, true)
	}

	/// Find all expressions in a template starting at `offset`, and keep them for expansion.
	///
	/// Text before `offset` is copied verbatim when the template is expanded.
	pub fn prepare_with<'a>(&self, template: &'a str, offset: usize, cacheable: bool) -> Result<Template<'a>, UnmatchedDelimiter> {
		let scan = self.find_all_with(template, offset, cacheable)?;
		Ok(Template::new(template, self.escape, scan))
	}

	/// Replace all expressions in a template with the value computed by the formatter.
	///
	/// Escape characters that only serve to prevent delimiter collisions in the surrounding text are removed.
	/// The scan result is cached like with [`Self::find_all()`].
	pub fn interpolate<F: Formatter>(&self, template: &str, formatter: F) -> Result<String, InterpolateError> {
		self.interpolate_with(template, 0, true, formatter)
	}

	/// Replace all expressions after `offset` in a template with the value computed by the formatter.
	///
	/// Text before `offset` is copied verbatim.
	pub fn interpolate_with<F: Formatter>(
		&self,
		template: &str,
		offset: usize,
		cacheable: bool,
		formatter: F,
	) -> Result<String, InterpolateError> {
		let template = self.prepare_with(template, offset, cacheable)?;
		Ok(template.expand(formatter)?)
	}

	/// Get the literal definition used to skip a quote character, if skipping is enabled for it.
	///
	/// A quote is never skipped if it is exactly the start token of this definition.
	fn quote_literal(&self, byte: u8) -> Option<&'static Definition> {
		match byte {
			b'\'' if self.skip_single_quote && self.start != "'" => Some(predefined::single_quote_literal()),
			b'"' if self.skip_double_quote && self.start != "\"" => Some(predefined::double_quote_literal()),
			_ => None,
		}
	}

	fn unmatched(&self, template: &str, position: usize) -> UnmatchedDelimiter {
		UnmatchedDelimiter {
			position,
			start: self.start.clone(),
			end: self.end.clone(),
			escape: self.escape,
			remainder: template[position..].to_owned(),
		}
	}
}

impl std::fmt::Debug for Definition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Definition")
			.field("start", &self.start)
			.field("end", &self.end)
			.field("escape", &self.escape)
			.field("skip_single_quote", &self.skip_single_quote)
			.field("skip_double_quote", &self.skip_double_quote)
			.finish_non_exhaustive()
	}
}

/// Definitions are equal if they use the same tokens and options, regardless of their cache.
impl PartialEq for Definition {
	fn eq(&self, other: &Self) -> bool {
		self.start == other.start
			&& self.end == other.end
			&& self.escape == other.escape
			&& self.skip_single_quote == other.skip_single_quote
			&& self.skip_double_quote == other.skip_double_quote
	}
}

impl Eq for Definition {}

#[cfg(test)]
mod test {
	use std::collections::BTreeSet;

	use super::*;
	use crate::cache::NoCache;
	use crate::format::{from_fn, try_from_fn};
	use crate::Expression;
	use assert2::{assert, check, let_assert};
	use predefined::dollar_curly_bracket;

	#[test]
	fn empty_tokens_are_rejected() {
		let_assert!(Err(e) = Definition::new("", "}", '\\', true, true));
		assert!(e == InvalidDefinition { start: "".into(), end: "}".into() });
		assert!(e.to_string() == "Invalid delimiter definition: the start token must not be empty");

		let_assert!(Err(e) = Definition::new("{", "", '\\', true, true));
		assert!(e.to_string() == "Invalid delimiter definition: the end token must not be empty");

		let_assert!(Err(e) = Definition::new("", "", '\\', true, true));
		assert!(e.to_string() == "Invalid delimiter definition: the start and end tokens must not be empty");
	}

	#[test]
	fn interpolate_first_and_last_name() {
		let formatter = from_fn(|e: &Expression| match e.inner_text() {
			"firstName" => "Thomás",
			_ => "Sousa Silva",
		});
		let_assert!(Ok(text) = dollar_curly_bracket().interpolate("Hello ${firstName} ${lastName}!", formatter));
		assert!(text == "Hello Thomás Sousa Silva!");
	}

	#[test]
	#[rustfmt::skip]
	fn quoted_text_and_escapes() {
		let template = r"Lorem ${ipsum} dolor sit amet, 'consectetur adipiscing' elit, \\sed do \${ 'eiusmod' ${(tempor + 1 * 10) / 5 == x ? 'incididunt ut' : 'labore \\et dolore'} magna \${aliqua\}  \\\\.";
		let definition = dollar_curly_bracket();
		let_assert!(Ok(scan) = definition.find_all_with(template, 0, false));
		assert!(scan.len() == 2);

		let mut entries = scan.iter();
		let_assert!(Some((first, escapes)) = entries.next());
		check!(first.start() == 6);
		check!(first.full_text() == "${ipsum}");
		check!(first.inner_text() == "ipsum");
		check!(first.end() == 14);
		check!(escapes.is_empty());

		let_assert!(Some((second, escapes)) = entries.next());
		check!(second.start() == 85);
		check!(second.full_text() == r"${(tempor + 1 * 10) / 5 == x ? 'incididunt ut' : 'labore \\et dolore'}");
		check!(second.inner_text() == r"(tempor + 1 * 10) / 5 == x ? 'incididunt ut' : 'labore \\et dolore'");
		check!(second.end() == 155);
		check!(escapes == &BTreeSet::from([62, 71, 162, 171, 175, 177]));

		let mut counter = 0;
		let_assert!(Ok(text) = definition.interpolate_with(template, 0, false, from_fn(|_: &Expression| {
			counter += 1;
			format!("REPLACE{counter}")
		})));
		assert!(text == r"Lorem REPLACE1 dolor sit amet, 'consectetur adipiscing' elit, \sed do ${ 'eiusmod' REPLACE2 magna ${aliqua}  \\.");
	}

	#[test]
	fn no_expressions_is_a_no_op() {
		let definition = dollar_curly_bracket();
		for template in ["", "plain text", "{not an expression}", "$ {a}", "$"] {
			let_assert!(Ok(scan) = definition.find_all_with(template, 0, false));
			assert!(scan.is_empty());
			let_assert!(Ok(text) = definition.interpolate_with(template, 0, false, from_fn(|_: &Expression| "x")));
			assert!(text == template);
		}
	}

	#[test]
	fn escaped_delimiter_without_expression_is_kept() {
		let definition = dollar_curly_bracket();
		let template = r"cost: \${price}";
		let_assert!(Ok(text) = definition.interpolate_with(template, 0, false, from_fn(|_: &Expression| "x")));
		assert!(text == template);
	}

	#[test]
	fn nested_expression() {
		let_assert!(Ok(scan) = dollar_curly_bracket().find_all_with("${a${b}c}", 0, false));
		assert!(scan.len() == 1);
		let_assert!(Some(expression) = scan.last());
		assert!(expression.inner_text() == "a${b}c");
		assert!(expression.full_text() == "${a${b}c}");
	}

	#[test]
	fn quoted_delimiters_are_not_nested() {
		let_assert!(Ok(scan) = dollar_curly_bracket().find_all_with("${x 'a${b}' y}", 0, false));
		assert!(scan.len() == 1);
		let_assert!(Some(expression) = scan.last());
		assert!(expression.inner_text() == "x 'a${b}' y");
	}

	#[test]
	fn unterminated_expression() {
		let_assert!(Err(e) = dollar_curly_bracket().find_all_with("${abc", 0, false));
		assert!(e.position == 0);
		assert!(e.start == "${");
		assert!(e.end == "}");
		assert!(e.remainder == "${abc");
		assert!(e.to_string() == r#"Unmatched delimiter: insert "}" to complete the expression "${abc", or use the escape character '\\' before "${" to make it literal text"#);
	}

	#[test]
	fn failed_scan_is_not_cached() {
		let definition = Definition::new("${", "}", '\\', true, true).unwrap();
		assert!(definition.find_all("${abc").is_err());
		assert!(definition.find_all("${abc").is_err());
	}

	#[test]
	fn formatter_without_value() {
		let formatter = try_from_fn(|e: &Expression| -> Result<Option<&'static str>, String> {
			match e.inner_text() {
				"a" => Ok(Some("A")),
				_ => Ok(None),
			}
		});
		let_assert!(Err(InterpolateError::Evaluation(e)) = dollar_curly_bracket().interpolate_with("${a} ${b}", 0, false, formatter));
		assert!(e.expression == "${b}");
		assert!(e.position == 5);
		assert!(e.cause().is_none());
		assert!(e.to_string() == "Cannot interpolate expression ${b}: no value");
	}

	#[test]
	fn formatter_error_is_wrapped() {
		let formatter = try_from_fn(|e: &Expression| -> Result<Option<String>, String> {
			Err(format!("cannot evaluate {:?}", e.inner_text()))
		});
		let_assert!(Err(InterpolateError::Evaluation(e)) = dollar_curly_bracket().interpolate_with("x = ${1 / 0}", 0, false, formatter));
		assert!(e.expression == "${1 / 0}");
		let_assert!(Some(cause) = e.cause());
		assert!(cause.to_string() == r#"cannot evaluate "1 / 0""#);
		assert!(std::error::Error::source(&e).is_some());
		assert!(e.to_string() == r#"Cannot interpolate expression ${1 / 0}: cannot evaluate "1 / 0""#);
	}

	#[test]
	fn cache_returns_same_result_until_removed() {
		let definition = Definition::new("${", "}", '\\', true, true).unwrap();
		let template = "Hello ${name}!";

		let_assert!(Ok(first) = definition.find_all(template));
		let_assert!(Ok(second) = definition.find_all(template));
		assert!(Arc::ptr_eq(&first, &second));

		definition.remove_cache(template);
		let_assert!(Ok(third) = definition.find_all(template));
		assert!(!Arc::ptr_eq(&first, &third));
		assert!(first == third);

		definition.clear_cache();
		let_assert!(Ok(fourth) = definition.find_all(template));
		assert!(!Arc::ptr_eq(&third, &fourth));
	}

	#[test]
	fn offset_and_uncacheable_scans_bypass_cache() {
		let definition = Definition::new("${", "}", '\\', true, true).unwrap();
		let template = "${a} ${b}";

		let_assert!(Ok(first) = definition.find_all_with(template, 0, false));
		let_assert!(Ok(second) = definition.find_all_with(template, 0, false));
		assert!(!Arc::ptr_eq(&first, &second));

		let_assert!(Ok(tail) = definition.find_all_with(template, 1, true));
		assert!(tail.len() == 1);
		let_assert!(Ok(full) = definition.find_all(template));
		assert!(full.len() == 2);
	}

	#[test]
	fn interpolate_with_offset_keeps_prefix() {
		let definition = dollar_curly_bracket();
		let_assert!(Ok(text) = definition.interpolate_with(r"${a} \$ ${b} \$", 4, false, from_fn(|e: &Expression| e.inner_text().to_uppercase())));
		assert!(text == "${a} $ B $");
	}

	#[test]
	fn custom_cache() {
		let definition = Definition::new("{{", "}}", '\\', true, true).unwrap().with_cache(NoCache);
		let_assert!(Ok(first) = definition.find_all("{{a}}"));
		let_assert!(Ok(second) = definition.find_all("{{a}}"));
		assert!(!Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn shared_between_threads() {
		let definition = Definition::new("${", "}", '\\', true, true).unwrap();
		let template = "${a} and ${b} and '${c}'";
		let results: Vec<_> = std::thread::scope(|scope| {
			let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| definition.find_all(template))).collect();
			handles.into_iter().map(|handle| handle.join()).collect()
		});

		let_assert!(Ok(Ok(expected)) = &results[0]);
		assert!(expected.len() == 2);
		for result in &results {
			let_assert!(Ok(Ok(result)) = result);
			assert!(result == expected);
		}
		let_assert!(Ok(cached) = definition.find_all(template));
		assert!(&cached == expected);
	}

	#[test]
	fn debug_and_equality_ignore_cache() {
		let a = Definition::new("[", "]", '\\', true, true).unwrap();
		let b = Definition::new("[", "]", '\\', true, true).unwrap().with_cache(NoCache);
		assert!(a == b);
		assert!(&a == predefined::square_bracket());
		assert!(format!("{a:?}") == r#"Definition { start: "[", end: "]", escape: '\\', skip_single_quote: true, skip_double_quote: true, .. }"#);
	}
}
