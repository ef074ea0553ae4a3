//! Commonly used delimiter conventions.
//!
//! All predefined definitions use `\` as escape character.
//! They are created on first use and shared for the lifetime of the program,
//! including their scan cache.

use std::sync::LazyLock;

use super::Definition;

static CURLY_BRACKET: LazyLock<Definition> = LazyLock::new(|| Definition::from_parts("{".into(), "}".into(), '\\', true, true));
static DOLLAR_CURLY_BRACKET: LazyLock<Definition> = LazyLock::new(|| Definition::from_parts("${".into(), "}".into(), '\\', true, true));
static SQUARE_BRACKET: LazyLock<Definition> = LazyLock::new(|| Definition::from_parts("[".into(), "]".into(), '\\', true, true));
static SINGLE_QUOTE_LITERAL: LazyLock<Definition> = LazyLock::new(|| Definition::from_parts("'".into(), "'".into(), '\\', false, true));
static DOUBLE_QUOTE_LITERAL: LazyLock<Definition> = LazyLock::new(|| Definition::from_parts("\"".into(), "\"".into(), '\\', true, false));

/// Expressions like `{name}`, skipping quoted text.
pub fn curly_bracket() -> &'static Definition {
	&CURLY_BRACKET
}

/// Expressions like `${name}`, skipping quoted text.
///
/// ```
/// # fn main() -> Result<(), delimit::error::Error> {
/// use delimit::predefined::dollar_curly_bracket;
/// use delimit::Expression;
///
/// let text = dollar_curly_bracket().interpolate(
///   "Hello ${name}, this is '${not_a_variable}'.",
///   delimit::format::from_fn(|e: &Expression| e.inner_text().to_uppercase()),
/// )?;
/// assert_eq!(text, "Hello NAME, this is '${not_a_variable}'.");
/// # Ok(())
/// # }
/// ```
pub fn dollar_curly_bracket() -> &'static Definition {
	&DOLLAR_CURLY_BRACKET
}

/// Expressions like `[name]`, skipping quoted text.
pub fn square_bracket() -> &'static Definition {
	&SQUARE_BRACKET
}

/// Text between single quotes.
///
/// Double quoted text inside is skipped, so a `'` between double quotes does not end the literal.
pub fn single_quote_literal() -> &'static Definition {
	&SINGLE_QUOTE_LITERAL
}

/// Text between double quotes.
///
/// Single quoted text inside is skipped, so a `"` between single quotes does not end the literal.
pub fn double_quote_literal() -> &'static Definition {
	&DOUBLE_QUOTE_LITERAL
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::assert;

	#[test]
	fn predefined_tokens() {
		let definitions = [
			(curly_bracket(), "{", "}", true, true),
			(dollar_curly_bracket(), "${", "}", true, true),
			(square_bracket(), "[", "]", true, true),
			(single_quote_literal(), "'", "'", false, true),
			(double_quote_literal(), "\"", "\"", true, false),
		];
		for (definition, start, end, skip_single, skip_double) in definitions {
			assert!(definition.start() == start);
			assert!(definition.end() == end);
			assert!(definition.escape() == '\\');
			assert!(definition.skip_single_quote() == skip_single);
			assert!(definition.skip_double_quote() == skip_double);
		}
	}

	#[test]
	fn predefined_definitions_are_shared() {
		assert!(std::ptr::eq(dollar_curly_bracket(), dollar_curly_bracket()));
		assert!(!std::ptr::eq(curly_bracket(), square_bracket()));
	}
}
