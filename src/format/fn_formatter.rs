use std::convert::Infallible;

use super::Formatter;
use crate::error::BoxError;
use crate::Expression;

/// [`Formatter`] produced by [`from_fn()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FnFormatter<F> {
	func: F,
}

impl<F, V> Formatter for FnFormatter<F>
where
	F: FnMut(&Expression) -> V,
	V: std::fmt::Display,
{
	type Value = V;
	type Error = Infallible;

	#[inline(always)]
	fn format(&mut self, expression: &Expression) -> Result<Option<Self::Value>, Self::Error> {
		Ok(Some((self.func)(expression)))
	}
}

/// Creates a [`Formatter`] that always produces a value with the given function.
///
/// # Example
/// ```rust
/// # fn main() -> Result<(), delimit::Error> {
/// use delimit::{format, predefined, Expression};
///
/// let formatter = format::from_fn(|e: &Expression| e.inner_text().len());
/// let text = predefined::curly_bracket().interpolate("{abc} {de}", formatter)?;
/// assert_eq!(text, "3 2");
/// # Ok(())
/// # }
/// ```
pub const fn from_fn<F, V>(func: F) -> FnFormatter<F>
where
	F: FnMut(&Expression) -> V,
	V: std::fmt::Display,
{
	FnFormatter { func }
}

/// [`Formatter`] produced by [`try_from_fn()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TryFnFormatter<F> {
	func: F,
}

impl<F, V, E> Formatter for TryFnFormatter<F>
where
	F: FnMut(&Expression) -> Result<Option<V>, E>,
	V: std::fmt::Display,
	E: Into<BoxError>,
{
	type Value = V;
	type Error = E;

	#[inline(always)]
	fn format(&mut self, expression: &Expression) -> Result<Option<Self::Value>, Self::Error> {
		(self.func)(expression)
	}
}

/// Creates a [`Formatter`] from a function that may fail or produce no value.
///
/// # Example
/// ```rust
/// use delimit::{format, predefined, Expression};
///
/// let formatter = format::try_from_fn(|e: &Expression| e.inner_text().parse::<i64>().map(|x| Some(x * 2)));
/// let result = predefined::curly_bracket().interpolate("{21} {abc}", formatter);
/// assert!(result.is_err());
/// ```
pub const fn try_from_fn<F, V, E>(func: F) -> TryFnFormatter<F>
where
	F: FnMut(&Expression) -> Result<Option<V>, E>,
	V: std::fmt::Display,
	E: Into<BoxError>,
{
	TryFnFormatter { func }
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, let_assert};

	fn expression(inner_text: &str) -> Expression {
		Expression::new(0, format!("{{{inner_text}}}"), inner_text.to_owned())
	}

	#[test]
	fn fn_formatter_always_has_a_value() {
		let mut calls = Vec::new();
		let mut formatter = from_fn(|e: &Expression| {
			calls.push(e.inner_text().to_owned());
			"x"
		});
		let_assert!(Ok(Some("x")) = formatter.format(&expression("a")));
		let_assert!(Ok(Some("x")) = formatter.format(&expression("b")));
		assert!(calls == ["a", "b"]);
	}

	#[test]
	fn try_fn_formatter_passes_errors() {
		let mut formatter = try_from_fn(|e: &Expression| e.inner_text().parse::<u8>().map(Some));
		let_assert!(Ok(Some(12)) = formatter.format(&expression("12")));
		let_assert!(Err(e) = formatter.format(&expression("300")));
		assert!(e.to_string() == "number too large to fit in target type");
	}

	#[test]
	fn formatter_by_mutable_reference() {
		let mut count = 0;
		let mut formatter = from_fn(|_: &Expression| {
			count += 1;
			count
		});
		let_assert!(Ok(Some(1)) = Formatter::format(&mut &mut formatter, &expression("a")));
		let_assert!(Ok(Some(2)) = Formatter::format(&mut &mut formatter, &expression("a")));
	}
}
