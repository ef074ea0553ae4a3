//! Formatters compute the replacement text for expressions.
//!
//! A [`Formatter`] receives every [`Expression`] found in a template, in order of appearance,
//! and returns the text that replaces it.
//! What the inner text of an expression means is entirely up to the formatter.

use crate::error::BoxError;
use crate::Expression;

mod fn_formatter;
pub use fn_formatter::*;

/// Trait for types that compute the replacement text of expressions.
pub trait Formatter {
	/// The type of the replacement values.
	type Value: std::fmt::Display;

	/// The error returned when a value can not be computed.
	type Error: Into<BoxError>;

	/// Compute the replacement value of an expression.
	///
	/// Returning `Ok(None)` means there is no value for the expression,
	/// which aborts the interpolation.
	fn format(&mut self, expression: &Expression) -> Result<Option<Self::Value>, Self::Error>;
}

impl<F> Formatter for &'_ mut F
where
	F: ?Sized + Formatter,
{
	type Value = F::Value;
	type Error = F::Error;

	#[inline(always)]
	fn format(&mut self, expression: &Expression) -> Result<Option<Self::Value>, Self::Error> {
		F::format(self, expression)
	}
}

impl<F> Formatter for Box<F>
where
	F: ?Sized + Formatter,
{
	type Value = F::Value;
	type Error = F::Error;

	#[inline(always)]
	fn format(&mut self, expression: &Expression) -> Result<Option<Self::Value>, Self::Error> {
		F::format(self, expression)
	}
}
