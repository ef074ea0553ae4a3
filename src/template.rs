use std::fmt::Write;
use std::sync::Arc;

use crate::error::EvaluationError;
use crate::format::Formatter;
use crate::ScanResult;

/// A scanned template that borrows the source string.
///
/// You can scan the template once with [`Definition::prepare()`][crate::Definition::prepare]
/// and call [`Self::expand()`] multiple times with different formatters.
#[derive(Clone)]
pub struct Template<'a> {
	source: &'a str,
	escape: char,
	scan: Arc<ScanResult>,
}

impl std::fmt::Debug for Template<'_> {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Template").field(&self.source).finish()
	}
}

impl<'a> Template<'a> {
	pub(crate) fn new(source: &'a str, escape: char, scan: Arc<ScanResult>) -> Self {
		Self { source, escape, scan }
	}

	/// Get the original source string.
	#[inline]
	pub fn source(&self) -> &'a str {
		self.source
	}

	/// Get the expressions found in the source string.
	#[inline]
	pub fn scan(&self) -> &ScanResult {
		&self.scan
	}

	/// Expand the template.
	///
	/// Every expression is replaced by the value computed by the formatter.
	/// Escape characters recorded in the scan result are removed from the surrounding text.
	///
	/// If the formatter fails or produces no value for any expression,
	/// an error is returned and no partial output is produced.
	pub fn expand<F: Formatter>(&self, mut formatter: F) -> Result<String, EvaluationError> {
		if self.scan.is_empty() {
			return Ok(self.source.to_owned());
		}

		let escape_len = self.escape.len_utf8();
		let mut output = String::with_capacity(self.source.len() + self.source.len() / 10);
		let mut position = 0;
		for (expression, escapes) in self.scan.iter() {
			for &escape in escapes.range(..expression.start()) {
				output.push_str(&self.source[position..escape]);
				position = escape + escape_len;
			}
			output.push_str(&self.source[position..expression.start()]);

			let value = match formatter.format(expression) {
				Ok(Some(value)) => value,
				Ok(None) => return Err(EvaluationError::missing_value(expression.start(), expression.full_text())),
				Err(e) => return Err(EvaluationError::failed(expression.start(), expression.full_text(), e.into())),
			};
			write!(output, "{value}")
				.map_err(|e| EvaluationError::failed(expression.start(), expression.full_text(), Box::new(e)))?;
			position = expression.end();

			// Only the last expression has escapes after it.
			for &escape in escapes.range(expression.end()..) {
				output.push_str(&self.source[position..escape]);
				position = escape + escape_len;
			}
		}
		output.push_str(&self.source[position..]);
		Ok(output)
	}
}
