//! Module containing error details.

use std::sync::Arc;

/// Boxed error type accepted from formatters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error that can occur while defining delimiters, scanning or interpolating.
#[derive(Debug, Clone)]
pub enum Error {
	/// A delimiter definition was created with an empty start or end token.
	InvalidDefinition(InvalidDefinition),

	/// The input string contains a start delimiter without a matching end delimiter.
	UnmatchedDelimiter(UnmatchedDelimiter),

	/// The formatter failed to produce a value for an expression.
	Evaluation(EvaluationError),
}

impl From<InvalidDefinition> for Error {
	#[inline]
	fn from(other: InvalidDefinition) -> Self {
		Self::InvalidDefinition(other)
	}
}

impl From<UnmatchedDelimiter> for Error {
	#[inline]
	fn from(other: UnmatchedDelimiter) -> Self {
		Self::UnmatchedDelimiter(other)
	}
}

impl From<EvaluationError> for Error {
	#[inline]
	fn from(other: EvaluationError) -> Self {
		Self::Evaluation(other)
	}
}

impl From<InterpolateError> for Error {
	#[inline]
	fn from(other: InterpolateError) -> Self {
		match other {
			InterpolateError::UnmatchedDelimiter(e) => Self::UnmatchedDelimiter(e),
			InterpolateError::Evaluation(e) => Self::Evaluation(e),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::InvalidDefinition(_) => None,
			Self::UnmatchedDelimiter(_) => None,
			Self::Evaluation(e) => e.source(),
		}
	}
}

impl std::fmt::Display for Error {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::InvalidDefinition(e) => e.fmt(f),
			Self::UnmatchedDelimiter(e) => e.fmt(f),
			Self::Evaluation(e) => e.fmt(f),
		}
	}
}

impl Error {
	/// Get the range in the source text that contains the error.
	///
	/// Returns [`None`] for errors that are not tied to a source text.
	pub fn source_range(&self) -> Option<std::ops::Range<usize>> {
		match self {
			Self::InvalidDefinition(_) => None,
			Self::UnmatchedDelimiter(e) => Some(e.source_range()),
			Self::Evaluation(e) => Some(e.source_range()),
		}
	}
}

/// An error that can occur while interpolating a template.
#[derive(Debug, Clone)]
pub enum InterpolateError {
	/// The template contains a start delimiter without a matching end delimiter.
	UnmatchedDelimiter(UnmatchedDelimiter),

	/// The formatter failed to produce a value for an expression.
	Evaluation(EvaluationError),
}

impl From<UnmatchedDelimiter> for InterpolateError {
	#[inline]
	fn from(other: UnmatchedDelimiter) -> Self {
		Self::UnmatchedDelimiter(other)
	}
}

impl From<EvaluationError> for InterpolateError {
	#[inline]
	fn from(other: EvaluationError) -> Self {
		Self::Evaluation(other)
	}
}

impl std::error::Error for InterpolateError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::UnmatchedDelimiter(_) => None,
			Self::Evaluation(e) => e.source(),
		}
	}
}

impl std::fmt::Display for InterpolateError {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::UnmatchedDelimiter(e) => e.fmt(f),
			Self::Evaluation(e) => e.fmt(f),
		}
	}
}

impl InterpolateError {
	/// Get the range in the source text that contains the error.
	pub fn source_range(&self) -> std::ops::Range<usize> {
		match self {
			Self::UnmatchedDelimiter(e) => e.source_range(),
			Self::Evaluation(e) => e.source_range(),
		}
	}

	/// Get the line of source that contains the error.
	///
	/// # Panics
	/// May panic if the source text is not the original source that contains the error.
	pub fn source_line<'a>(&self, source: &'a str) -> &'a str {
		source_line(source, self.source_range().start)
	}

	/// Write source highlighting for the error location.
	///
	/// The highlighting ends with a newline.
	///
	/// Note: this function doesn't print anything if the source line exceeds 60 characters in width.
	/// For more control over this behaviour, consider using [`Self::source_range()`] and [`Self::source_line()`] instead.
	pub fn write_source_highlighting(&self, f: &mut impl std::fmt::Write, source: &str) -> std::fmt::Result {
		write_source_highlighting(f, source, self.source_range())
	}

	/// Get source highlighting for the error location as a string.
	///
	/// The highlighting ends with a newline.
	pub fn source_highlighting(&self, source: &str) -> String {
		let mut output = String::new();
		// Writing to a `String` never fails.
		let _ = self.write_source_highlighting(&mut output, source);
		output
	}
}

/// A delimiter definition was created with an empty start or end token.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct InvalidDefinition {
	/// The start token that was given.
	pub start: String,

	/// The end token that was given.
	pub end: String,
}

impl std::error::Error for InvalidDefinition {}

impl std::fmt::Display for InvalidDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match (self.start.is_empty(), self.end.is_empty()) {
			(true, true) => write!(f, "Invalid delimiter definition: the start and end tokens must not be empty"),
			(true, false) => write!(f, "Invalid delimiter definition: the start token must not be empty"),
			(false, _) => write!(f, "Invalid delimiter definition: the end token must not be empty"),
		}
	}
}

/// The input string contains a start delimiter without a matching end delimiter.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct UnmatchedDelimiter {
	/// The byte offset within the input where the error occurs.
	///
	/// This points to the start delimiter that is never closed.
	pub position: usize,

	/// The start delimiter that is never closed.
	pub start: String,

	/// The end delimiter that was expected.
	pub end: String,

	/// The escape character that can be used to make the start delimiter literal text.
	pub escape: char,

	/// The remainder of the input, starting at the unmatched delimiter.
	pub remainder: String,
}

impl UnmatchedDelimiter {
	/// Get the range in the source text that contains the error.
	pub fn source_range(&self) -> std::ops::Range<usize> {
		self.position..self.position + self.start.len()
	}

	/// Get source highlighting for the error location as a string.
	///
	/// The highlighting ends with a newline.
	pub fn source_highlighting(&self, source: &str) -> String {
		let mut output = String::new();
		let _ = write_source_highlighting(&mut output, source, self.source_range());
		output
	}
}

impl std::error::Error for UnmatchedDelimiter {}

impl std::fmt::Display for UnmatchedDelimiter {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"Unmatched delimiter: insert {:?} to complete the expression {:?}, or use the escape character {:?} before {:?} to make it literal text",
			self.end,
			self.remainder,
			self.escape,
			self.start,
		)
	}
}

/// The formatter failed to produce a value for an expression.
#[derive(Debug, Clone)]
pub struct EvaluationError {
	/// The byte offset within the input where the error occurs.
	///
	/// This points to the start of the expression that could not be interpolated.
	pub position: usize,

	/// The full text of the expression, including the delimiters.
	pub expression: String,

	cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl EvaluationError {
	/// Create an error for a formatter that produced no value.
	pub(crate) fn missing_value(position: usize, expression: &str) -> Self {
		Self {
			position,
			expression: expression.to_owned(),
			cause: None,
		}
	}

	/// Create an error for a formatter that failed.
	pub(crate) fn failed(position: usize, expression: &str, cause: BoxError) -> Self {
		Self {
			position,
			expression: expression.to_owned(),
			cause: Some(Arc::from(cause)),
		}
	}

	/// Get the error raised by the formatter, if any.
	///
	/// Returns [`None`] if the formatter did not fail but produced no value.
	pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
		self.cause.as_deref()
	}

	/// Get the range in the source text that contains the error.
	pub fn source_range(&self) -> std::ops::Range<usize> {
		self.position..self.position + self.expression.len()
	}
}

impl std::error::Error for EvaluationError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match &self.cause {
			Some(cause) => Some(cause.as_ref()),
			None => None,
		}
	}
}

impl std::fmt::Display for EvaluationError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match &self.cause {
			Some(cause) => write!(f, "Cannot interpolate expression {}: {}", self.expression, cause),
			None => write!(f, "Cannot interpolate expression {}: no value", self.expression),
		}
	}
}

fn source_line(source: &str, position: usize) -> &str {
	let start = line_start(source.as_bytes(), position);
	let end = line_end(source.as_bytes(), position);
	&source[start..end]
}

fn write_source_highlighting(f: &mut impl std::fmt::Write, source: &str, range: std::ops::Range<usize>) -> std::fmt::Result {
	use unicode_width::UnicodeWidthStr;

	let line_start = line_start(source.as_bytes(), range.start);
	let line = source_line(source, range.start);
	if line.width() > 60 {
		return Ok(());
	}

	// Errors may span multiple lines, only the first one is underlined.
	let end = range.end.min(line_start + line.len());
	write!(f, "  {}\n  ", line)?;
	write_underline(f, line, range.start - line_start..end - line_start)?;
	writeln!(f)
}

fn line_start(source: &[u8], position: usize) -> usize {
	match source[..position].iter().rposition(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => line_end + 1,
		None => 0,
	}
}

fn line_end(source: &[u8], position: usize) -> usize {
	match source[position..].iter().position(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => position + line_end,
		None => source.len(),
	}
}

fn write_underline(f: &mut impl std::fmt::Write, line: &str, range: std::ops::Range<usize>) -> std::fmt::Result {
	use unicode_width::UnicodeWidthStr;
	let spaces = line[..range.start].width();
	let carets = line[range].width();
	write!(f, "{}", " ".repeat(spaces))?;
	write!(f, "{}", "^".repeat(carets))?;
	Ok(())
}
