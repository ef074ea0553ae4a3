//! Find and interpolate delimited expressions in text.
//!
//! # Features
//!
//! * Find all expressions like `${name}`, `{name}` or `[name]` in a template.
//! * Define your own delimiters, including multi-character delimiters like `{{` and `}}`.
//! * Nested expressions: `${outer ${inner}}` is a single expression.
//! * Escape delimiters with a backslash (or any other escape character): `\${not an expression}`.
//! * Skip text between single or double quotes: `'${not an expression}'`.
//! * Compute the replacement of each expression with your own [`Formatter`][format::Formatter].
//! * Cache scan results per template, with a cache you can replace.
//! * Read definitions from configuration files (optional, requires the `serde` feature).
//!
//! # Examples
//!
//! The [`predefined`] module has definitions for common conventions like `${name}`.
//! A formatter computes the value of each expression, here with a lookup in a [`HashMap`][std::collections::HashMap].
//!
//! ```
//! # fn main() -> Result<(), delimit::Error> {
//! use std::collections::HashMap;
//! use delimit::{format, predefined, Expression};
//!
//! let variables = HashMap::from([("name", "world")]);
//! let text = predefined::dollar_curly_bracket().interpolate(
//!   "Hello ${name}!",
//!   format::from_fn(|e: &Expression| variables.get(e.inner_text()).copied().unwrap_or_default()),
//! )?;
//! assert_eq!(text, "Hello world!");
//! # Ok(())
//! # }
//! ```
//!
//! A [`Definition`] gives full control over the delimiters and over the replacement values.
//! The formatter receives each [`Expression`] and decides what its inner text means.
//!
//! ```
//! # fn main() -> Result<(), delimit::Error> {
//! use delimit::{format, Definition, Expression};
//!
//! let definition = Definition::new("<%", "%>", '\\', true, true)?;
//! let text = definition.interpolate(
//!   "<%1 + 2%> is \\<%not evaluated%>",
//!   format::from_fn(|e: &Expression| e.inner_text().split('+').map(|x| x.trim().parse::<i32>().unwrap_or(0)).sum::<i32>()),
//! )?;
//! assert_eq!(text, "3 is <%not evaluated%>");
//! # Ok(())
//! # }
//! ```
//!
//! You can also look at the expressions without interpolating them.
//!
//! ```
//! # fn main() -> Result<(), delimit::Error> {
//! use delimit::predefined::curly_bracket;
//!
//! let scan = curly_bracket().find_all("{a} and '{b}' and {c{d}}")?;
//! let names: Vec<_> = scan.expressions().map(|e| e.inner_text()).collect();
//! assert_eq!(names, ["a", "c{d}"]);
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(feature = "doc-cfg", feature(doc_cfg))]

pub mod cache;

pub mod error;
pub use error::Error;

mod definition;
pub use definition::{predefined, Definition};

mod expression;
pub use expression::{Expression, ScanResult};

pub mod format;

mod template;
pub use template::Template;

mod features;
