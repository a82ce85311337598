// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Line-numbered source excerpts.
//!
//! A snippet renders as a header line naming the source path followed by one
//! line per source line:
//!
//! ```text
//! src/app.js
//!      37 | const a = 1;
//! >    42 | throw new Error("boom");
//! ```
//!
//! Each body line is a marker (`>` for the target line, a space otherwise),
//! a space, the line number right-aligned to [`LINE_NUMBER_WIDTH`], the
//! `" | "` separator and the source text. Stored reports rely on this shape,
//! and [`SourceSnippet::parse`] reads it back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Minimum width of the right-aligned line number column.
pub const LINE_NUMBER_WIDTH: usize = 5;

const TARGET_MARKER: char = '>';
const CONTEXT_MARKER: char = ' ';
const SEPARATOR: &str = " | ";

/// One line of a snippet body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetLine {
	/// 1-indexed line number in the original source
	pub line_number: u32,
	pub text: String,
	pub is_target: bool,
}

/// A bounded excerpt of original source around a target line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSnippet {
	pub header: String,
	pub body: Vec<SnippetLine>,
}

impl SourceSnippet {
	pub fn new(header: impl Into<String>, body: Vec<SnippetLine>) -> Self {
		Self {
			header: header.into(),
			body,
		}
	}

	pub fn target(&self) -> Option<&SnippetLine> {
		self.body.iter().find(|l| l.is_target)
	}

	/// First and last line numbers covered by the body.
	pub fn span(&self) -> Option<(u32, u32)> {
		let first = self.body.first()?.line_number;
		let last = self.body.last()?.line_number;
		Some((first, last))
	}

	/// Render to the stored textual form.
	pub fn render(&self) -> String {
		self.to_string()
	}

	/// Parse the stored textual form back into a snippet.
	pub fn parse(rendered: &str) -> Result<Self> {
		let mut lines = rendered.lines();
		let header = lines
			.next()
			.ok_or_else(|| CoreError::InvalidSnippet("missing header line".to_string()))?;

		let body = lines
			.enumerate()
			.map(|(idx, line)| parse_body_line(line).ok_or_else(|| {
				CoreError::InvalidSnippet(format!("malformed body line {}: {line:?}", idx + 1))
			}))
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			header: header.to_string(),
			body,
		})
	}
}

impl fmt::Display for SourceSnippet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.header)?;
		for line in &self.body {
			let marker = if line.is_target {
				TARGET_MARKER
			} else {
				CONTEXT_MARKER
			};
			write!(
				f,
				"\n{marker} {:>width$}{SEPARATOR}{}",
				line.line_number,
				line.text,
				width = LINE_NUMBER_WIDTH
			)?;
		}
		Ok(())
	}
}

fn parse_body_line(line: &str) -> Option<SnippetLine> {
	let (prefix, text) = line.split_once(SEPARATOR)?;
	let mut chars = prefix.chars();
	let is_target = match chars.next()? {
		TARGET_MARKER => true,
		CONTEXT_MARKER => false,
		_ => return None,
	};
	let line_number = chars.as_str().trim().parse().ok()?;

	Some(SnippetLine {
		line_number,
		text: text.to_string(),
		is_target,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> SourceSnippet {
		SourceSnippet::new(
			"src/app.js",
			vec![
				SnippetLine {
					line_number: 9,
					text: "function boom() {".to_string(),
					is_target: false,
				},
				SnippetLine {
					line_number: 10,
					text: "  throw new Error(\"a | b\");".to_string(),
					is_target: true,
				},
				SnippetLine {
					line_number: 11,
					text: String::new(),
					is_target: false,
				},
			],
		)
	}

	#[test]
	fn renders_marker_padded_number_and_separator() {
		let rendered = sample().render();
		let lines: Vec<&str> = rendered.lines().collect();

		assert_eq!(lines[0], "src/app.js");
		assert_eq!(lines[1], "      9 | function boom() {");
		assert_eq!(lines[2], ">    10 |   throw new Error(\"a | b\");");
		assert_eq!(lines[3], "     11 | ");
	}

	#[test]
	fn parse_reads_rendered_form() {
		let snippet = sample();
		let parsed = SourceSnippet::parse(&snippet.render()).unwrap();
		assert_eq!(parsed, snippet);
		assert_eq!(parsed.target().map(|l| l.line_number), Some(10));
		assert_eq!(parsed.span(), Some((9, 11)));
	}

	#[test]
	fn wide_line_numbers_are_not_truncated() {
		let snippet = SourceSnippet::new(
			"big.js",
			vec![SnippetLine {
				line_number: 1_234_567,
				text: "x".to_string(),
				is_target: true,
			}],
		);
		assert_eq!(snippet.render(), "big.js\n> 1234567 | x");
	}

	#[test]
	fn parse_rejects_garbage() {
		assert!(SourceSnippet::parse("").is_err());
		assert!(SourceSnippet::parse("header\nnot a snippet line").is_err());
		assert!(SourceSnippet::parse("header\n*    1 | x").is_err());
	}
}
