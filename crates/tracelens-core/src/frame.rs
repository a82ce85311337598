// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack frame types before and after symbolication.

use serde::{Deserialize, Serialize};

/// A single call site as reported by the client, before symbolication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFrame {
	/// Function/method name, if the runtime reported one
	pub function_name: Option<String>,
	/// URL or path of the generated file
	pub file_name: Option<String>,
	/// 1-indexed line in the generated file
	pub line_number: Option<u32>,
	/// Column in the generated file, as reported by the runtime
	pub column_number: Option<u32>,
}

impl RawFrame {
	/// Returns the `(file, line, column)` triple needed to consult a source
	/// map, or `None` for native and anonymous frames.
	pub fn location(&self) -> Option<(&str, u32, u32)> {
		match (
			self.file_name.as_deref(),
			self.line_number,
			self.column_number,
		) {
			(Some(file), Some(line), Some(column)) if !file.is_empty() => Some((file, line, column)),
			_ => None,
		}
	}
}

/// Original-coordinate mapping for one frame.
///
/// A position without a source or a line is unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPosition {
	pub source: Option<String>,
	/// 1-indexed line in the original source
	pub line: Option<u32>,
	/// 0-indexed column in the original source
	pub column: Option<u32>,
	/// Original identifier at this position
	pub name: Option<String>,
}

impl ResolvedPosition {
	pub fn is_resolved(&self) -> bool {
		self.source.is_some() && self.line.is_some()
	}
}

/// A frame that was mapped back to original source and given a snippet.
///
/// The serialized shape (`function`, `source`, `line`, `column`, `name`,
/// `snippet`) is what stored reports contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicatedFrame {
	pub function: Option<String>,
	pub source: Option<String>,
	pub line: Option<u32>,
	pub column: Option<u32>,
	pub name: Option<String>,
	pub snippet: String,
}

impl SymbolicatedFrame {
	pub fn new(function: Option<String>, position: ResolvedPosition, snippet: String) -> Self {
		Self {
			function,
			source: position.source,
			line: position.line,
			column: position.column,
			name: position.name,
			snippet,
		}
	}
}
