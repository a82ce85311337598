// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source Map v3 documents.

use serde::Deserialize;

use crate::error::{Result, SymbolicateError};
use crate::vlq::MappingIndex;

/// Prefix some servers prepend to JSON responses to defeat script inclusion.
const XSSI_PREFIX: &str = ")]}'";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
	version: u32,
	#[serde(default)]
	file: Option<String>,
	#[serde(default)]
	source_root: Option<String>,
	#[serde(default)]
	sources: Vec<Option<String>>,
	#[serde(default)]
	sources_content: Option<Vec<Option<String>>>,
	#[serde(default)]
	names: Vec<String>,
	mappings: String,
}

/// A parsed source map ready for position lookups.
#[derive(Debug, Clone)]
pub struct SourceMapDocument {
	file: Option<String>,
	/// Source paths with `sourceRoot` already applied.
	sources: Vec<String>,
	sources_content: Vec<Option<String>>,
	names: Vec<String>,
	mappings: MappingIndex,
}

/// Original position for a generated location.
///
/// `line` is 1-indexed to match how stack traces and editors count lines;
/// `column` is the 0-indexed value stored in the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
	pub source: String,
	pub source_index: u32,
	pub line: u32,
	pub column: u32,
	pub name: Option<String>,
}

impl SourceMapDocument {
	pub fn parse(json: &str) -> Result<Self> {
		let json = json.trim_start_matches('\u{feff}');
		let json = json.strip_prefix(XSSI_PREFIX).unwrap_or(json);
		let raw: RawSourceMap = serde_json::from_str(json)?;
		Self::from_raw(raw)
	}

	pub fn from_slice(bytes: &[u8]) -> Result<Self> {
		let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
		let bytes = bytes.strip_prefix(XSSI_PREFIX.as_bytes()).unwrap_or(bytes);
		let raw: RawSourceMap = serde_json::from_slice(bytes)?;
		Self::from_raw(raw)
	}

	fn from_raw(raw: RawSourceMap) -> Result<Self> {
		if raw.version != 3 {
			return Err(SymbolicateError::InvalidSourceMapVersion(raw.version));
		}

		let root = raw.source_root.as_deref().unwrap_or("");
		let sources = raw
			.sources
			.into_iter()
			.map(|s| apply_source_root(root, s.as_deref().unwrap_or("")))
			.collect();

		Ok(Self {
			file: raw.file,
			sources,
			sources_content: raw.sources_content.unwrap_or_default(),
			names: raw.names,
			mappings: MappingIndex::decode(&raw.mappings)?,
		})
	}

	/// Resolve a generated position.
	///
	/// `line` is 1-indexed as reported in stack frames and `column` is passed
	/// through to the mapping search unchanged. Returns `None` when the line
	/// has no segment at or before the column, when that segment is an
	/// unmapped one, or when it points at a source index the map does not
	/// declare.
	pub fn lookup(&self, line: u32, column: u32) -> Option<OriginalPosition> {
		let original = self.mappings.lookup(line.checked_sub(1)?, column)?;
		let source = self.sources.get(original.source_index as usize)?;

		Some(OriginalPosition {
			source: source.clone(),
			source_index: original.source_index,
			line: original.line + 1,
			column: original.column,
			name: original
				.name_index
				.and_then(|i| self.names.get(i as usize))
				.cloned(),
		})
	}

	/// Embedded text for the source at `index`, if the map carries it.
	pub fn source_content(&self, index: u32) -> Option<&str> {
		self.sources_content
			.get(index as usize)
			.and_then(|c| c.as_deref())
	}

	pub fn file(&self) -> Option<&str> {
		self.file.as_deref()
	}

	pub fn sources(&self) -> &[String] {
		&self.sources
	}

	pub fn mapping_count(&self) -> usize {
		self.mappings.len()
	}
}

fn apply_source_root(root: &str, source: &str) -> String {
	if root.is_empty() || source.contains("://") || source.starts_with('/') {
		return source.to_string();
	}
	if root.ends_with('/') {
		format!("{root}{source}")
	} else {
		format!("{root}/{source}")
	}
}
