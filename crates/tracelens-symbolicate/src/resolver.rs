// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mapping generated frame locations back to original source positions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracelens_core::{RawFrame, ResolvedPosition};
use tracing::{debug, instrument, trace};

use crate::cache::SourceMapCache;
use crate::fetch::{fetch_with_timeout, SourceFetcher};
use crate::sourcemap::{OriginalPosition, SourceMapDocument};

/// Why a frame could not be resolved. None of these are errors; the frame
/// is simply left out of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
	/// Native or anonymous frame, or a frame missing its line or column.
	NoFileReference,
	/// Network error, non-2xx response or timeout.
	MapFetchFailed,
	InvalidSourceMap,
	/// The map has no segment for this position.
	NoMapping,
}

impl fmt::Display for UnresolvedReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			UnresolvedReason::NoFileReference => "no file reference",
			UnresolvedReason::MapFetchFailed => "source map fetch failed",
			UnresolvedReason::InvalidSourceMap => "invalid source map",
			UnresolvedReason::NoMapping => "no mapping for position",
		};
		f.write_str(s)
	}
}

/// A successfully mapped frame, with the map it was resolved against so
/// the snippet extractor can use embedded source text.
#[derive(Debug, Clone)]
pub struct ResolvedFrame {
	pub position: OriginalPosition,
	pub map_url: String,
	map: Arc<SourceMapDocument>,
}

impl ResolvedFrame {
	/// Source text embedded in the map for the mapped source, if any.
	pub fn inline_source(&self) -> Option<&str> {
		self.map.source_content(self.position.source_index)
	}

	pub fn to_position(&self) -> ResolvedPosition {
		ResolvedPosition {
			source: Some(self.position.source.clone()),
			line: Some(self.position.line),
			column: Some(self.position.column),
			name: self.position.name.clone(),
		}
	}
}

#[derive(Debug, Clone)]
pub enum Resolution {
	Resolved(ResolvedFrame),
	Unresolved(UnresolvedReason),
}

impl Resolution {
	pub fn is_resolved(&self) -> bool {
		matches!(self, Resolution::Resolved(_))
	}
}

/// Location of the source map for a generated file.
pub fn map_url_for(file: &str) -> String {
	format!("{file}.map")
}

/// Fetches, parses and caches source maps, and queries them for frames.
pub struct SourceMapResolver<F: ?Sized> {
	fetcher: Arc<F>,
	cache: Arc<SourceMapCache>,
	fetch_timeout: Duration,
}

impl<F: SourceFetcher + ?Sized> SourceMapResolver<F> {
	pub fn new(fetcher: Arc<F>, cache: Arc<SourceMapCache>, fetch_timeout: Duration) -> Self {
		Self {
			fetcher,
			cache,
			fetch_timeout,
		}
	}

	pub fn cache(&self) -> &SourceMapCache {
		&self.cache
	}

	#[instrument(skip(self, frame), fields(file = frame.file_name.as_deref().unwrap_or("")))]
	pub async fn resolve(&self, frame: &RawFrame) -> Resolution {
		let Some((file, line, column)) = frame.location() else {
			return Resolution::Unresolved(UnresolvedReason::NoFileReference);
		};

		let map_url = map_url_for(file);
		let map = match self.load_map(&map_url).await {
			Ok(map) => map,
			Err(reason) => return Resolution::Unresolved(reason),
		};

		match map.lookup(line, column) {
			Some(position) if !position.source.is_empty() => {
				trace!(
					source = %position.source,
					line = position.line,
					column = position.column,
					"resolved frame"
				);
				Resolution::Resolved(ResolvedFrame {
					position,
					map_url,
					map,
				})
			}
			_ => {
				debug!(map_url = %map_url, line, column, "no mapping for position");
				Resolution::Unresolved(UnresolvedReason::NoMapping)
			}
		}
	}

	/// Load a parsed map from the cache, fetching and parsing it on a miss.
	pub async fn load_map(&self, map_url: &str) -> Result<Arc<SourceMapDocument>, UnresolvedReason> {
		if let Some(map) = self.cache.get(map_url) {
			return Ok(map);
		}

		let text = fetch_with_timeout(self.fetcher.as_ref(), map_url, self.fetch_timeout)
			.await
			.map_err(|e| {
				debug!(map_url, error = %e, "source map fetch failed");
				UnresolvedReason::MapFetchFailed
			})?;

		let map = SourceMapDocument::parse(&text).map_err(|e| {
			debug!(map_url, error = %e, "source map parse failed");
			UnresolvedReason::InvalidSourceMap
		})?;

		debug!(
			map_url,
			sources = map.sources().len(),
			mappings = map.mapping_count(),
			"loaded source map"
		);
		let map = Arc::new(map);
		self.cache.insert(map_url, Arc::clone(&map));
		Ok(map)
	}
}
