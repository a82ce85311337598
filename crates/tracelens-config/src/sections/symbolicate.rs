// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Symbolication engine configuration section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CONTEXT_LINES: usize = 5;
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
pub const DEFAULT_MAX_STACK_BYTES: usize = 64 * 1024;
pub const DEFAULT_MAX_FRAMES: usize = 100;

/// Symbolication configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicateConfig {
	/// Upper bound for every source map and remote source fetch
	pub fetch_timeout: Duration,
	/// Lines of context above and below the target line
	pub context_lines: usize,
	pub max_concurrent_fetches: usize,
	/// Parsed source maps kept in memory; 0 disables the cache
	pub cache_capacity: usize,
	/// Stacks larger than this are rejected outright
	pub max_stack_bytes: usize,
	/// Frames past this index are ignored
	pub max_frames: usize,
	/// Joined with relative file references before fetching
	pub base_url: Option<String>,
	/// Emit frames that resolved but have no source text, with an empty snippet
	pub keep_frames_without_snippet: bool,
}

impl Default for SymbolicateConfig {
	fn default() -> Self {
		SymbolicateConfigLayer::default().finalize()
	}
}

/// Symbolication configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SymbolicateConfigLayer {
	#[serde(default)]
	pub fetch_timeout_secs: Option<u64>,
	#[serde(default)]
	pub context_lines: Option<usize>,
	#[serde(default)]
	pub max_concurrent_fetches: Option<usize>,
	#[serde(default)]
	pub cache_capacity: Option<usize>,
	#[serde(default)]
	pub max_stack_bytes: Option<usize>,
	#[serde(default)]
	pub max_frames: Option<usize>,
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub keep_frames_without_snippet: Option<bool>,
}

impl SymbolicateConfigLayer {
	pub fn merge(&mut self, other: SymbolicateConfigLayer) {
		if other.fetch_timeout_secs.is_some() {
			self.fetch_timeout_secs = other.fetch_timeout_secs;
		}
		if other.context_lines.is_some() {
			self.context_lines = other.context_lines;
		}
		if other.max_concurrent_fetches.is_some() {
			self.max_concurrent_fetches = other.max_concurrent_fetches;
		}
		if other.cache_capacity.is_some() {
			self.cache_capacity = other.cache_capacity;
		}
		if other.max_stack_bytes.is_some() {
			self.max_stack_bytes = other.max_stack_bytes;
		}
		if other.max_frames.is_some() {
			self.max_frames = other.max_frames;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.keep_frames_without_snippet.is_some() {
			self.keep_frames_without_snippet = other.keep_frames_without_snippet;
		}
	}

	pub fn finalize(self) -> SymbolicateConfig {
		SymbolicateConfig {
			fetch_timeout: Duration::from_secs(
				self.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
			),
			context_lines: self.context_lines.unwrap_or(DEFAULT_CONTEXT_LINES),
			max_concurrent_fetches: self
				.max_concurrent_fetches
				.unwrap_or(DEFAULT_MAX_CONCURRENT_FETCHES),
			cache_capacity: self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
			max_stack_bytes: self.max_stack_bytes.unwrap_or(DEFAULT_MAX_STACK_BYTES),
			max_frames: self.max_frames.unwrap_or(DEFAULT_MAX_FRAMES),
			base_url: self.base_url.filter(|u| !u.is_empty()),
			keep_frames_without_snippet: self.keep_frames_without_snippet.unwrap_or(false),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = SymbolicateConfigLayer::default().finalize();
		assert_eq!(config.fetch_timeout, Duration::from_secs(5));
		assert_eq!(config.context_lines, 5);
		assert_eq!(config.max_concurrent_fetches, 4);
		assert_eq!(config.cache_capacity, 256);
		assert!(config.base_url.is_none());
		assert!(!config.keep_frames_without_snippet);
	}

	#[test]
	fn test_merge_preserves_base_when_none() {
		let mut base = SymbolicateConfigLayer {
			fetch_timeout_secs: Some(2),
			base_url: Some("https://cdn.example.com/".to_string()),
			..Default::default()
		};
		base.merge(SymbolicateConfigLayer {
			context_lines: Some(3),
			..Default::default()
		});

		let config = base.finalize();
		assert_eq!(config.fetch_timeout, Duration::from_secs(2));
		assert_eq!(config.context_lines, 3);
		assert_eq!(config.base_url.as_deref(), Some("https://cdn.example.com/"));
	}

	#[test]
	fn test_empty_base_url_is_ignored() {
		let layer = SymbolicateConfigLayer {
			base_url: Some(String::new()),
			..Default::default()
		};
		assert!(layer.finalize().base_url.is_none());
	}

	#[test]
	fn test_deserialize_partial_toml() {
		let layer: SymbolicateConfigLayer =
			toml::from_str("fetch_timeout_secs = 3\nkeep_frames_without_snippet = true").unwrap();
		assert_eq!(layer.fetch_timeout_secs, Some(3));
		assert_eq!(layer.keep_frames_without_snippet, Some(true));
		assert!(layer.max_frames.is_none());
	}
}
