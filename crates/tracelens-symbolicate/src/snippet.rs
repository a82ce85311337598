// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source snippet extraction around resolved positions.
//!
//! Windowing is pure; only acquiring the source text touches the network.

use std::sync::Arc;
use std::time::Duration;

use tracelens_core::{SnippetLine, SourceSnippet};
use tracing::{debug, instrument};
use url::Url;

use crate::fetch::{fetch_with_timeout, SourceFetcher};
use crate::resolver::ResolvedFrame;

/// Cut the window `max(1, line - context)..=min(n, line + context)` out of
/// `text`, marking `line` as the target.
///
/// Returns `None` when `line` is 0 or past the end of the text.
pub fn extract_window(text: &str, line: u32, context: usize) -> Option<Vec<SnippetLine>> {
	let lines: Vec<&str> = text.lines().collect();
	let target = usize::try_from(line).ok()?;
	if target == 0 || target > lines.len() {
		return None;
	}

	let start = target.saturating_sub(context).max(1);
	let end = target.saturating_add(context).min(lines.len());

	Some(
		(start..=end)
			.map(|n| SnippetLine {
				line_number: n as u32,
				text: lines[n - 1].to_string(),
				is_target: n == target,
			})
			.collect(),
	)
}

/// Build a snippet headed by `source` from the full source text.
pub fn build_snippet(source: &str, text: &str, line: u32, context: usize) -> Option<SourceSnippet> {
	extract_window(text, line, context).map(|body| SourceSnippet::new(source, body))
}

/// Resolve a source path from a map against the map's own location.
///
/// Absolute URLs are returned unchanged. Relative paths are joined onto the
/// directory of `map_url`, which may itself be a URL or a plain path.
pub fn resolve_source_url(map_url: &str, source: &str) -> String {
	if Url::parse(source).is_ok() {
		return source.to_string();
	}

	if let Ok(base) = Url::parse(map_url) {
		if let Ok(joined) = base.join(source) {
			return joined.to_string();
		}
	}

	if source.starts_with('/') {
		return source.to_string();
	}

	let dir = match map_url.rfind('/') {
		Some(idx) => &map_url[..idx],
		None => "",
	};
	normalize_path(dir, source)
}

fn normalize_path(dir: &str, relative: &str) -> String {
	let absolute = dir.starts_with('/');
	let mut parts: Vec<&str> = Vec::new();

	for segment in dir.split('/').chain(relative.split('/')) {
		match segment {
			"" | "." => {}
			".." => {
				if matches!(parts.last(), Some(&p) if p != "..") {
					parts.pop();
				} else if !absolute {
					parts.push("..");
				}
			}
			s => parts.push(s),
		}
	}

	let joined = parts.join("/");
	if absolute {
		format!("/{joined}")
	} else {
		joined
	}
}

/// Produces snippets for resolved frames, preferring source text embedded
/// in the map and falling back to fetching the original file.
pub struct SnippetExtractor<F: ?Sized> {
	fetcher: Arc<F>,
	context_lines: usize,
	fetch_timeout: Duration,
}

impl<F: SourceFetcher + ?Sized> SnippetExtractor<F> {
	pub fn new(fetcher: Arc<F>, context_lines: usize, fetch_timeout: Duration) -> Self {
		Self {
			fetcher,
			context_lines,
			fetch_timeout,
		}
	}

	#[instrument(skip(self, frame), fields(source = %frame.position.source, line = frame.position.line))]
	pub async fn extract(&self, frame: &ResolvedFrame) -> Option<SourceSnippet> {
		let position = &frame.position;

		if let Some(text) = frame.inline_source().filter(|t| !t.is_empty()) {
			return self.window(&position.source, text, position.line);
		}

		let url = resolve_source_url(&frame.map_url, &position.source);
		let text = match fetch_with_timeout(self.fetcher.as_ref(), &url, self.fetch_timeout).await {
			Ok(text) if !text.is_empty() => text,
			Ok(_) => {
				debug!(url = %url, "remote source is empty");
				return None;
			}
			Err(e) => {
				debug!(url = %url, error = %e, "remote source fetch failed");
				return None;
			}
		};

		self.window(&position.source, &text, position.line)
	}

	fn window(&self, source: &str, text: &str, line: u32) -> Option<SourceSnippet> {
		let snippet = build_snippet(source, text, line, self.context_lines);
		if snippet.is_none() {
			debug!(source, line, "target line is outside the source text");
		}
		snippet
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::SourceMapCache;
	use crate::fetch::InMemorySources;
	use crate::resolver::{Resolution, SourceMapResolver};
	use proptest::prelude::*;
	use tracelens_core::RawFrame;

	fn numbered_source(lines: u32) -> String {
		(1..=lines)
			.map(|n| format!("line {n}"))
			.collect::<Vec<_>>()
			.join("\n")
	}

	#[test]
	fn window_is_clipped_at_file_start() {
		let body = extract_window(&numbered_source(20), 2, 5).unwrap();
		assert_eq!(body.first().unwrap().line_number, 1);
		assert_eq!(body.last().unwrap().line_number, 7);
		assert_eq!(body.iter().filter(|l| l.is_target).count(), 1);
		assert_eq!(body[1].text, "line 2");
		assert!(body[1].is_target);
	}

	#[test]
	fn window_is_clipped_at_file_end() {
		let body = extract_window(&numbered_source(10), 9, 5).unwrap();
		assert_eq!(body.first().unwrap().line_number, 4);
		assert_eq!(body.last().unwrap().line_number, 10);
	}

	#[test]
	fn window_outside_file_is_none() {
		assert!(extract_window(&numbered_source(10), 11, 5).is_none());
		assert!(extract_window(&numbered_source(10), 0, 5).is_none());
		assert!(extract_window("", 1, 5).is_none());
	}

	#[test]
	fn window_handles_crlf() {
		let body = extract_window("a\r\nb\r\nc", 2, 1).unwrap();
		assert_eq!(body.len(), 3);
		assert_eq!(body[1].text, "b");
	}

	#[test]
	fn snippet_renders_with_target_marker() {
		let snippet = build_snippet("app.js", &numbered_source(3), 2, 1).unwrap();
		assert_eq!(
			snippet.render(),
			"app.js\n      1 | line 1\n>     2 | line 2\n      3 | line 3"
		);
	}

	#[test]
	fn source_urls_resolve_against_map_location() {
		assert_eq!(
			resolve_source_url("https://cdn.example.com/static/app.min.js.map", "../src/app.js"),
			"https://cdn.example.com/src/app.js"
		);
		assert_eq!(
			resolve_source_url("https://cdn.example.com/app.min.js.map", "https://other.example.com/a.js"),
			"https://other.example.com/a.js"
		);
		assert_eq!(resolve_source_url("app.min.js.map", "app.js"), "app.js");
		assert_eq!(
			resolve_source_url("dist/js/app.min.js.map", "../../src/./app.js"),
			"src/app.js"
		);
		assert_eq!(resolve_source_url("/dist/app.min.js.map", "../src/app.js"), "/src/app.js");
		assert_eq!(resolve_source_url("dist/app.min.js.map", "/src/app.js"), "/src/app.js");
	}

	async fn resolve(sources: Arc<InMemorySources>) -> crate::resolver::ResolvedFrame {
		let resolver = SourceMapResolver::new(
			sources,
			Arc::new(SourceMapCache::new(4)),
			Duration::from_secs(5),
		);
		let frame = RawFrame {
			function_name: None,
			file_name: Some("dist/app.min.js".to_string()),
			line_number: Some(1),
			column_number: Some(0),
		};
		match resolver.resolve(&frame).await {
			Resolution::Resolved(resolved) => resolved,
			Resolution::Unresolved(reason) => panic!("unresolved: {reason}"),
		}
	}

	#[tokio::test]
	async fn prefers_inline_source() {
		let sources = Arc::new(
			InMemorySources::new()
				.with(
					"dist/app.min.js.map",
					r#"{"version":3,"sources":["../src/app.js"],"sourcesContent":["inline one\ninline two"],"mappings":"AACA"}"#,
				)
				.with("src/app.js", "remote one\nremote two"),
		);
		let resolved = resolve(Arc::clone(&sources)).await;

		let extractor = SnippetExtractor::new(sources, 5, Duration::from_secs(5));
		let snippet = extractor.extract(&resolved).await.unwrap();
		assert_eq!(snippet.header, "../src/app.js");
		assert_eq!(snippet.target().unwrap().text, "inline two");
	}

	#[tokio::test]
	async fn falls_back_to_remote_source() {
		let sources = Arc::new(
			InMemorySources::new()
				.with(
					"dist/app.min.js.map",
					r#"{"version":3,"sources":["../src/app.js"],"mappings":"AACA"}"#,
				)
				.with("src/app.js", "remote one\nremote two"),
		);
		let resolved = resolve(Arc::clone(&sources)).await;

		let extractor = SnippetExtractor::new(sources, 5, Duration::from_secs(5));
		let snippet = extractor.extract(&resolved).await.unwrap();
		assert_eq!(snippet.target().unwrap().text, "remote two");
		assert_eq!(snippet.span(), Some((1, 2)));
	}

	#[tokio::test]
	async fn missing_or_empty_source_yields_none() {
		let sources = Arc::new(InMemorySources::new().with(
			"dist/app.min.js.map",
			r#"{"version":3,"sources":["../src/app.js"],"sourcesContent":[""],"mappings":"AACA"}"#,
		));
		let resolved = resolve(Arc::clone(&sources)).await;

		let extractor = SnippetExtractor::new(Arc::clone(&sources), 5, Duration::from_secs(5));
		assert!(extractor.extract(&resolved).await.is_none());

		let sources = Arc::new(
			InMemorySources::new()
				.with(
					"dist/app.min.js.map",
					r#"{"version":3,"sources":["../src/app.js"],"mappings":"AACA"}"#,
				)
				.with("src/app.js", ""),
		);
		let resolved = resolve(Arc::clone(&sources)).await;
		let extractor = SnippetExtractor::new(sources, 5, Duration::from_secs(5));
		assert!(extractor.extract(&resolved).await.is_none());
	}

	proptest! {
		#[test]
		fn window_invariants(total in 1u32..200, target_seed in 0u32..200, context in 0usize..12) {
			let target = target_seed % total + 1;
			let body = extract_window(&numbered_source(total), target, context).unwrap();

			let expected_start = target.saturating_sub(context as u32).max(1);
			let expected_end = (target + context as u32).min(total);
			prop_assert_eq!(body.first().unwrap().line_number, expected_start);
			prop_assert_eq!(body.last().unwrap().line_number, expected_end);
			prop_assert_eq!(body.len() as u32, expected_end - expected_start + 1);
			prop_assert_eq!(body.iter().filter(|l| l.is_target).count(), 1);

			let target_line = body.iter().find(|l| l.is_target).unwrap();
			prop_assert_eq!(target_line.line_number, target);
			prop_assert_eq!(&target_line.text, &format!("line {target}"));
		}

		#[test]
		fn lines_past_end_have_no_window(total in 1u32..100, past in 1u32..50) {
			prop_assert!(extract_window(&numbered_source(total), total + past, 5).is_none());
		}
	}
}
