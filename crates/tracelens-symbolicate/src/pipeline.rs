// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end symbolication of a raw stack trace.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracelens_config::SymbolicateConfig;
use tracelens_core::{parse_stack, RawFrame, SymbolicatedFrame, SymbolicationReport};
use tracing::{debug, info, instrument, warn};

use crate::cache::SourceMapCache;
use crate::error::{FetchError, Result, SymbolicateError};
use crate::fetch::{HttpSourceFetcher, SourceFetcher};
use crate::resolver::{Resolution, SourceMapResolver};
use crate::snippet::SnippetExtractor;

/// Turns raw stack traces into symbolicated reports.
///
/// Holds the fetcher and map cache for the lifetime of the process; a single
/// instance is meant to be shared across requests.
pub struct Symbolicator<F: ?Sized> {
	resolver: SourceMapResolver<F>,
	extractor: SnippetExtractor<F>,
	config: SymbolicateConfig,
}

impl Symbolicator<HttpSourceFetcher> {
	/// Build a symbolicator that fetches maps and sources over HTTP.
	pub fn from_config(config: SymbolicateConfig) -> std::result::Result<Self, FetchError> {
		let mut fetcher = HttpSourceFetcher::new(config.fetch_timeout)?;
		if let Some(base_url) = config.base_url.as_deref() {
			fetcher = fetcher.with_base_url(base_url)?;
		}
		Ok(Self::new(Arc::new(fetcher), config))
	}
}

impl<F: SourceFetcher + ?Sized> Symbolicator<F> {
	pub fn new(fetcher: Arc<F>, config: SymbolicateConfig) -> Self {
		let cache = Arc::new(SourceMapCache::new(config.cache_capacity));
		Self::with_cache(fetcher, cache, config)
	}

	/// Build a symbolicator that shares `cache` with other instances.
	pub fn with_cache(fetcher: Arc<F>, cache: Arc<SourceMapCache>, config: SymbolicateConfig) -> Self {
		Self {
			resolver: SourceMapResolver::new(Arc::clone(&fetcher), cache, config.fetch_timeout),
			extractor: SnippetExtractor::new(fetcher, config.context_lines, config.fetch_timeout),
			config,
		}
	}

	pub fn cache(&self) -> &SourceMapCache {
		self.resolver.cache()
	}

	pub fn config(&self) -> &SymbolicateConfig {
		&self.config
	}

	/// Symbolicate `raw_stack`.
	///
	/// Frames that cannot be resolved or have no source text are left out;
	/// the remaining frames keep their original order. Only an oversized
	/// input is an error.
	#[instrument(skip_all, fields(stack_bytes = raw_stack.len()))]
	pub async fn symbolicate(&self, raw_stack: &str) -> Result<SymbolicationReport> {
		if raw_stack.len() > self.config.max_stack_bytes {
			return Err(SymbolicateError::InputTooLarge {
				size: raw_stack.len(),
				max: self.config.max_stack_bytes,
			});
		}

		let parsed = parse_stack(raw_stack);
		let total = parsed.frames.len();
		if total > self.config.max_frames {
			warn!(
				frames = total,
				max_frames = self.config.max_frames,
				"stack has too many frames, ignoring the rest"
			);
		}

		let frames: Vec<Option<SymbolicatedFrame>> = stream::iter(
			parsed
				.frames
				.iter()
				.take(self.config.max_frames)
				.enumerate(),
		)
		.map(|(index, frame)| self.symbolicate_frame(index, frame))
		.buffered(self.config.max_concurrent_fetches.max(1))
		.collect()
		.await;

		let mut report = SymbolicationReport::new(parsed.name, parsed.message);
		for frame in frames.into_iter().flatten() {
			report.push_frame(frame);
		}

		info!(
			error_name = %report.error_name,
			parsed_frames = total,
			symbolicated_frames = report.frame_count(),
			"symbolicated stack"
		);
		Ok(report)
	}

	async fn symbolicate_frame(&self, index: usize, frame: &RawFrame) -> Option<SymbolicatedFrame> {
		let resolved = match self.resolver.resolve(frame).await {
			Resolution::Resolved(resolved) => resolved,
			Resolution::Unresolved(reason) => {
				debug!(frame = index, %reason, "skipping frame");
				return None;
			}
		};

		let snippet = match self.extractor.extract(&resolved).await {
			Some(snippet) => snippet.render(),
			None if self.config.keep_frames_without_snippet => {
				debug!(frame = index, source = %resolved.position.source, "keeping frame without source text");
				String::new()
			}
			None => {
				debug!(frame = index, source = %resolved.position.source, "skipping frame without source text");
				return None;
			}
		};

		Some(SymbolicatedFrame::new(
			frame.function_name.clone(),
			resolved.to_position(),
			snippet,
		))
	}
}
