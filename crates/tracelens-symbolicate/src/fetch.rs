// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retrieval of source maps and remote source files.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::FetchError;

/// Fetches the text behind a file reference.
///
/// References come straight from stack frames and source maps, so they may
/// be absolute URLs or paths relative to wherever the bundle is served.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
	async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Run `fetcher` with an upper time bound, mapping expiry to
/// [`FetchError::Timeout`].
pub async fn fetch_with_timeout<F: SourceFetcher + ?Sized>(
	fetcher: &F,
	url: &str,
	timeout: Duration,
) -> Result<String, FetchError> {
	match tokio::time::timeout(timeout, fetcher.fetch_text(url)).await {
		Ok(result) => result,
		Err(_) => Err(FetchError::Timeout(url.to_string())),
	}
}

/// HTTP fetcher. Sends `Cache-Control: no-cache` so deploys are picked up
/// immediately and never retries.
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
	http_client: Client,
	base_url: Option<Url>,
}

impl HttpSourceFetcher {
	pub fn new(timeout: Duration) -> Result<Self, FetchError> {
		let http_client = tracelens_common_http::new_client_with_timeout(timeout)?;
		Ok(Self {
			http_client,
			base_url: None,
		})
	}

	/// Join relative references onto `base_url` before fetching.
	pub fn with_base_url(mut self, base_url: &str) -> Result<Self, FetchError> {
		let mut base = Url::parse(base_url).map_err(|_| FetchError::InvalidUrl(base_url.to_string()))?;
		// Url::join replaces the last path segment unless the base ends in '/'.
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}
		self.base_url = Some(base);
		Ok(self)
	}

	fn resolve(&self, reference: &str) -> Result<Url, FetchError> {
		if let Ok(url) = Url::parse(reference) {
			return Ok(url);
		}
		self.base_url
			.as_ref()
			.and_then(|base| base.join(reference.trim_start_matches("./")).ok())
			.ok_or_else(|| FetchError::InvalidUrl(reference.to_string()))
	}
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
	#[instrument(skip(self))]
	async fn fetch_text(&self, reference: &str) -> Result<String, FetchError> {
		let url = self.resolve(reference)?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(FetchError::InvalidUrl(url.to_string()));
		}

		debug!(url = %url, "fetching");
		let response = self
			.http_client
			.get(url.clone())
			.header(CACHE_CONTROL, "no-cache")
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					warn!(url = %url, "fetch timed out");
					return FetchError::Timeout(url.to_string());
				}
				warn!(url = %url, error = %e, "network error during fetch");
				FetchError::Network(e)
			})?;

		let status = response.status();
		if !status.is_success() {
			debug!(url = %url, status = %status, "fetch returned error status");
			return Err(FetchError::Status {
				status: status.as_u16(),
				url: url.to_string(),
			});
		}

		response.text().await.map_err(|e| {
			if e.is_timeout() {
				FetchError::Timeout(url.to_string())
			} else {
				FetchError::Network(e)
			}
		})
	}
}

/// Fetcher backed by a map of reference to text. Useful for tests and for
/// symbolicating against artifacts already on disk.
#[derive(Debug, Clone, Default)]
pub struct InMemorySources {
	files: HashMap<String, String>,
}

impl InMemorySources {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, url: impl Into<String>, content: impl Into<String>) {
		self.files.insert(url.into(), content.into());
	}

	pub fn with(mut self, url: impl Into<String>, content: impl Into<String>) -> Self {
		self.add(url, content);
		self
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}

#[async_trait]
impl SourceFetcher for InMemorySources {
	async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
		self.files
			.get(url)
			.cloned()
			.ok_or_else(|| FetchError::NotFound(url.to_string()))
	}
}
