// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

/// Creates a new HTTP client builder with the standard Tracelens User-Agent.
///
/// Use this when you need to customize the client further.
///
/// # Example
/// ```ignore
/// let client = tracelens_common_http::builder()
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client builder with a custom User-Agent header.
///
/// Some public geocoding services require an identifying User-Agent per
/// deployment.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	Client::builder().user_agent(user_agent.into())
}

/// Creates a client whose requests (connect, headers and body) are bounded by
/// `timeout`.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	debug!(timeout_ms = timeout.as_millis() as u64, "building HTTP client");
	builder().timeout(timeout).build()
}

/// Returns the standard Tracelens User-Agent string.
///
/// Format: `tracelens/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"tracelens/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
