// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for symbolication operations.

use thiserror::Error;

/// Errors that can occur during symbolication.
///
/// Per-frame problems never surface here; they turn into dropped frames.
/// Only source map decoding and pipeline-level input checks produce errors.
#[derive(Debug, Error)]
pub enum SymbolicateError {
	#[error("Invalid source map JSON: {0}")]
	InvalidSourceMapJson(#[from] serde_json::Error),

	#[error("Invalid source map version: expected 3, got {0}")]
	InvalidSourceMapVersion(u32),

	#[error("Invalid VLQ character: {0:?}")]
	InvalidVlqChar(char),

	#[error("VLQ value does not fit in 32 bits")]
	VlqOverflow,

	#[error("VLQ sequence ends with a continuation digit")]
	UnterminatedVlq,

	#[error("Invalid mapping segment at generated line {line}: {reason}")]
	InvalidMapping { line: u32, reason: &'static str },

	#[error("Stack trace too large: {size} bytes (max: {max})")]
	InputTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, SymbolicateError>;

/// Errors raised while retrieving a source map or source file.
#[derive(Debug, Error)]
pub enum FetchError {
	/// The reference is neither an absolute URL nor joinable with the base URL.
	#[error("Invalid URL: {0}")]
	InvalidUrl(String),

	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("Fetch timed out: {0}")]
	Timeout(String),

	#[error("HTTP {status} fetching {url}")]
	Status { status: u16, url: String },

	#[error("Not found: {0}")]
	NotFound(String),
}
