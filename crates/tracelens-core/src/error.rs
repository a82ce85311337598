// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for core Tracelens types.

use thiserror::Error;

/// Errors raised when decoding core types from their textual forms.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid report status: {0}")]
	InvalidReportStatus(String),

	#[error("invalid report id: {0}")]
	InvalidReportId(#[from] uuid::Error),

	#[error("invalid snippet: {0}")]
	InvalidSnippet(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
