// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for ingestion and report storage.

use thiserror::Error;

/// Errors that can occur while ingesting or managing reports.
#[derive(Debug, Error)]
pub enum IngestError {
	#[error("report not found: {0}")]
	ReportNotFound(String),

	#[error("invalid request: {0}")]
	InvalidRequest(String),

	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("migration error: {0}")]
	Migration(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error(transparent)]
	Core(#[from] tracelens_core::CoreError),

	#[error("invalid datetime: {0}")]
	InvalidDateTime(String),
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
