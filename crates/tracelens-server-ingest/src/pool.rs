// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::{IngestError, Result};

const SCHEMA: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS error_reports (
		id TEXT PRIMARY KEY,
		report_group TEXT NOT NULL,
		error_name TEXT NOT NULL,
		error_message TEXT NOT NULL,
		raw_stack TEXT NOT NULL,
		mapped_stack TEXT NOT NULL,
		location TEXT,
		metadata TEXT NOT NULL,
		status TEXT NOT NULL DEFAULT 'open',
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE INDEX IF NOT EXISTS idx_error_reports_group_created
		ON error_reports (report_group, created_at DESC)
	"#,
];

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./tracelens.db")
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Create the report tables if they do not exist yet.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	for statement in SCHEMA {
		sqlx::query(statement)
			.execute(pool)
			.await
			.map_err(|e| IngestError::Migration(e.to_string()))?;
	}
	tracing::debug!("report schema ready");
	Ok(())
}
