// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository layer for error report storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::instrument;

use tracelens_core::{ErrorReport, ReportId, ReportStatus};

use crate::error::{IngestError, Result};

/// Document store for error reports.
#[async_trait]
pub trait ReportRepository: Send + Sync {
	async fn create_report(&self, report: &ErrorReport) -> Result<()>;
	async fn get_report(&self, id: ReportId) -> Result<Option<ErrorReport>>;
	/// Newest first.
	async fn list_reports_for_group(&self, group: &str, limit: u32) -> Result<Vec<ErrorReport>>;
	/// Returns `false` when no report has this id.
	async fn update_report(&self, report: &ErrorReport) -> Result<bool>;
	async fn update_status(&self, id: ReportId, status: ReportStatus) -> Result<bool>;
	async fn delete_report(&self, id: ReportId) -> Result<bool>;
	/// Returns the number of reports removed.
	async fn delete_reports_for_group(&self, group: &str) -> Result<u64>;
}

/// SQLite implementation of the report repository.
#[derive(Clone)]
pub struct SqliteReportRepository {
	pool: SqlitePool,
}

impl SqliteReportRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

#[async_trait]
impl ReportRepository for SqliteReportRepository {
	#[instrument(skip(self, report), fields(report_id = %report.id, group = %report.group))]
	async fn create_report(&self, report: &ErrorReport) -> Result<()> {
		let mapped_stack_json = serde_json::to_string(&report.mapped_stack)?;
		let location_json = report
			.location
			.as_ref()
			.map(serde_json::to_string)
			.transpose()?;
		let metadata_json = serde_json::to_string(&report.metadata)?;

		sqlx::query(
			r#"
			INSERT INTO error_reports (
				id, report_group, error_name, error_message,
				raw_stack, mapped_stack, location, metadata,
				status, created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(report.id.to_string())
		.bind(&report.group)
		.bind(&report.error_name)
		.bind(&report.error_message)
		.bind(&report.raw_stack)
		.bind(&mapped_stack_json)
		.bind(&location_json)
		.bind(&metadata_json)
		.bind(report.status.to_string())
		.bind(report.created_at.to_rfc3339())
		.bind(report.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(report_id = %id))]
	async fn get_report(&self, id: ReportId) -> Result<Option<ErrorReport>> {
		let row = sqlx::query_as::<_, ReportRow>(
			r#"
			SELECT id, report_group, error_name, error_message,
				   raw_stack, mapped_stack, location, metadata,
				   status, created_at, updated_at
			FROM error_reports
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn list_reports_for_group(&self, group: &str, limit: u32) -> Result<Vec<ErrorReport>> {
		let rows = sqlx::query_as::<_, ReportRow>(
			r#"
			SELECT id, report_group, error_name, error_message,
				   raw_stack, mapped_stack, location, metadata,
				   status, created_at, updated_at
			FROM error_reports
			WHERE report_group = ?
			ORDER BY created_at DESC, id DESC
			LIMIT ?
			"#,
		)
		.bind(group)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self, report), fields(report_id = %report.id))]
	async fn update_report(&self, report: &ErrorReport) -> Result<bool> {
		let mapped_stack_json = serde_json::to_string(&report.mapped_stack)?;
		let location_json = report
			.location
			.as_ref()
			.map(serde_json::to_string)
			.transpose()?;
		let metadata_json = serde_json::to_string(&report.metadata)?;

		let result = sqlx::query(
			r#"
			UPDATE error_reports SET
				report_group = ?, error_name = ?, error_message = ?,
				raw_stack = ?, mapped_stack = ?, location = ?, metadata = ?,
				status = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&report.group)
		.bind(&report.error_name)
		.bind(&report.error_message)
		.bind(&report.raw_stack)
		.bind(&mapped_stack_json)
		.bind(&location_json)
		.bind(&metadata_json)
		.bind(report.status.to_string())
		.bind(report.updated_at.to_rfc3339())
		.bind(report.id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self), fields(report_id = %id, status = %status))]
	async fn update_status(&self, id: ReportId, status: ReportStatus) -> Result<bool> {
		let result = sqlx::query(
			r#"
			UPDATE error_reports SET status = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(status.to_string())
		.bind(Utc::now().to_rfc3339())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self), fields(report_id = %id))]
	async fn delete_report(&self, id: ReportId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM error_reports WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self))]
	async fn delete_reports_for_group(&self, group: &str) -> Result<u64> {
		let result = sqlx::query("DELETE FROM error_reports WHERE report_group = ?")
			.bind(group)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}
}

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
	id: String,
	report_group: String,
	error_name: String,
	error_message: String,
	raw_stack: String,
	mapped_stack: String,
	location: Option<String>,
	metadata: String,
	status: String,
	created_at: String,
	updated_at: String,
}

impl TryFrom<ReportRow> for ErrorReport {
	type Error = IngestError;

	fn try_from(row: ReportRow) -> Result<Self> {
		Ok(ErrorReport {
			id: row.id.parse()?,
			group: row.report_group,
			error_name: row.error_name,
			error_message: row.error_message,
			raw_stack: row.raw_stack,
			mapped_stack: serde_json::from_str(&row.mapped_stack)?,
			location: row
				.location
				.map(|s| serde_json::from_str(&s))
				.transpose()?,
			metadata: serde_json::from_str(&row.metadata)?,
			status: row.status.parse()?,
			created_at: parse_datetime(&row.created_at)?,
			updated_at: parse_datetime(&row.updated_at)?,
		})
	}
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|_| IngestError::InvalidDateTime(s.to_string()))
}

/// In-process repository for tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct InMemoryReportRepository {
	reports: RwLock<HashMap<ReportId, ErrorReport>>,
}

impl InMemoryReportRepository {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
	async fn create_report(&self, report: &ErrorReport) -> Result<()> {
		let mut reports = self.reports.write().await;
		if reports.contains_key(&report.id) {
			return Err(IngestError::InvalidRequest(format!(
				"duplicate report id: {}",
				report.id
			)));
		}
		reports.insert(report.id, report.clone());
		Ok(())
	}

	async fn get_report(&self, id: ReportId) -> Result<Option<ErrorReport>> {
		Ok(self.reports.read().await.get(&id).cloned())
	}

	async fn list_reports_for_group(&self, group: &str, limit: u32) -> Result<Vec<ErrorReport>> {
		let reports = self.reports.read().await;
		let mut matching: Vec<ErrorReport> = reports
			.values()
			.filter(|r| r.group == group)
			.cloned()
			.collect();
		matching.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| b.id.0.cmp(&a.id.0))
		});
		matching.truncate(limit as usize);
		Ok(matching)
	}

	async fn update_report(&self, report: &ErrorReport) -> Result<bool> {
		let mut reports = self.reports.write().await;
		match reports.get_mut(&report.id) {
			Some(existing) => {
				let created_at = existing.created_at;
				*existing = report.clone();
				existing.created_at = created_at;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	async fn update_status(&self, id: ReportId, status: ReportStatus) -> Result<bool> {
		let mut reports = self.reports.write().await;
		match reports.get_mut(&id) {
			Some(report) => {
				report.status = status;
				report.updated_at = Utc::now();
				Ok(true)
			}
			None => Ok(false),
		}
	}

	async fn delete_report(&self, id: ReportId) -> Result<bool> {
		Ok(self.reports.write().await.remove(&id).is_some())
	}

	async fn delete_reports_for_group(&self, group: &str) -> Result<u64> {
		let mut reports = self.reports.write().await;
		let before = reports.len();
		reports.retain(|_, r| r.group != group);
		Ok((before - reports.len()) as u64)
	}
}
