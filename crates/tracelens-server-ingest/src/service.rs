// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ingestion of client error reports and triage operations over them.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracelens_core::{parse_stack, ErrorReport, GeoLocation, ReportId, ReportStatus};
use tracelens_geocode::ReverseGeocoder;
use tracelens_symbolicate::{SourceFetcher, Symbolicator};
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestError, Result};
use crate::repository::ReportRepository;

pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// An error as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
	/// Grouping key the report is filed under
	pub group: String,
	/// `error.stack` as captured by the client
	pub stack: String,
	#[serde(default)]
	pub latitude: Option<f64>,
	#[serde(default)]
	pub longitude: Option<f64>,
	#[serde(default = "empty_object")]
	pub metadata: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
	serde_json::Value::Object(serde_json::Map::new())
}

/// Symbolicates, geocodes and persists incoming errors.
///
/// The repository, symbolicator and geocoder are owned by the caller and
/// shared with this service.
pub struct IngestService<F: SourceFetcher + ?Sized> {
	repository: Arc<dyn ReportRepository>,
	symbolicator: Arc<Symbolicator<F>>,
	geocoder: Arc<dyn ReverseGeocoder>,
}

impl<F: SourceFetcher + ?Sized> IngestService<F> {
	pub fn new(
		repository: Arc<dyn ReportRepository>,
		symbolicator: Arc<Symbolicator<F>>,
		geocoder: Arc<dyn ReverseGeocoder>,
	) -> Self {
		Self {
			repository,
			symbolicator,
			geocoder,
		}
	}

	/// Ingest one client error and return the stored report.
	///
	/// Symbolication failures never reject the report: it is stored with an
	/// empty mapped stack instead.
	#[instrument(skip(self, request), fields(group = %request.group, stack_bytes = request.stack.len()))]
	pub async fn ingest(&self, request: IngestRequest) -> Result<ErrorReport> {
		if request.group.trim().is_empty() {
			return Err(IngestError::InvalidRequest("group must not be empty".to_string()));
		}
		if request.stack.trim().is_empty() {
			return Err(IngestError::InvalidRequest("stack must not be empty".to_string()));
		}

		let (symbolicated, location) = tokio::join!(
			self.symbolicator.symbolicate(&request.stack),
			self.locate(request.latitude, request.longitude),
		);

		let (error_name, error_message, mapped_stack) = match symbolicated {
			Ok(report) => (report.error_name, report.error_message, report.entries),
			Err(e) => {
				warn!(error = %e, "symbolication failed, storing report without mapped stack");
				let header = parse_stack(request.stack.lines().next().unwrap_or_default());
				(header.name, header.message, Vec::new())
			}
		};

		let now = Utc::now();
		let report = ErrorReport {
			id: ReportId::new(),
			group: request.group,
			error_name,
			error_message,
			raw_stack: request.stack,
			mapped_stack,
			location,
			metadata: request.metadata,
			status: ReportStatus::Open,
			created_at: now,
			updated_at: now,
		};

		self.repository.create_report(&report).await?;

		info!(
			report_id = %report.id,
			error_name = %report.error_name,
			mapped_entries = report.mapped_stack.len(),
			located = report.location.is_some(),
			"ingested error report"
		);
		Ok(report)
	}

	async fn locate(&self, latitude: Option<f64>, longitude: Option<f64>) -> Option<GeoLocation> {
		let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
			debug!("no coordinates supplied, skipping geocode");
			return None;
		};

		let location = self.geocoder.reverse(latitude, longitude).await;
		(!location.is_empty()).then_some(location)
	}

	pub async fn get_report(&self, id: ReportId) -> Result<ErrorReport> {
		self.repository
			.get_report(id)
			.await?
			.ok_or_else(|| IngestError::ReportNotFound(id.to_string()))
	}

	pub async fn list_reports(&self, group: &str, limit: Option<u32>) -> Result<Vec<ErrorReport>> {
		self.repository
			.list_reports_for_group(group, limit.unwrap_or(DEFAULT_LIST_LIMIT))
			.await
	}

	#[instrument(skip(self), fields(report_id = %id, status = %status))]
	pub async fn set_status(&self, id: ReportId, status: ReportStatus) -> Result<()> {
		if !self.repository.update_status(id, status).await? {
			return Err(IngestError::ReportNotFound(id.to_string()));
		}
		info!("report status updated");
		Ok(())
	}

	#[instrument(skip(self), fields(report_id = %id))]
	pub async fn delete_report(&self, id: ReportId) -> Result<()> {
		if !self.repository.delete_report(id).await? {
			return Err(IngestError::ReportNotFound(id.to_string()));
		}
		info!("report deleted");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn delete_group(&self, group: &str) -> Result<u64> {
		let deleted = self.repository.delete_reports_for_group(group).await?;
		info!(deleted, "group reports deleted");
		Ok(deleted)
	}
}
