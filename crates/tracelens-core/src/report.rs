// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Symbolication reports and the persisted error report document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;
use crate::frame::SymbolicatedFrame;
use crate::location::GeoLocation;

/// Marker placed between consecutive frames of a mapped stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Separator {
	pub separator: bool,
}

impl Default for Separator {
	fn default() -> Self {
		Self { separator: true }
	}
}

/// One entry of a mapped stack: a frame, or a `{ "separator": true }` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportEntry {
	Frame(SymbolicatedFrame),
	Separator(Separator),
}

/// Outcome of symbolicating one stack trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicationReport {
	pub error_name: String,
	pub error_message: String,
	/// Frames in original stack order, separators between them
	pub entries: Vec<ReportEntry>,
}

impl SymbolicationReport {
	pub fn new(error_name: impl Into<String>, error_message: impl Into<String>) -> Self {
		Self {
			error_name: error_name.into(),
			error_message: error_message.into(),
			entries: Vec::new(),
		}
	}

	/// Append a frame, inserting a separator if a frame precedes it.
	pub fn push_frame(&mut self, frame: SymbolicatedFrame) {
		if !self.entries.is_empty() {
			self.entries.push(ReportEntry::Separator(Separator::default()));
		}
		self.entries.push(ReportEntry::Frame(frame));
	}

	pub fn frames(&self) -> impl Iterator<Item = &SymbolicatedFrame> {
		self.entries.iter().filter_map(|e| match e {
			ReportEntry::Frame(f) => Some(f),
			ReportEntry::Separator(_) => None,
		})
	}

	pub fn frame_count(&self) -> usize {
		self.frames().count()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Unique identifier for a persisted error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub Uuid);

impl ReportId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for ReportId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ReportId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ReportId {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Triage state of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
	#[default]
	Open,
	Resolved,
	Ignored,
}

impl fmt::Display for ReportStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Open => write!(f, "open"),
			Self::Resolved => write!(f, "resolved"),
			Self::Ignored => write!(f, "ignored"),
		}
	}
}

impl FromStr for ReportStatus {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"open" => Ok(Self::Open),
			"resolved" => Ok(Self::Resolved),
			"ignored" => Ok(Self::Ignored),
			_ => Err(CoreError::InvalidReportStatus(s.to_string())),
		}
	}
}

/// A client error as persisted for triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
	pub id: ReportId,
	/// Caller-chosen grouping key (application, site, tenant...)
	pub group: String,

	pub error_name: String,
	pub error_message: String,
	/// Stack exactly as reported by the client
	pub raw_stack: String,
	/// Symbolicated frames with separators
	pub mapped_stack: Vec<ReportEntry>,

	pub location: Option<GeoLocation>,
	/// Free-form client context (user agent, page URL, ...)
	pub metadata: serde_json::Value,

	pub status: ReportStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Default for ErrorReport {
	fn default() -> Self {
		let now = Utc::now();
		Self {
			id: ReportId::new(),
			group: String::new(),
			error_name: String::new(),
			error_message: String::new(),
			raw_stack: String::new(),
			mapped_stack: Vec::new(),
			location: None,
			metadata: serde_json::Value::Object(serde_json::Map::new()),
			status: ReportStatus::Open,
			created_at: now,
			updated_at: now,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::frame::ResolvedPosition;
	use proptest::prelude::*;

	fn frame(line: u32) -> SymbolicatedFrame {
		SymbolicatedFrame::new(
			Some("f".to_string()),
			ResolvedPosition {
				source: Some("app.js".to_string()),
				line: Some(line),
				column: Some(0),
				name: None,
			},
			format!("app.js\n> {line:>5} | x"),
		)
	}

	#[test]
	fn separators_sit_between_frames_only() {
		let mut report = SymbolicationReport::new("TypeError", "boom");
		report.push_frame(frame(1));
		report.push_frame(frame(2));
		report.push_frame(frame(3));

		assert_eq!(report.entries.len(), 5);
		assert!(matches!(report.entries[0], ReportEntry::Frame(_)));
		assert!(matches!(report.entries[1], ReportEntry::Separator(_)));
		assert!(matches!(report.entries[4], ReportEntry::Frame(_)));
		assert_eq!(
			report.frames().map(|f| f.line).collect::<Vec<_>>(),
			vec![Some(1), Some(2), Some(3)]
		);
	}

	#[test]
	fn entries_use_stored_json_shape() {
		let mut report = SymbolicationReport::new("TypeError", "boom");
		report.push_frame(frame(1));
		report.push_frame(frame(2));

		let value = serde_json::to_value(&report.entries).unwrap();
		assert_eq!(value[1], serde_json::json!({ "separator": true }));
		assert_eq!(value[0]["source"], "app.js");
		assert_eq!(value[2]["line"], 2);

		let decoded: Vec<ReportEntry> = serde_json::from_value(value).unwrap();
		assert_eq!(decoded, report.entries);
	}

	#[test]
	fn status_parses_known_values() {
		assert_eq!("open".parse::<ReportStatus>().unwrap(), ReportStatus::Open);
		assert_eq!(
			"resolved".parse::<ReportStatus>().unwrap(),
			ReportStatus::Resolved
		);
		assert!(matches!(
			"closed".parse::<ReportStatus>(),
			Err(CoreError::InvalidReportStatus(_))
		));
	}

	proptest! {
		#[test]
		fn report_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let id = ReportId(Uuid::from_bytes(uuid_bytes));
			let parsed: ReportId = id.to_string().parse().unwrap();
			prop_assert_eq!(id, parsed);
		}
	}
}
