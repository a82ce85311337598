// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error report ingestion for Tracelens.
//!
//! [`IngestService`] takes a client error, symbolicates its stack, attaches a
//! coarse location and stores the resulting [`ErrorReport`] through a
//! [`ReportRepository`]. The same service exposes the triage operations used
//! to list, resolve and delete reports.
//!
//! [`ErrorReport`]: tracelens_core::ErrorReport

pub mod error;
pub mod pool;
pub mod repository;
pub mod service;

pub use error::{IngestError, Result};
pub use pool::{create_pool, run_migrations};
pub use repository::{InMemoryReportRepository, ReportRepository, SqliteReportRepository};
pub use service::{IngestRequest, IngestService, DEFAULT_LIST_LIMIT};
