// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Tracelens error ingestion system.
//!
//! This crate provides the shared vocabulary used by the symbolication engine,
//! the ingest service and the CLI:
//!
//! - [`parse_stack`]: turns a raw client stack trace into [`RawFrame`]s
//! - [`ResolvedPosition`] and [`SymbolicatedFrame`]: source-mapped locations
//! - [`SourceSnippet`]: the line-numbered excerpt persisted with each frame
//! - [`SymbolicationReport`]: ordered frames with separator markers
//! - [`ErrorReport`]: the document persisted for later triage

pub mod error;
pub mod frame;
pub mod location;
pub mod report;
pub mod snippet;
pub mod stack;

pub use error::{CoreError, Result};
pub use frame::{RawFrame, ResolvedPosition, SymbolicatedFrame};
pub use location::GeoLocation;
pub use report::{ErrorReport, ReportEntry, ReportId, ReportStatus, Separator, SymbolicationReport};
pub use snippet::{SnippetLine, SourceSnippet, LINE_NUMBER_WIDTH};
pub use stack::{parse_stack, ParsedStack, DEFAULT_ERROR_NAME};
