// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for Tracelens.

pub mod database;
pub mod geocode;
pub mod logging;
pub mod symbolicate;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use geocode::{GeocodeConfig, GeocodeConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use symbolicate::{SymbolicateConfig, SymbolicateConfigLayer};
