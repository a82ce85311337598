// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Tracelens.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`TRACELENS_*`)
//!
//! # Usage
//!
//! ```ignore
//! use tracelens_config::load_config;
//!
//! let config = load_config()?;
//! println!("fetch timeout: {:?}", config.symbolicate.fetch_timeout);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;
use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
	pub symbolicate: SymbolicateConfig,
	/// `None` disables reverse geocoding
	pub geocode: Option<GeocodeConfig>,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`TRACELENS_*`)
/// 2. Config file (`/etc/tracelens/config.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<Config, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<Config, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and finalize the result.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<Config, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ConfigLayer) -> Result<Config, ConfigError> {
	let symbolicate = layer.symbolicate.unwrap_or_default().finalize();
	let geocode = layer.geocode.and_then(|l| l.finalize());
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&symbolicate, geocode.as_ref())?;

	info!(
		fetch_timeout_ms = symbolicate.fetch_timeout.as_millis() as u64,
		max_concurrent_fetches = symbolicate.max_concurrent_fetches,
		cache_capacity = symbolicate.cache_capacity,
		base_url_configured = symbolicate.base_url.is_some(),
		geocode_configured = geocode.is_some(),
		database = %database.url,
		"Configuration loaded"
	);

	Ok(Config {
		symbolicate,
		geocode,
		database,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(
	symbolicate: &SymbolicateConfig,
	geocode: Option<&GeocodeConfig>,
) -> Result<(), ConfigError> {
	if symbolicate.fetch_timeout.is_zero() {
		return Err(ConfigError::Validation(
			"symbolicate.fetch_timeout_secs must be greater than zero; an unbounded fetch can stall ingestion"
				.to_string(),
		));
	}

	if symbolicate.max_concurrent_fetches == 0 {
		return Err(ConfigError::Validation(
			"symbolicate.max_concurrent_fetches must be at least 1".to_string(),
		));
	}

	if let Some(geocode) = geocode {
		if geocode.timeout.is_zero() {
			return Err(ConfigError::Validation(
				"geocode.timeout_secs must be greater than zero".to_string(),
			));
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use std::time::Duration;

	#[test]
	fn test_zero_timeout_rejected() {
		let symbolicate = SymbolicateConfig {
			fetch_timeout: Duration::ZERO,
			..Default::default()
		};
		let result = validate_config(&symbolicate, None);
		assert!(result.unwrap_err().to_string().contains("fetch_timeout_secs"));
	}

	#[test]
	fn test_zero_concurrency_rejected() {
		let symbolicate = SymbolicateConfig {
			max_concurrent_fetches: 0,
			..Default::default()
		};
		assert!(validate_config(&symbolicate, None).is_err());
	}

	#[test]
	fn test_defaults_are_valid() {
		assert!(validate_config(&SymbolicateConfig::default(), None).is_ok());
	}

	#[test]
	fn test_file_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[symbolicate]\ncontext_lines = 2\n\n[logging]\nlevel = \"debug\""
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert_eq!(config.symbolicate.context_lines, 2);
		assert_eq!(config.symbolicate.max_frames, 100);
		assert_eq!(config.logging.level, "debug");
		assert!(config.geocode.is_none());
	}
}
