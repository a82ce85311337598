// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, GeocodeConfigLayer, LoggingConfigLayer, SymbolicateConfigLayer,
};

/// Default location of the system-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tracelens/config.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: TRACELENS_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ConfigLayer {
			symbolicate: Some(load_symbolicate_from_env()?),
			geocode: Some(load_geocode_from_env()?),
			database: Some(DatabaseConfigLayer {
				url: env_var("TRACELENS_DATABASE_URL"),
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("TRACELENS_LOG_LEVEL"),
			}),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_symbolicate_from_env() -> Result<SymbolicateConfigLayer, ConfigError> {
	Ok(SymbolicateConfigLayer {
		fetch_timeout_secs: env_u64("TRACELENS_SYMBOLICATE_FETCH_TIMEOUT_SECS")?,
		context_lines: env_usize("TRACELENS_SYMBOLICATE_CONTEXT_LINES")?,
		max_concurrent_fetches: env_usize("TRACELENS_SYMBOLICATE_MAX_CONCURRENT_FETCHES")?,
		cache_capacity: env_usize("TRACELENS_SYMBOLICATE_CACHE_CAPACITY")?,
		max_stack_bytes: env_usize("TRACELENS_SYMBOLICATE_MAX_STACK_BYTES")?,
		max_frames: env_usize("TRACELENS_SYMBOLICATE_MAX_FRAMES")?,
		base_url: env_var("TRACELENS_SYMBOLICATE_BASE_URL"),
		keep_frames_without_snippet: env_bool("TRACELENS_SYMBOLICATE_KEEP_FRAMES_WITHOUT_SNIPPET"),
	})
}

fn load_geocode_from_env() -> Result<GeocodeConfigLayer, ConfigError> {
	Ok(GeocodeConfigLayer {
		base_url: env_var("TRACELENS_GEOCODE_BASE_URL"),
		timeout_secs: env_u64("TRACELENS_GEOCODE_TIMEOUT_SECS")?,
		user_agent: env_var("TRACELENS_GEOCODE_USER_AGENT"),
	})
}
