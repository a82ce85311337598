// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reverse-geocoding configuration section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeocodeConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub user_agent: Option<String>,
}

impl GeocodeConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.user_agent.is_some() {
			self.user_agent = other.user_agent;
		}
	}

	/// Geocoding is only enabled when a service URL is configured.
	pub fn finalize(self) -> Option<GeocodeConfig> {
		let base_url = self.base_url.filter(|u| !u.is_empty())?;
		Some(GeocodeConfig {
			base_url,
			timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_GEOCODE_TIMEOUT_SECS)),
			user_agent: self.user_agent,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeConfig {
	pub base_url: String,
	pub timeout: Duration,
	pub user_agent: Option<String>,
}
