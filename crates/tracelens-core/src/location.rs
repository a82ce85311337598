// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Geographic context attached to error reports.

use serde::{Deserialize, Serialize};

/// Result of a reverse-geocoding lookup.
///
/// An empty location (all fields `None`) is what a failed lookup produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
	pub city: Option<String>,
	pub state: Option<String>,
	pub country: Option<String>,
}

impl GeoLocation {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.city.is_none() && self.state.is_none() && self.country.is_none()
	}

	/// Human-readable form, most specific part first.
	pub fn display_string(&self) -> Option<String> {
		let parts: Vec<&str> = [&self.city, &self.state, &self.country]
			.into_iter()
			.filter_map(|p| p.as_deref())
			.collect();

		if parts.is_empty() {
			None
		} else {
			Some(parts.join(", "))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_location_has_no_display() {
		let location = GeoLocation::empty();
		assert!(location.is_empty());
		assert_eq!(location.display_string(), None);
	}

	#[test]
	fn display_skips_missing_parts() {
		let location = GeoLocation {
			city: Some("Portland".to_string()),
			state: None,
			country: Some("United States".to_string()),
		};
		assert!(!location.is_empty());
		assert_eq!(
			location.display_string(),
			Some("Portland, United States".to_string())
		);
	}
}
