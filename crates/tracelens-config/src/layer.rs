// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, GeocodeConfigLayer, LoggingConfigLayer, SymbolicateConfigLayer,
};

/// Configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub symbolicate: Option<SymbolicateConfigLayer>,
	#[serde(default)]
	pub geocode: Option<GeocodeConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(
			&mut self.symbolicate,
			other.symbolicate,
			SymbolicateConfigLayer::merge,
		);
		merge_option(&mut self.geocode, other.geocode, GeocodeConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ConfigLayer::default();
		base.merge(ConfigLayer::default());
		assert!(base.symbolicate.is_none());
		assert!(base.geocode.is_none());
	}

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = ConfigLayer::default();
		base.merge(ConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
			}),
			..Default::default()
		});
		assert_eq!(
			base.database.and_then(|d| d.url).as_deref(),
			Some("sqlite::memory:")
		);
	}

	#[test]
	fn test_merge_nested_fields() {
		let mut base = ConfigLayer {
			symbolicate: Some(SymbolicateConfigLayer {
				context_lines: Some(3),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ConfigLayer {
			symbolicate: Some(SymbolicateConfigLayer {
				max_frames: Some(10),
				..Default::default()
			}),
			..Default::default()
		});

		let symbolicate = base.symbolicate.unwrap();
		assert_eq!(symbolicate.context_lines, Some(3));
		assert_eq!(symbolicate.max_frames, Some(10));
	}
}
