// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reverse geocoding for Tracelens.
//!
//! Error reports may carry the client's coordinates. This crate turns them
//! into a coarse `{city, state, country}` location using a Nominatim
//! compatible `/reverse` endpoint. Lookups never fail from the caller's
//! point of view: any problem yields an empty [`GeoLocation`].
//!
//! # Usage
//!
//! ```ignore
//! use tracelens_geocode::{HttpReverseGeocoder, ReverseGeocoder};
//!
//! let geocoder = HttpReverseGeocoder::new(&geocode_config)?;
//! let location = geocoder.reverse(52.52, 13.405).await;
//! println!("{:?}", location.display_string());
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracelens_config::GeocodeConfig;
use tracelens_core::GeoLocation;
use tracing::{debug, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
	#[error("Invalid coordinates: lat={latitude}, lon={longitude}")]
	InvalidCoordinates { latitude: f64, longitude: f64 },

	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("Geocode request timed out")]
	Timeout,

	#[error("Geocode API error: {status}")]
	ApiError { status: u16 },

	#[error("Geocoder could not resolve location: {0}")]
	NoResult(String),
}

pub type Result<T> = std::result::Result<T, GeocodeError>;

/// Resolves coordinates to a coarse location.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
	/// Returns an empty location on any failure.
	async fn reverse(&self, latitude: f64, longitude: f64) -> GeoLocation;
}

/// Geocoder used when no service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGeocoder;

#[async_trait]
impl ReverseGeocoder for NoopGeocoder {
	async fn reverse(&self, _latitude: f64, _longitude: f64) -> GeoLocation {
		GeoLocation::empty()
	}
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
	#[serde(default)]
	address: Option<Address>,
	#[serde(default)]
	error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Address {
	city: Option<String>,
	town: Option<String>,
	village: Option<String>,
	hamlet: Option<String>,
	state: Option<String>,
	country: Option<String>,
}

/// Client for a Nominatim-style reverse geocoding service.
#[derive(Debug, Clone)]
pub struct HttpReverseGeocoder {
	http_client: Client,
	base_url: String,
}

impl HttpReverseGeocoder {
	pub fn new(config: &GeocodeConfig) -> Result<Self> {
		let builder = match config.user_agent.as_deref() {
			Some(ua) => tracelens_common_http::builder_with_user_agent(ua),
			None => tracelens_common_http::builder(),
		};
		let http_client = builder.timeout(config.timeout).build()?;

		Ok(Self {
			http_client,
			base_url: config.base_url.trim_end_matches('/').to_string(),
		})
	}

	/// Shorthand for tests and ad-hoc use.
	pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
		Self::new(&GeocodeConfig {
			base_url: base_url.into(),
			timeout,
			user_agent: None,
		})
	}

	/// Fallible lookup; [`ReverseGeocoder::reverse`] wraps this.
	#[instrument(skip(self))]
	pub async fn lookup(&self, latitude: f64, longitude: f64) -> Result<GeoLocation> {
		if !valid_coordinates(latitude, longitude) {
			return Err(GeocodeError::InvalidCoordinates { latitude, longitude });
		}

		let url = format!("{}/reverse", self.base_url);
		debug!(url = %url, "sending reverse geocode request");

		let response = self
			.http_client
			.get(&url)
			.query(&[
				("format", "jsonv2".to_string()),
				("lat", latitude.to_string()),
				("lon", longitude.to_string()),
			])
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					return GeocodeError::Timeout;
				}
				GeocodeError::Network(e)
			})?;

		let status = response.status();
		if !status.is_success() {
			return Err(GeocodeError::ApiError {
				status: status.as_u16(),
			});
		}

		let body: ReverseResponse = response.json().await?;
		if let Some(error) = body.error {
			return Err(GeocodeError::NoResult(error));
		}

		let Some(address) = body.address else {
			return Ok(GeoLocation::empty());
		};

		Ok(GeoLocation {
			city: address
				.city
				.or(address.town)
				.or(address.village)
				.or(address.hamlet),
			state: address.state,
			country: address.country,
		})
	}
}

#[async_trait]
impl ReverseGeocoder for HttpReverseGeocoder {
	async fn reverse(&self, latitude: f64, longitude: f64) -> GeoLocation {
		match self.lookup(latitude, longitude).await {
			Ok(location) => location,
			Err(e) => {
				warn!(error = %e, "reverse geocoding failed, continuing without location");
				GeoLocation::empty()
			}
		}
	}
}

fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
	latitude.is_finite()
		&& longitude.is_finite()
		&& (-90.0..=90.0).contains(&latitude)
		&& (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn geocoder(server: &MockServer) -> HttpReverseGeocoder {
		HttpReverseGeocoder::with_base_url(server.uri(), Duration::from_secs(5)).unwrap()
	}

	#[tokio::test]
	async fn resolves_city_state_country() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/reverse"))
			.and(query_param("format", "jsonv2"))
			.and(query_param("lat", "52.52"))
			.and(query_param("lon", "13.405"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"address": {"city": "Berlin", "state": "Berlin", "country": "Germany"}
			})))
			.expect(1)
			.mount(&server)
			.await;

		let location = geocoder(&server).reverse(52.52, 13.405).await;
		assert_eq!(location.city.as_deref(), Some("Berlin"));
		assert_eq!(location.state.as_deref(), Some("Berlin"));
		assert_eq!(location.country.as_deref(), Some("Germany"));
	}

	#[tokio::test]
	async fn falls_back_to_town() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"address": {"town": "Hallstatt", "state": "Upper Austria", "country": "Austria"}
			})))
			.mount(&server)
			.await;

		let location = geocoder(&server).reverse(47.56, 13.64).await;
		assert_eq!(location.city.as_deref(), Some("Hallstatt"));
	}

	#[tokio::test]
	async fn failures_yield_empty_location() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(503))
			.mount(&server)
			.await;

		let geocoder = geocoder(&server);
		assert!(matches!(
			geocoder.lookup(1.0, 1.0).await,
			Err(GeocodeError::ApiError { status: 503 })
		));
		assert!(geocoder.reverse(1.0, 1.0).await.is_empty());
	}

	#[tokio::test]
	async fn unresolvable_ocean_coordinates() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(serde_json::json!({"error": "Unable to geocode"})),
			)
			.mount(&server)
			.await;

		let geocoder = geocoder(&server);
		assert!(matches!(
			geocoder.lookup(0.0, -30.0).await,
			Err(GeocodeError::NoResult(_))
		));
		assert!(geocoder.reverse(0.0, -30.0).await.is_empty());
	}

	#[tokio::test]
	async fn invalid_coordinates_skip_the_request() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		let geocoder = geocoder(&server);
		assert!(matches!(
			geocoder.lookup(91.0, 0.0).await,
			Err(GeocodeError::InvalidCoordinates { .. })
		));
		assert!(geocoder.reverse(f64::NAN, 0.0).await.is_empty());
	}

	#[tokio::test]
	async fn slow_service_times_out() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
			.mount(&server)
			.await;

		let geocoder =
			HttpReverseGeocoder::with_base_url(server.uri(), Duration::from_millis(50)).unwrap();
		assert!(matches!(
			geocoder.lookup(1.0, 1.0).await,
			Err(GeocodeError::Timeout)
		));
	}

	#[tokio::test]
	async fn noop_returns_empty() {
		assert!(NoopGeocoder.reverse(52.52, 13.405).await.is_empty());
	}
}
