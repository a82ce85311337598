// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded cache of parsed source maps keyed by map URL.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::sourcemap::SourceMapDocument;

#[derive(Debug, Default)]
struct CacheInner {
	maps: HashMap<String, Arc<SourceMapDocument>>,
	/// Insertion order, oldest first.
	order: VecDeque<String>,
}

/// Parsed source maps shared across requests.
///
/// Entries are evicted oldest-first once `capacity` is reached. A capacity
/// of zero disables caching.
#[derive(Debug)]
pub struct SourceMapCache {
	inner: Mutex<CacheInner>,
	capacity: usize,
}

impl SourceMapCache {
	pub fn new(capacity: usize) -> Self {
		Self {
			inner: Mutex::new(CacheInner::default()),
			capacity,
		}
	}

	fn lock(&self) -> MutexGuard<'_, CacheInner> {
		// A panic while holding the lock cannot leave the map half-updated.
		self.inner.lock().unwrap_or_else(|e| e.into_inner())
	}

	pub fn get(&self, map_url: &str) -> Option<Arc<SourceMapDocument>> {
		let hit = self.lock().maps.get(map_url).cloned();
		trace!(map_url, hit = hit.is_some(), "source map cache lookup");
		hit
	}

	pub fn insert(&self, map_url: &str, map: Arc<SourceMapDocument>) {
		if self.capacity == 0 {
			return;
		}

		let mut inner = self.lock();
		if inner.maps.insert(map_url.to_string(), map).is_some() {
			return;
		}
		inner.order.push_back(map_url.to_string());

		while inner.order.len() > self.capacity {
			if let Some(oldest) = inner.order.pop_front() {
				trace!(map_url = %oldest, "evicting source map");
				inner.maps.remove(&oldest);
			}
		}
	}

	/// Drop one map, e.g. after a redeploy replaced it.
	pub fn invalidate(&self, map_url: &str) -> bool {
		let mut inner = self.lock();
		inner.order.retain(|u| u != map_url);
		inner.maps.remove(map_url).is_some()
	}

	pub fn clear(&self) {
		let mut inner = self.lock();
		inner.maps.clear();
		inner.order.clear();
	}

	pub fn len(&self) -> usize {
		self.lock().maps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
}
