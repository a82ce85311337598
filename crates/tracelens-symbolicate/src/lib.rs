// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack trace symbolication for Tracelens.
//!
//! This crate maps minified JavaScript stack frames back to original source:
//!
//! - [`vlq`]: Base64 VLQ decoding of source map `mappings`
//! - [`sourcemap`]: Source Map v3 parsing and position lookup
//! - [`fetch`]: retrieval of maps and sources ([`SourceFetcher`])
//! - [`resolver`]: per-frame resolution with a shared [`SourceMapCache`]
//! - [`snippet`]: windowed source excerpts around resolved lines
//! - [`pipeline`]: the [`Symbolicator`] tying it together
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracelens_config::SymbolicateConfig;
//! use tracelens_symbolicate::{InMemorySources, Symbolicator};
//!
//! let sources = InMemorySources::new().with("app.min.js.map", map_json);
//! let symbolicator = Symbolicator::new(Arc::new(sources), SymbolicateConfig::default());
//!
//! let report = symbolicator
//!     .symbolicate("TypeError: x is not a function\n    at foo (app.min.js:1:50)")
//!     .await?;
//! for frame in report.frames() {
//!     println!("{:?}:{:?}", frame.source, frame.line);
//! }
//! ```

pub mod cache;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod resolver;
pub mod snippet;
pub mod sourcemap;
pub mod vlq;

pub use cache::SourceMapCache;
pub use error::{FetchError, Result, SymbolicateError};
pub use fetch::{fetch_with_timeout, HttpSourceFetcher, InMemorySources, SourceFetcher};
pub use pipeline::Symbolicator;
pub use resolver::{map_url_for, Resolution, ResolvedFrame, SourceMapResolver, UnresolvedReason};
pub use snippet::{build_snippet, extract_window, resolve_source_url, SnippetExtractor};
pub use sourcemap::{OriginalPosition, SourceMapDocument};
