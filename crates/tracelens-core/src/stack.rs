// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parsing of client-reported JavaScript stack traces.
//!
//! The first line is the `"<Name>: <Message>"` header. Every following line
//! is matched against the frame syntaxes emitted by V8
//! (`at fn (file:line:col)`, `at file:line:col`) and by SpiderMonkey and
//! JavaScriptCore (`fn@file:line:col`). Lines that match neither are skipped.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::frame::RawFrame;

/// Error name used when the header line carries no `Name:` prefix.
pub const DEFAULT_ERROR_NAME: &str = "Error";

static V8_FRAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*at\s+(?:(?P<func>.+?)\s+\((?P<loc>[^()]*(?:\([^()]*\)[^()]*)*)\)|(?P<bare>\S.*?))\s*$")
		.expect("valid V8 frame regex")
});

static GECKO_FRAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*(?P<func>[^@\s]*)@(?P<loc>\S.*?)\s*$").expect("valid Gecko frame regex")
});

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?P<file>.+?):(?P<line>\d+)(?::(?P<col>\d+))?$").expect("valid location regex")
});

/// A stack trace split into its header and frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStack {
	pub name: String,
	pub message: String,
	/// Frames in the order they appeared in the trace
	pub frames: Vec<RawFrame>,
}

/// Parse a raw stack trace. Never fails: malformed input degrades to a
/// best-effort header and fewer (possibly zero) frames.
pub fn parse_stack(stack: &str) -> ParsedStack {
	let mut lines = stack.lines();
	let (name, message) = parse_header(lines.next().unwrap_or_default());

	let frames = lines
		.filter_map(|line| {
			let frame = parse_frame_line(line);
			if frame.is_none() && !line.trim().is_empty() {
				trace!(line = %line, "skipping unrecognised stack line");
			}
			frame
		})
		.collect();

	ParsedStack {
		name,
		message,
		frames,
	}
}

fn parse_header(line: &str) -> (String, String) {
	match line.split_once(':') {
		Some((name, message)) => (name.trim().to_string(), message.trim().to_string()),
		None => (DEFAULT_ERROR_NAME.to_string(), line.trim().to_string()),
	}
}

/// Parse a single frame line, or `None` if it uses no known syntax.
pub fn parse_frame_line(line: &str) -> Option<RawFrame> {
	if let Some(caps) = V8_FRAME.captures(line) {
		if let Some(bare) = caps.name("bare") {
			return Some(match split_location(bare.as_str()) {
				Some(frame) => frame,
				None => RawFrame {
					function_name: Some(bare.as_str().to_string()),
					..RawFrame::default()
				},
			});
		}

		let function_name = caps.name("func").map(|m| m.as_str().to_string());
		let location = caps.name("loc").map(|m| m.as_str()).unwrap_or_default();
		let mut frame = split_location(location).unwrap_or_default();
		frame.function_name = function_name;
		return Some(frame);
	}

	let caps = GECKO_FRAME.captures(line)?;
	let function_name = caps
		.name("func")
		.map(|m| m.as_str())
		.filter(|f| !f.is_empty())
		.map(str::to_string);
	let location = caps.name("loc").map(|m| m.as_str()).unwrap_or_default();
	let mut frame = split_location(location).unwrap_or_default();
	frame.function_name = function_name;
	Some(frame)
}

/// Split `file:line[:col]` into a frame with no function name.
fn split_location(location: &str) -> Option<RawFrame> {
	let caps = LOCATION.captures(location.trim())?;
	let file = caps.name("file")?.as_str();
	let line_number = caps
		.name("line")
		.and_then(|m| m.as_str().parse::<u32>().ok())
		.filter(|&l| l >= 1);
	let column_number = caps.name("col").and_then(|m| m.as_str().parse().ok());

	Some(RawFrame {
		function_name: None,
		file_name: Some(file.to_string()),
		line_number,
		column_number,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn frame(func: Option<&str>, file: &str, line: u32, col: u32) -> RawFrame {
		RawFrame {
			function_name: func.map(str::to_string),
			file_name: Some(file.to_string()),
			line_number: Some(line),
			column_number: Some(col),
		}
	}

	#[test]
	fn parses_header_and_v8_frames() {
		let stack = "TypeError: x is not a function\n    at foo (app.min.js:1:50)\n    at https://cdn.example.com/vendor.js:3:1200";
		let parsed = parse_stack(stack);

		assert_eq!(parsed.name, "TypeError");
		assert_eq!(parsed.message, "x is not a function");
		assert_eq!(
			parsed.frames,
			vec![
				frame(Some("foo"), "app.min.js", 1, 50),
				frame(None, "https://cdn.example.com/vendor.js", 3, 1200),
			]
		);
	}

	#[test]
	fn header_without_colon_defaults_name() {
		let parsed = parse_stack("something went wrong\n    at a (b.js:1:1)");
		assert_eq!(parsed.name, DEFAULT_ERROR_NAME);
		assert_eq!(parsed.message, "something went wrong");
		assert_eq!(parsed.frames.len(), 1);
	}

	#[test]
	fn header_splits_on_first_colon_only() {
		let parsed = parse_stack("Error: failed to fetch: https://api.example.com");
		assert_eq!(parsed.name, "Error");
		assert_eq!(parsed.message, "failed to fetch: https://api.example.com");
		assert!(parsed.frames.is_empty());
	}

	#[test]
	fn url_ports_do_not_confuse_location() {
		let parsed = parse_stack("Error: x\n    at Object.run (http://localhost:8080/static/js/main.js:12:345)");
		assert_eq!(
			parsed.frames,
			vec![frame(
				Some("Object.run"),
				"http://localhost:8080/static/js/main.js",
				12,
				345
			)]
		);
	}

	#[test]
	fn native_frames_have_no_file() {
		let parsed = parse_stack("Error: x\n    at Array.map (native)\n    at new Widget (<anonymous>)");
		assert_eq!(parsed.frames.len(), 2);
		assert_eq!(parsed.frames[0].function_name.as_deref(), Some("Array.map"));
		assert_eq!(parsed.frames[0].file_name, None);
		assert_eq!(parsed.frames[1].function_name.as_deref(), Some("new Widget"));
		assert_eq!(parsed.frames[1].location(), None);
	}

	#[test]
	fn parses_gecko_frames() {
		let stack = "Error: boom\nhandleClick@https://example.com/app.min.js:1:200\n@https://example.com/app.min.js:2:10\nfoo/<@https://example.com/app.min.js:5:3";
		let parsed = parse_stack(stack);
		assert_eq!(
			parsed.frames,
			vec![
				frame(Some("handleClick"), "https://example.com/app.min.js", 1, 200),
				frame(None, "https://example.com/app.min.js", 2, 10),
				frame(Some("foo/<"), "https://example.com/app.min.js", 5, 3),
			]
		);
	}

	#[test]
	fn unrecognised_lines_are_skipped() {
		let stack = "Error: boom\n\n    continuation of the message\n    at ok (a.js:1:2)\n----";
		let parsed = parse_stack(stack);
		assert_eq!(parsed.frames, vec![frame(Some("ok"), "a.js", 1, 2)]);
	}

	#[test]
	fn empty_input_yields_empty_stack() {
		let parsed = parse_stack("");
		assert_eq!(parsed.name, DEFAULT_ERROR_NAME);
		assert_eq!(parsed.message, "");
		assert!(parsed.frames.is_empty());
	}

	#[test]
	fn async_prefix_is_kept_in_function_name() {
		let parsed = parse_stack("Error: x\n    at async loadUser (https://a.example/app.js:4:9)");
		assert_eq!(parsed.frames[0].function_name.as_deref(), Some("async loadUser"));
	}

	proptest! {
		#[test]
		fn parse_never_panics(input in ".{0,400}") {
			let _ = parse_stack(&input);
		}

		#[test]
		fn v8_frames_keep_order(
			entries in prop::collection::vec(("[a-zA-Z_][a-zA-Z0-9_]{0,12}", 1u32..10_000, 0u32..10_000), 0..20)
		) {
			let mut stack = String::from("Error: generated");
			for (func, line, col) in &entries {
				stack.push_str(&format!("\n    at {func} (https://cdn.example.com/app.min.js:{line}:{col})"));
			}

			let parsed = parse_stack(&stack);
			prop_assert_eq!(parsed.frames.len(), entries.len());
			for (frame, (func, line, col)) in parsed.frames.iter().zip(&entries) {
				prop_assert_eq!(frame.function_name.as_deref(), Some(func.as_str()));
				prop_assert_eq!(frame.line_number, Some(*line));
				prop_assert_eq!(frame.column_number, Some(*col));
			}
		}
	}
}
