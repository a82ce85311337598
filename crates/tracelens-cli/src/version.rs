// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build information for the `version` subcommand.

/// Format version info for display.
pub fn format_version_info() -> String {
	format!(
		"tracelens version: {}\n\
         Platform:          {}-{}\n\
         User-Agent:        {}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH,
		tracelens_common_http::user_agent(),
	)
}
