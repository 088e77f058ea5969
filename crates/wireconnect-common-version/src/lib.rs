// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build information shared by `wireconnect-server` and the `wireconnect` client.

shadow_rs::shadow!(build);

#[cfg(feature = "serde")]
use serde::Serialize;

/// `{os}-{arch}`, e.g. "linux-x86_64".
pub const PLATFORM: &str = env!("WIRECONNECT_PLATFORM");

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
	pub version: &'static str,
	pub git_sha: &'static str,
	pub build_timestamp: &'static str,
	pub platform: &'static str,
}

impl BuildInfo {
	#[allow(clippy::const_is_empty)]
	pub const fn current() -> Self {
		Self {
			version: build::PKG_VERSION,
			git_sha: if build::SHORT_COMMIT.is_empty() {
				"unknown"
			} else {
				build::SHORT_COMMIT
			},
			build_timestamp: build::BUILD_TIME,
			platform: PLATFORM,
		}
	}
}

/// Multi-line version report printed by the `version` subcommands.
pub fn format_version_info(binary: &str) -> String {
	use chrono::{DateTime, Utc};

	let info = BuildInfo::current();

	let mut output = format!(
		"{binary} version: {}\n\
		 Git SHA:         {}\n\
		 Built at:        {}\n\
		 Platform:        {}",
		info.version, info.git_sha, info.build_timestamp, info.platform,
	);

	if let Ok(built_at) = DateTime::parse_from_rfc3339(info.build_timestamp)
		.or_else(|_| DateTime::parse_from_str(info.build_timestamp, "%Y-%m-%d %H:%M:%S %:z"))
	{
		let built_at_utc: DateTime<Utc> = built_at.into();
		if let Ok(age) = Utc::now().signed_duration_since(built_at_utc).to_std() {
			output.push_str(&format!(
				"\nBuild age:       {}",
				humantime::format_duration(std::time::Duration::from_secs(age.as_secs()))
			));
		}
	}

	output
}
