// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-source-address request throttling.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
	/// Maximum tokens a bucket can hold.
	pub capacity: u64,
	/// Tokens added at every fill interval.
	pub quantum: u64,
	pub fill_interval: Duration,
	/// How often the purge task wakes up.
	pub purge_check_interval: Duration,
	/// Idle time after which a bucket is dropped.
	pub purge_threshold: Duration,
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			capacity: 5,
			quantum: 5,
			fill_interval: Duration::from_secs(60),
			purge_check_interval: Duration::from_secs(10 * 60),
			purge_threshold: Duration::from_secs(60 * 60),
		}
	}
}

impl RateLimitConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		let zero = |key: &str| ConfigError::Validation(format!("rate_limit.{key} must be greater than zero"));

		if self.capacity == 0 {
			return Err(zero("capacity"));
		}
		if self.quantum == 0 {
			return Err(zero("quantum"));
		}
		if self.fill_interval.is_zero() {
			return Err(zero("fill_interval_secs"));
		}
		if self.purge_check_interval.is_zero() {
			return Err(zero("purge_check_interval_secs"));
		}
		if self.purge_threshold.is_zero() {
			return Err(zero("purge_threshold_secs"));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitConfigLayer {
	#[serde(default)]
	pub capacity: Option<u64>,
	#[serde(default)]
	pub quantum: Option<u64>,
	#[serde(default)]
	pub fill_interval_secs: Option<u64>,
	#[serde(default)]
	pub purge_check_interval_secs: Option<u64>,
	#[serde(default)]
	pub purge_threshold_secs: Option<u64>,
}

impl RateLimitConfigLayer {
	pub fn merge(&mut self, other: RateLimitConfigLayer) {
		if other.capacity.is_some() {
			self.capacity = other.capacity;
		}
		if other.quantum.is_some() {
			self.quantum = other.quantum;
		}
		if other.fill_interval_secs.is_some() {
			self.fill_interval_secs = other.fill_interval_secs;
		}
		if other.purge_check_interval_secs.is_some() {
			self.purge_check_interval_secs = other.purge_check_interval_secs;
		}
		if other.purge_threshold_secs.is_some() {
			self.purge_threshold_secs = other.purge_threshold_secs;
		}
	}

	pub fn finalize(self) -> RateLimitConfig {
		let defaults = RateLimitConfig::default();
		RateLimitConfig {
			capacity: self.capacity.unwrap_or(defaults.capacity),
			quantum: self.quantum.unwrap_or(defaults.quantum),
			fill_interval: self
				.fill_interval_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.fill_interval),
			purge_check_interval: self
				.purge_check_interval_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.purge_check_interval),
			purge_threshold: self
				.purge_threshold_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.purge_threshold),
		}
	}
}
