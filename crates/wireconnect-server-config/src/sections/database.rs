// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory database location.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_URL: &str = "sqlite:/var/local/wireconnect.sqlite";
const SQLITE_SCHEME: &str = "sqlite:";

/// Where the user, peer and interface directory lives.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	/// SQLite connection string, e.g. `sqlite:/var/local/wireconnect.sqlite`
	/// or `sqlite::memory:`.
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
		}
	}
}

impl DatabaseConfig {
	/// The directory store only speaks SQLite.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let Some(path) = self.url.strip_prefix(SQLITE_SCHEME) else {
			return Err(ConfigError::Validation(format!(
				"database.url must start with '{SQLITE_SCHEME}', got '{}'",
				self.url
			)));
		};
		if path.trim().is_empty() {
			return Err(ConfigError::Validation(
				"database.url has no database path".to_string(),
			));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self
				.url
				.map(|url| url.trim().to_string())
				.unwrap_or_else(|| DEFAULT_URL.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn with_url(url: &str) -> DatabaseConfig {
		DatabaseConfigLayer {
			url: Some(url.to_string()),
		}
		.finalize()
	}

	#[test]
	fn default_url_is_a_valid_sqlite_file() {
		let config = DatabaseConfigLayer::default().finalize();
		assert_eq!(config.url, "sqlite:/var/local/wireconnect.sqlite");
		assert!(config.validate().is_ok());
	}

	#[test]
	fn relative_and_memory_urls_are_accepted() {
		assert!(with_url("sqlite:./wireconnect.db").validate().is_ok());
		assert!(with_url("sqlite::memory:").validate().is_ok());
	}

	#[test]
	fn surrounding_whitespace_is_trimmed() {
		assert_eq!(with_url("  sqlite:./wireconnect.db\n").url, "sqlite:./wireconnect.db");
	}

	#[test]
	fn non_sqlite_scheme_is_rejected() {
		let err = with_url("postgres://localhost/wireconnect").validate().unwrap_err();
		assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("sqlite:")));
	}

	#[test]
	fn missing_path_is_rejected() {
		assert!(matches!(with_url("sqlite:").validate(), Err(ConfigError::Validation(_))));
	}
}
