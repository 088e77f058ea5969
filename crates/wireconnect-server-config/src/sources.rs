// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};
use wireconnect_common::parse_address_list;
use wireconnect_common_secret::SecretString;

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	BootstrapConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer,
	RateLimitConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/wireconnect/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WIRECONNECT_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()),
			rate_limit: Some(load_rate_limit_from_env()?),
			logging: Some(load_logging_from_env()),
			bootstrap: Some(load_bootstrap_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u16 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Reads a secret from `NAME`, or from the file named by `NAME_FILE`.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, ConfigError> {
	if let Some(value) = env_var(name) {
		return Ok(Some(SecretString::new(value)));
	}

	let file_var = format!("{name}_FILE");
	match env_var(&file_var) {
		Some(path) => {
			let content = std::fs::read_to_string(&path)
				.map_err(|e| ConfigError::Secret(format!("{file_var}={path}: {e}")))?;
			Ok(Some(SecretString::new(content.trim_end().to_string())))
		}
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("WIRECONNECT_SERVER_HOST"),
		port: env_u16("WIRECONNECT_SERVER_PORT")?,
		request_timeout_secs: env_u64("WIRECONNECT_SERVER_REQUEST_TIMEOUT_SECS")?,
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("WIRECONNECT_SERVER_DATABASE_URL"),
	}
}

fn load_rate_limit_from_env() -> Result<RateLimitConfigLayer, ConfigError> {
	Ok(RateLimitConfigLayer {
		capacity: env_u64("WIRECONNECT_SERVER_RATE_LIMIT_CAPACITY")?,
		quantum: env_u64("WIRECONNECT_SERVER_RATE_LIMIT_QUANTUM")?,
		fill_interval_secs: env_u64("WIRECONNECT_SERVER_RATE_LIMIT_FILL_INTERVAL_SECS")?,
		purge_check_interval_secs: env_u64("WIRECONNECT_SERVER_RATE_LIMIT_PURGE_CHECK_INTERVAL_SECS")?,
		purge_threshold_secs: env_u64("WIRECONNECT_SERVER_RATE_LIMIT_PURGE_THRESHOLD_SECS")?,
	})
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("WIRECONNECT_SERVER_LOG_LEVEL"),
	}
}

fn load_bootstrap_from_env() -> Result<BootstrapConfigLayer, ConfigError> {
	let interface_addresses = match env_var("WIRECONNECT_SERVER_BOOTSTRAP_INTERFACE_ADDRESSES") {
		Some(list) => Some(parse_address_list(&list).map_err(|e| ConfigError::InvalidValue {
			key: "WIRECONNECT_SERVER_BOOTSTRAP_INTERFACE_ADDRESSES".to_string(),
			message: e.to_string(),
		})?),
		None => None,
	};

	Ok(BootstrapConfigLayer {
		admin_username: env_var("WIRECONNECT_SERVER_BOOTSTRAP_ADMIN_USERNAME"),
		admin_password: load_secret_env("WIRECONNECT_SERVER_BOOTSTRAP_ADMIN_PASSWORD")?,
		interface_name: env_var("WIRECONNECT_SERVER_BOOTSTRAP_INTERFACE_NAME"),
		interface_addresses,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn toml_source_reads_sections() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[http]
port = 8443

[rate_limit]
capacity = 10
fill_interval_secs = 30

[bootstrap]
interface_name = "vpn0"
interface_addresses = ["10.0.0.1/24"]
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.http.unwrap().port, Some(8443));
		let rate_limit = layer.rate_limit.unwrap();
		assert_eq!(rate_limit.capacity, Some(10));
		assert_eq!(rate_limit.fill_interval_secs, Some(30));
		let bootstrap = layer.bootstrap.unwrap();
		assert_eq!(bootstrap.interface_name.as_deref(), Some("vpn0"));
		assert_eq!(bootstrap.interface_addresses.unwrap()[0].to_string(), "10.0.0.1/24");
	}

	#[test]
	fn missing_toml_file_is_empty_layer() {
		let layer = TomlSource::new("/nonexistent/wireconnect.toml").load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn malformed_toml_is_an_error() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[http\nport = ").unwrap();
		assert!(matches!(
			TomlSource::new(file.path()).load(),
			Err(ConfigError::TomlParse { .. })
		));
	}

	#[test]
	fn bad_address_in_toml_is_an_error() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[bootstrap]\ninterface_addresses = [\"10.0.0.1\"]").unwrap();
		assert!(TomlSource::new(file.path()).load().is_err());
	}

	#[test]
	fn precedence_orders_sources() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
	}
}
