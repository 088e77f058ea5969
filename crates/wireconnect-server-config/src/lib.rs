// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for wireconnect-server.
//!
//! Layers are merged from built-in defaults, a TOML file and
//! `WIRECONNECT_SERVER_*` environment variables, in that order of precedence
//! (lowest first).
//!
//! ```ignore
//! let config = wireconnect_server_config::load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{load_secret_env, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub rate_limit: RateLimitConfig,
	pub logging: LoggingConfig,
	pub bootstrap: BootstrapConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WIRECONNECT_SERVER_*`)
/// 2. Config file (`/etc/wireconnect/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Same as [`load_config`] with an explicit config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize a merged layer into resolved, validated config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let rate_limit = layer.rate_limit.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let bootstrap = layer.bootstrap.unwrap_or_default().finalize();

	database.validate()?;
	rate_limit.validate()?;
	if bootstrap.interface_name.trim().is_empty() {
		return Err(ConfigError::Validation(
			"bootstrap.interface_name must not be empty".to_string(),
		));
	}

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		rate_limit_capacity = rate_limit.capacity,
		rate_limit_fill_interval_secs = rate_limit.fill_interval.as_secs(),
		bootstrap_admin = bootstrap.admin_credentials().is_some(),
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		rate_limit,
		logging,
		bootstrap,
	})
}
