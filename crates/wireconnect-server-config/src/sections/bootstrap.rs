// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! First-run provisioning: the initial administrator and server interface.

use serde::Deserialize;
use wireconnect_common::Address;
use wireconnect_common_secret::SecretString;

pub const DEFAULT_INTERFACE_NAME: &str = "wireconnect0";

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
	pub admin_username: Option<String>,
	pub admin_password: Option<SecretString>,
	pub interface_name: String,
	pub interface_addresses: Vec<Address>,
}

impl Default for BootstrapConfig {
	fn default() -> Self {
		BootstrapConfigLayer::default().finalize()
	}
}

impl BootstrapConfig {
	/// Both halves of the admin credential, if configured.
	pub fn admin_credentials(&self) -> Option<(&str, &SecretString)> {
		match (&self.admin_username, &self.admin_password) {
			(Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
				Some((user.as_str(), password))
			}
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfigLayer {
	#[serde(default)]
	pub admin_username: Option<String>,
	#[serde(default)]
	pub admin_password: Option<SecretString>,
	#[serde(default)]
	pub interface_name: Option<String>,
	#[serde(default)]
	pub interface_addresses: Option<Vec<Address>>,
}

impl BootstrapConfigLayer {
	pub fn merge(&mut self, other: BootstrapConfigLayer) {
		if other.admin_username.is_some() {
			self.admin_username = other.admin_username;
		}
		if other.admin_password.is_some() {
			self.admin_password = other.admin_password;
		}
		if other.interface_name.is_some() {
			self.interface_name = other.interface_name;
		}
		if other.interface_addresses.is_some() {
			self.interface_addresses = other.interface_addresses;
		}
	}

	pub fn finalize(self) -> BootstrapConfig {
		BootstrapConfig {
			admin_username: self.admin_username,
			admin_password: self.admin_password,
			interface_name: self
				.interface_name
				.unwrap_or_else(|| DEFAULT_INTERFACE_NAME.to_string()),
			interface_addresses: self.interface_addresses.unwrap_or_default(),
		}
	}
}
