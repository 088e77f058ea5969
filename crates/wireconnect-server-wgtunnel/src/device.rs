// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The kernel control surface used by the managers.
//!
//! [`DeviceControl`] covers two concerns: link management (create, look up,
//! address, bring up and delete network devices) and WireGuard device
//! configuration (read and apply keys, ports and peers). Production uses
//! [`crate::KernelDevices`]; tests use [`crate::FakeDevices`].

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use wireconnect_common::{Address, KeyError, WgPrivateKey, WgPublicKey};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
	WireGuard,
	Other(String),
}

impl DeviceKind {
	pub fn is_wireguard(&self) -> bool {
		matches!(self, DeviceKind::WireGuard)
	}
}

impl fmt::Display for DeviceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DeviceKind::WireGuard => f.write_str("wireguard"),
			DeviceKind::Other(kind) => f.write_str(kind),
		}
	}
}

/// A network device as seen by the link layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
	pub name: String,
	pub index: u32,
	pub kind: DeviceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerState {
	pub public_key: WgPublicKey,
	pub allowed_ips: Vec<Address>,
	pub endpoint: Option<SocketAddr>,
}

/// Current WireGuard configuration of a device.
#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
	pub private_key: Option<WgPrivateKey>,
	pub public_key: Option<WgPublicKey>,
	pub listen_port: Option<u16>,
	pub fwmark: Option<u32>,
	pub peers: Vec<PeerState>,
}

impl DeviceConfig {
	/// The device's public key, derived from the private key when the kernel
	/// did not report one.
	pub fn server_public_key(&self) -> Option<WgPublicKey> {
		self.public_key
			.or_else(|| self.private_key.as_ref().map(WgPrivateKey::public_key))
	}

	pub fn has_peer(&self, key: &WgPublicKey) -> bool {
		self.peers.iter().any(|p| &p.public_key == key)
	}
}

/// A change to one peer. Peers not named in a [`DeviceUpdate`] are untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerUpdate {
	pub public_key: WgPublicKey,
	pub allowed_ips: Vec<Address>,
	pub replace_allowed_ips: bool,
	pub endpoint: Option<SocketAddr>,
	pub remove: bool,
}

impl PeerUpdate {
	/// Add or update a peer, replacing its allowed IPs.
	pub fn upsert(public_key: WgPublicKey, allowed_ips: Vec<Address>) -> Self {
		Self {
			public_key,
			allowed_ips,
			replace_allowed_ips: true,
			endpoint: None,
			remove: false,
		}
	}

	/// Remove a peer. Fails at the device layer when the peer is absent.
	pub fn remove(public_key: WgPublicKey) -> Self {
		Self {
			public_key,
			allowed_ips: Vec::new(),
			replace_allowed_ips: false,
			endpoint: None,
			remove: true,
		}
	}

	pub fn with_endpoint(mut self, endpoint: SocketAddr) -> Self {
		self.endpoint = Some(endpoint);
		self
	}
}

#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
	pub private_key: Option<WgPrivateKey>,
	pub listen_port: Option<u16>,
	pub fwmark: Option<u32>,
	pub replace_peers: bool,
	pub peers: Vec<PeerUpdate>,
}

impl DeviceUpdate {
	pub fn new() -> Self {
		Self::default()
	}

	/// An update that re-applies the device-level settings of `current`.
	pub fn preserving(current: &DeviceConfig) -> Self {
		Self {
			private_key: current.private_key.clone(),
			listen_port: current.listen_port,
			fwmark: current.fwmark,
			replace_peers: false,
			peers: Vec::new(),
		}
	}

	pub fn with_private_key(mut self, key: WgPrivateKey) -> Self {
		self.private_key = Some(key);
		self
	}

	pub fn with_listen_port(mut self, port: u16) -> Self {
		self.listen_port = Some(port);
		self
	}

	pub fn replacing_peers(mut self) -> Self {
		self.replace_peers = true;
		self
	}

	pub fn add_peer(mut self, peer: PeerUpdate) -> Self {
		self.peers.push(peer);
		self
	}

	pub fn remove_peer(mut self, key: WgPublicKey) -> Self {
		self.peers.push(PeerUpdate::remove(key));
		self
	}
}

#[derive(Debug, Error)]
pub enum DeviceError {
	#[error("{op} failed on {name}: {message}")]
	Kernel {
		op: &'static str,
		name: String,
		message: String,
	},

	#[error("device {0} does not exist")]
	NotFound(String),

	#[error("invalid key: {0}")]
	InvalidKey(#[from] KeyError),

	#[error("key generation failed: {0}")]
	KeyGen(String),
}

impl DeviceError {
	pub fn kernel(op: &'static str, name: &str, message: impl fmt::Display) -> Self {
		DeviceError::Kernel {
			op,
			name: name.to_string(),
			message: message.to_string(),
		}
	}
}

/// Link management plus WireGuard configuration for named devices.
#[async_trait]
pub trait DeviceControl: Send + Sync {
	/// Create a WireGuard device. Fails if a device with that name exists.
	async fn create_device(&self, name: &str) -> Result<LinkInfo, DeviceError>;

	async fn find_device(&self, name: &str) -> Result<Option<LinkInfo>, DeviceError>;

	async fn list_devices(&self) -> Result<Vec<LinkInfo>, DeviceError>;

	async fn add_address(&self, name: &str, address: &Address) -> Result<(), DeviceError>;

	async fn set_up(&self, name: &str) -> Result<(), DeviceError>;

	async fn delete_device(&self, name: &str) -> Result<(), DeviceError>;

	async fn get_config(&self, name: &str) -> Result<DeviceConfig, DeviceError>;

	async fn set_config(&self, name: &str, update: DeviceUpdate) -> Result<(), DeviceError>;

	fn generate_private_key(&self) -> Result<WgPrivateKey, DeviceError>;

	fn parse_public_key(&self, encoded: &str) -> Result<WgPublicKey, DeviceError> {
		Ok(WgPublicKey::from_base64(encoded)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_public_key_falls_back_to_private() {
		let private = WgPrivateKey::generate();
		let expected = private.public_key();
		let config = DeviceConfig {
			private_key: Some(private),
			..Default::default()
		};
		assert_eq!(config.server_public_key(), Some(expected));
		assert_eq!(DeviceConfig::default().server_public_key(), None);
	}

	#[test]
	fn preserving_keeps_device_settings_only() {
		let current = DeviceConfig {
			private_key: Some(WgPrivateKey::generate()),
			listen_port: Some(51820),
			fwmark: Some(7),
			peers: vec![PeerState {
				public_key: WgPrivateKey::generate().public_key(),
				allowed_ips: vec![],
				endpoint: None,
			}],
			..Default::default()
		};
		let update = DeviceUpdate::preserving(&current);
		assert!(update.private_key.is_some());
		assert_eq!(update.listen_port, Some(51820));
		assert_eq!(update.fwmark, Some(7));
		assert!(!update.replace_peers);
		assert!(update.peers.is_empty());
	}

	#[test]
	fn kind_display() {
		assert_eq!(DeviceKind::WireGuard.to_string(), "wireguard");
		assert_eq!(DeviceKind::Other("dummy".into()).to_string(), "dummy");
	}
}
