// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server interface lifecycle.
//!
//! Every kernel device this process creates is recorded in the registry as
//! soon as the create call succeeds, before it is addressed, keyed and
//! brought up. A device that fails half-way through configuration therefore
//! stays registered and is still removed by [`InterfaceManager::shutdown`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use wireconnect_server_db::ServerInterfaceSpec;

use crate::device::{DeviceControl, DeviceError, DeviceKind, DeviceUpdate};
use crate::error::{Result, WgError};
use crate::locks::{KeyedGuard, KeyedLocks};

/// A kernel device created and owned by this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveInterface {
	pub name: String,
	pub index: u32,
	pub kind: DeviceKind,
}

pub struct InterfaceManager {
	devices: Arc<dyn DeviceControl>,
	registry: Mutex<HashMap<String, Arc<LiveInterface>>>,
	create_locks: KeyedLocks<String>,
	config_locks: KeyedLocks<String>,
}

impl InterfaceManager {
	pub fn new(devices: Arc<dyn DeviceControl>) -> Self {
		Self {
			devices,
			registry: Mutex::new(HashMap::new()),
			create_locks: KeyedLocks::new(),
			config_locks: KeyedLocks::new(),
		}
	}

	/// Serializes reconfiguration of one device.
	pub async fn lock_config(&self, name: &str) -> KeyedGuard<String> {
		self.config_locks.lock(&name.to_string()).await
	}

	pub async fn get(&self, name: &str) -> Option<Arc<LiveInterface>> {
		self.registry.lock().await.get(name).cloned()
	}

	pub async fn list(&self) -> Vec<Arc<LiveInterface>> {
		let mut live: Vec<_> = self.registry.lock().await.values().cloned().collect();
		live.sort_by(|a, b| a.name.cmp(&b.name));
		live
	}

	async fn registered(&self, name: &str) -> Result<Option<Arc<LiveInterface>>> {
		match self.registry.lock().await.get(name) {
			Some(existing) if existing.kind.is_wireguard() => Ok(Some(existing.clone())),
			Some(existing) => Err(WgError::AlreadyExistsWrongType {
				name: name.to_string(),
				kind: existing.kind.clone(),
			}),
			None => Ok(None),
		}
	}

	/// Return the live device for `spec`, creating and configuring it if
	/// this process has not created it yet.
	///
	/// Creation of one name is serialized by a per-name lock; the registry
	/// itself is only locked for lookups and the final insert, so kernel
	/// calls for different names run concurrently.
	#[instrument(skip(self, spec), fields(interface = %spec.name))]
	pub async fn ensure(&self, spec: &ServerInterfaceSpec) -> Result<Arc<LiveInterface>> {
		if let Some(existing) = self.registered(&spec.name).await? {
			return Ok(existing);
		}

		let (live, _config_guard) = {
			let _create_guard = self.create_locks.lock(&spec.name).await;
			if let Some(existing) = self.registered(&spec.name).await? {
				return Ok(existing);
			}

			if let Some(link) = self.devices.find_device(&spec.name).await? {
				if !link.kind.is_wireguard() {
					return Err(WgError::AlreadyExistsWrongType {
						name: spec.name.clone(),
						kind: link.kind,
					});
				}
			}

			// Taken before the device is visible in the registry so that
			// callers who find the entry wait for a keyed device before
			// adding peers.
			let config_guard = self.lock_config(&spec.name).await;

			let link = self.devices.create_device(&spec.name).await?;
			let live = Arc::new(LiveInterface {
				name: link.name,
				index: link.index,
				kind: link.kind,
			});
			self.registry
				.lock()
				.await
				.insert(spec.name.clone(), live.clone());
			(live, config_guard)
		};

		self.configure(spec).await?;
		info!(index = live.index, addresses = spec.addresses.len(), "interface is up");
		Ok(live)
	}

	async fn configure(&self, spec: &ServerInterfaceSpec) -> Result<()> {
		for address in &spec.addresses {
			self.devices.add_address(&spec.name, address).await?;
		}

		let private_key = self
			.devices
			.generate_private_key()
			.map_err(|e| match e {
				DeviceError::KeyGen(message) => WgError::KeyGen(message),
				other => WgError::Device(other),
			})?;

		self.devices
			.set_config(&spec.name, DeviceUpdate::new().with_private_key(private_key))
			.await?;
		self.devices.set_up(&spec.name).await?;
		Ok(())
	}

	/// Bring up every interface marked for creation at startup.
	pub async fn start_configured(&self, specs: &[ServerInterfaceSpec]) -> Result<()> {
		for spec in specs.iter().filter(|s| s.create_on_startup) {
			self.ensure(spec).await?;
		}
		Ok(())
	}

	/// Delete every device this process created. Failures are logged and
	/// the remaining devices are still attempted.
	pub async fn shutdown(&self) {
		let live: Vec<_> = self.registry.lock().await.drain().collect();
		for (name, _) in live {
			match self.devices.delete_device(&name).await {
				Ok(()) => info!(interface = %name, "deleted interface"),
				Err(e) => warn!(interface = %name, error = %e, "failed to delete interface"),
			}
		}
	}
}
