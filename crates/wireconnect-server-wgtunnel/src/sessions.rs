// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connect and disconnect of user peers.
//!
//! The active-session map records, for each (user, peer) pair, the public key
//! installed for it and the device it was installed on. It is only written
//! after the matching device call succeeds. Both operations run on a spawned
//! task so that a dropped HTTP request cannot leave the device and the map
//! out of step.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument};
use wireconnect_common::{Address, WgPublicKey};
use wireconnect_server_db::DirectoryStore;

use crate::device::{DeviceControl, DeviceError, DeviceUpdate, PeerUpdate};
use crate::error::{Result, WgError};
use crate::interfaces::InterfaceManager;
use crate::locks::KeyedLocks;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
	pub username: String,
	pub peer_name: String,
}

impl SessionKey {
	pub fn new(username: impl Into<String>, peer_name: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			peer_name: peer_name.into(),
		}
	}
}

/// A peer key currently installed on a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
	pub interface: String,
	pub public_key: WgPublicKey,
}

/// What a client needs to bring up its side of the tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
	pub client_address: Address,
	pub server_public_key: WgPublicKey,
	pub endpoint_address: Option<String>,
	pub endpoint_port: Option<u16>,
}

struct SessionState {
	directory: Arc<dyn DirectoryStore>,
	devices: Arc<dyn DeviceControl>,
	interfaces: Arc<InterfaceManager>,
	active: Mutex<HashMap<SessionKey, ActiveSession>>,
	key_locks: KeyedLocks<SessionKey>,
}

#[derive(Clone)]
pub struct SessionManager {
	state: Arc<SessionState>,
}

impl SessionManager {
	pub fn new(
		directory: Arc<dyn DirectoryStore>,
		devices: Arc<dyn DeviceControl>,
		interfaces: Arc<InterfaceManager>,
	) -> Self {
		Self {
			state: Arc::new(SessionState {
				directory,
				devices,
				interfaces,
				active: Mutex::new(HashMap::new()),
				key_locks: KeyedLocks::new(),
			}),
		}
	}

	/// Install `public_key` as the device peer for the user's named peer and
	/// record it as active. A previously installed key for the same peer is
	/// removed from its device.
	#[instrument(skip(self, public_key), fields(%username, %peer_name))]
	pub async fn connect(
		&self,
		username: &str,
		peer_name: &str,
		public_key: &str,
	) -> Result<ConnectOutcome> {
		let public_key = self
			.state
			.devices
			.parse_public_key(public_key)
			.map_err(|_| WgError::InvalidKey)?;

		let key = SessionKey::new(username, peer_name);
		let state = self.state.clone();
		run_detached(async move { state.connect(key, public_key).await }).await
	}

	/// Remove the recorded key from its device and forget the session.
	#[instrument(skip(self), fields(%username, %peer_name))]
	pub async fn disconnect(&self, username: &str, peer_name: &str) -> Result<()> {
		let key = SessionKey::new(username, peer_name);
		let state = self.state.clone();
		run_detached(async move { state.disconnect(key).await }).await
	}

	pub async fn active_key(&self, username: &str, peer_name: &str) -> Option<WgPublicKey> {
		let key = SessionKey::new(username, peer_name);
		self.state.active.lock().await.get(&key).map(|s| s.public_key)
	}

	pub async fn active_sessions(&self) -> Vec<(SessionKey, ActiveSession)> {
		self.state
			.active
			.lock()
			.await
			.iter()
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}
}

async fn run_detached<F, T>(operation: F) -> Result<T>
where
	F: Future<Output = Result<T>> + Send + 'static,
	T: Send + 'static,
{
	tokio::spawn(operation)
		.await
		.map_err(|e| WgError::Internal(format!("session task failed: {e}")))?
}

impl SessionState {
	async fn connect(&self, key: SessionKey, public_key: WgPublicKey) -> Result<ConnectOutcome> {
		let _session_guard = self.key_locks.lock(&key).await;

		let record = self
			.directory
			.find_peer(&key.username, &key.peer_name)
			.await?
			.ok_or(WgError::PeerNotFound)?;

		let spec = self
			.directory
			.find_interface_spec(&record.interface)
			.await?
			.ok_or_else(|| {
				WgError::unavailable(
					&record.interface,
					WgError::InterfaceNotFound(record.interface.clone()),
				)
			})?;

		let live = self
			.interfaces
			.ensure(&spec)
			.await
			.map_err(|e| WgError::unavailable(&spec.name, e))?;

		let previous = self.active.lock().await.get(&key).cloned();
		let previous = match previous {
			// The peer was moved to another interface since it connected.
			Some(session) if session.interface != live.name => {
				self.retire(&key, &session).await?;
				None
			}
			other => other,
		};

		let _config_guard = self.interfaces.lock_config(&live.name).await;

		let current = self.devices.get_config(&live.name).await?;
		let server_public_key = current.server_public_key().ok_or_else(|| {
			WgError::Device(DeviceError::kernel(
				"get_config",
				&live.name,
				"device has no private key",
			))
		})?;

		let mut update = DeviceUpdate::preserving(&current);
		if let Some(old) = previous.filter(|s| s.public_key != public_key) {
			update = update.remove_peer(old.public_key);
		}
		let update = update.add_peer(PeerUpdate::upsert(public_key, vec![record.address.host_route()]));
		self.devices.set_config(&live.name, update).await?;

		self.active.lock().await.insert(
			key,
			ActiveSession {
				interface: live.name.clone(),
				public_key,
			},
		);
		info!(interface = %live.name, client_address = %record.address, "peer connected");

		Ok(ConnectOutcome {
			client_address: record.address,
			server_public_key,
			endpoint_address: record.endpoint_address,
			endpoint_port: current.listen_port,
		})
	}

	async fn disconnect(&self, key: SessionKey) -> Result<()> {
		let _session_guard = self.key_locks.lock(&key).await;

		let session = self
			.active
			.lock()
			.await
			.get(&key)
			.cloned()
			.ok_or(WgError::NotActive)?;

		self.directory
			.find_peer(&key.username, &key.peer_name)
			.await?
			.ok_or(WgError::PeerNotFound)?;

		self.retire(&key, &session).await?;
		info!(interface = %session.interface, "peer disconnected");
		Ok(())
	}

	/// Remove an installed key from the device it was installed on, then
	/// forget the session. The caller holds the session key lock.
	async fn retire(&self, key: &SessionKey, session: &ActiveSession) -> Result<()> {
		let live = self.interfaces.get(&session.interface).await.ok_or_else(|| {
			WgError::unavailable(
				&session.interface,
				WgError::InterfaceNotFound(session.interface.clone()),
			)
		})?;

		let _config_guard = self.interfaces.lock_config(&live.name).await;
		self.devices
			.set_config(&live.name, DeviceUpdate::new().remove_peer(session.public_key))
			.await?;

		self.active.lock().await.remove(key);
		Ok(())
	}
}
