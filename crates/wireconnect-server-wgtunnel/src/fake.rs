// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`DeviceControl`] for tests and non-Linux development.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use wireconnect_common::{Address, WgPrivateKey, WgPublicKey};

use crate::device::{
	DeviceConfig, DeviceControl, DeviceError, DeviceKind, DeviceUpdate, LinkInfo, PeerState,
};

const DEFAULT_LISTEN_PORT: u16 = 51820;

/// Operations that can be made to fail on their next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
	Create,
	AddAddress,
	SetUp,
	Delete,
	GetConfig,
	SetConfig,
	KeyGen,
}

#[derive(Debug, Clone)]
pub struct FakeDevice {
	pub index: u32,
	pub kind: DeviceKind,
	pub addresses: Vec<Address>,
	pub up: bool,
	pub private_key: Option<WgPrivateKey>,
	pub listen_port: Option<u16>,
	pub fwmark: Option<u32>,
	pub peers: Vec<PeerState>,
}

#[derive(Default)]
struct FakeState {
	devices: HashMap<String, FakeDevice>,
	next_index: u32,
	failures: HashSet<FakeOp>,
	create_calls: usize,
	set_config_calls: usize,
	delete_calls: usize,
}

#[derive(Default)]
pub struct FakeDevices {
	state: Mutex<FakeState>,
}

impl FakeDevices {
	pub fn new() -> Self {
		Self::default()
	}

	fn state(&self) -> MutexGuard<'_, FakeState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Make the next call of `op` fail.
	pub fn fail_next(&self, op: FakeOp) {
		self.state().failures.insert(op);
	}

	/// Add a device that this process did not create, such as a leftover
	/// interface or one of a different kind.
	pub fn plant_device(&self, name: &str, kind: DeviceKind) {
		let mut state = self.state();
		state.next_index += 1;
		let index = state.next_index;
		state.devices.insert(name.to_string(), blank_device(index, kind));
	}

	pub fn device(&self, name: &str) -> Option<FakeDevice> {
		self.state().devices.get(name).cloned()
	}

	pub fn peer_keys(&self, name: &str) -> Vec<WgPublicKey> {
		self.state()
			.devices
			.get(name)
			.map(|d| d.peers.iter().map(|p| p.public_key).collect())
			.unwrap_or_default()
	}

	pub fn create_calls(&self) -> usize {
		self.state().create_calls
	}

	pub fn set_config_calls(&self) -> usize {
		self.state().set_config_calls
	}

	pub fn delete_calls(&self) -> usize {
		self.state().delete_calls
	}
}

fn blank_device(index: u32, kind: DeviceKind) -> FakeDevice {
	FakeDevice {
		index,
		kind,
		addresses: Vec::new(),
		up: false,
		private_key: None,
		listen_port: None,
		fwmark: None,
		peers: Vec::new(),
	}
}

fn check(state: &mut FakeState, op: FakeOp, op_name: &'static str, name: &str) -> Result<(), DeviceError> {
	if state.failures.remove(&op) {
		return Err(DeviceError::kernel(op_name, name, "injected failure"));
	}
	Ok(())
}

fn device_mut<'a>(state: &'a mut FakeState, name: &str) -> Result<&'a mut FakeDevice, DeviceError> {
	state
		.devices
		.get_mut(name)
		.ok_or_else(|| DeviceError::NotFound(name.to_string()))
}

fn apply_update(device: &mut FakeDevice, name: &str, update: DeviceUpdate) -> Result<(), DeviceError> {
	let mut peers = if update.replace_peers {
		Vec::new()
	} else {
		device.peers.clone()
	};

	for change in update.peers {
		let position = peers.iter().position(|p| p.public_key == change.public_key);
		if change.remove {
			match position {
				Some(i) => {
					peers.remove(i);
				}
				None => {
					return Err(DeviceError::kernel("set_config", name, "peer is not configured"));
				}
			}
			continue;
		}

		// An allowed IP belongs to at most one peer.
		for other in peers.iter_mut().filter(|p| p.public_key != change.public_key) {
			other.allowed_ips.retain(|ip| !change.allowed_ips.contains(ip));
		}

		match position {
			Some(i) => {
				let peer = &mut peers[i];
				if change.replace_allowed_ips {
					peer.allowed_ips = change.allowed_ips;
				} else {
					peer.allowed_ips.extend(change.allowed_ips);
				}
				if change.endpoint.is_some() {
					peer.endpoint = change.endpoint;
				}
			}
			None => peers.push(PeerState {
				public_key: change.public_key,
				allowed_ips: change.allowed_ips,
				endpoint: change.endpoint,
			}),
		}
	}

	if let Some(key) = update.private_key {
		device.private_key = Some(key);
	}
	if let Some(port) = update.listen_port {
		device.listen_port = Some(port);
	}
	if let Some(fwmark) = update.fwmark {
		device.fwmark = Some(fwmark);
	}
	device.peers = peers;
	Ok(())
}

#[async_trait]
impl DeviceControl for FakeDevices {
	async fn create_device(&self, name: &str) -> Result<LinkInfo, DeviceError> {
		let mut state = self.state();
		state.create_calls += 1;
		check(&mut state, FakeOp::Create, "create_device", name)?;
		if state.devices.contains_key(name) {
			return Err(DeviceError::kernel("create_device", name, "file exists"));
		}
		state.next_index += 1;
		let index = state.next_index;
		let mut device = blank_device(index, DeviceKind::WireGuard);
		device.listen_port = Some(DEFAULT_LISTEN_PORT);
		state.devices.insert(name.to_string(), device);
		Ok(LinkInfo {
			name: name.to_string(),
			index,
			kind: DeviceKind::WireGuard,
		})
	}

	async fn find_device(&self, name: &str) -> Result<Option<LinkInfo>, DeviceError> {
		Ok(self.state().devices.get(name).map(|d| LinkInfo {
			name: name.to_string(),
			index: d.index,
			kind: d.kind.clone(),
		}))
	}

	async fn list_devices(&self) -> Result<Vec<LinkInfo>, DeviceError> {
		let mut links: Vec<LinkInfo> = self
			.state()
			.devices
			.iter()
			.map(|(name, d)| LinkInfo {
				name: name.clone(),
				index: d.index,
				kind: d.kind.clone(),
			})
			.collect();
		links.sort_by_key(|l| l.index);
		Ok(links)
	}

	async fn add_address(&self, name: &str, address: &Address) -> Result<(), DeviceError> {
		let mut state = self.state();
		check(&mut state, FakeOp::AddAddress, "add_address", name)?;
		let device = device_mut(&mut state, name)?;
		if device.addresses.contains(address) {
			return Err(DeviceError::kernel("add_address", name, "address already assigned"));
		}
		device.addresses.push(*address);
		Ok(())
	}

	async fn set_up(&self, name: &str) -> Result<(), DeviceError> {
		let mut state = self.state();
		check(&mut state, FakeOp::SetUp, "set_up", name)?;
		device_mut(&mut state, name)?.up = true;
		Ok(())
	}

	async fn delete_device(&self, name: &str) -> Result<(), DeviceError> {
		let mut state = self.state();
		state.delete_calls += 1;
		check(&mut state, FakeOp::Delete, "delete_device", name)?;
		state
			.devices
			.remove(name)
			.map(|_| ())
			.ok_or_else(|| DeviceError::NotFound(name.to_string()))
	}

	async fn get_config(&self, name: &str) -> Result<DeviceConfig, DeviceError> {
		let mut state = self.state();
		check(&mut state, FakeOp::GetConfig, "get_config", name)?;
		let device = device_mut(&mut state, name)?;
		if !device.kind.is_wireguard() {
			return Err(DeviceError::kernel("get_config", name, "not a wireguard device"));
		}
		Ok(DeviceConfig {
			public_key: device.private_key.as_ref().map(WgPrivateKey::public_key),
			private_key: device.private_key.clone(),
			listen_port: device.listen_port,
			fwmark: device.fwmark,
			peers: device.peers.clone(),
		})
	}

	async fn set_config(&self, name: &str, update: DeviceUpdate) -> Result<(), DeviceError> {
		let mut state = self.state();
		state.set_config_calls += 1;
		check(&mut state, FakeOp::SetConfig, "set_config", name)?;
		let device = device_mut(&mut state, name)?;
		apply_update(device, name, update)
	}

	fn generate_private_key(&self) -> Result<WgPrivateKey, DeviceError> {
		let mut state = self.state();
		if state.failures.remove(&FakeOp::KeyGen) {
			return Err(DeviceError::KeyGen("injected failure".to_string()));
		}
		Ok(WgPrivateKey::generate())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::PeerUpdate;

	fn key() -> WgPublicKey {
		WgPrivateKey::generate().public_key()
	}

	#[tokio::test]
	async fn create_twice_fails() {
		let fake = FakeDevices::new();
		fake.create_device("wg0").await.unwrap();
		assert!(fake.create_device("wg0").await.is_err());
		assert_eq!(fake.create_calls(), 2);
	}

	#[tokio::test]
	async fn removing_absent_peer_fails() {
		let fake = FakeDevices::new();
		fake.create_device("wg0").await.unwrap();
		let err = fake
			.set_config("wg0", DeviceUpdate::new().remove_peer(key()))
			.await
			.unwrap_err();
		assert!(matches!(err, DeviceError::Kernel { op: "set_config", .. }));
	}

	#[tokio::test]
	async fn allowed_ip_moves_between_peers() {
		let fake = FakeDevices::new();
		fake.create_device("wg0").await.unwrap();
		let ip: Address = "10.0.0.2/32".parse().unwrap();
		let (first, second) = (key(), key());

		fake.set_config("wg0", DeviceUpdate::new().add_peer(PeerUpdate::upsert(first, vec![ip])))
			.await
			.unwrap();
		fake.set_config("wg0", DeviceUpdate::new().add_peer(PeerUpdate::upsert(second, vec![ip])))
			.await
			.unwrap();

		let config = fake.get_config("wg0").await.unwrap();
		let owners: Vec<_> = config
			.peers
			.iter()
			.filter(|p| p.allowed_ips.contains(&ip))
			.map(|p| p.public_key)
			.collect();
		assert_eq!(owners, vec![second]);
	}

	#[tokio::test]
	async fn injected_failure_is_one_shot() {
		let fake = FakeDevices::new();
		fake.fail_next(FakeOp::Create);
		assert!(fake.create_device("wg0").await.is_err());
		assert!(fake.create_device("wg0").await.is_ok());
	}

	#[tokio::test]
	async fn get_config_rejects_foreign_kind() {
		let fake = FakeDevices::new();
		fake.plant_device("dummy0", DeviceKind::Other("dummy".into()));
		assert!(fake.get_config("dummy0").await.is_err());
	}
}
