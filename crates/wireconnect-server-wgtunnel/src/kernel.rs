// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Linux kernel adapter: rtnetlink for links and addresses, the WireGuard
//! generic-netlink family (through `wireguard-control`) for device config.

use async_trait::async_trait;
use futures::TryStreamExt;
use netlink_packet_route::link::{InfoKind, LinkAttribute, LinkInfo as NlLinkInfo, LinkMessage};
use rtnetlink::Handle;
use tracing::debug;
use wireconnect_common::{Address, WgPrivateKey, WgPublicKey};
use wireguard_control::{
	Backend, Device, DeviceUpdate as WgDeviceUpdate, InterfaceName, Key, PeerConfigBuilder,
};

use crate::device::{
	DeviceConfig, DeviceControl, DeviceError, DeviceKind, DeviceUpdate, LinkInfo, PeerState,
};

pub struct KernelDevices {
	handle: Handle,
	backend: Backend,
}

impl KernelDevices {
	/// Opens a route netlink socket. Must be called from within a tokio runtime.
	pub fn new() -> Result<Self, DeviceError> {
		let (connection, handle, _) = rtnetlink::new_connection()
			.map_err(|e| DeviceError::kernel("netlink_connect", "rtnetlink", e))?;
		tokio::spawn(connection);
		Ok(Self {
			handle,
			backend: Backend::Kernel,
		})
	}

	async fn index_of(&self, name: &str) -> Result<u32, DeviceError> {
		self.find_device(name)
			.await?
			.map(|link| link.index)
			.ok_or_else(|| DeviceError::NotFound(name.to_string()))
	}

	async fn read_device(&self, name: &str) -> Result<Device, DeviceError> {
		let iface = interface_name(name)?;
		let backend = self.backend;
		tokio::task::spawn_blocking(move || Device::get(&iface, backend))
			.await
			.map_err(|e| DeviceError::kernel("get_config", name, e))?
			.map_err(|e| DeviceError::kernel("get_config", name, e))
	}
}

fn interface_name(name: &str) -> Result<InterfaceName, DeviceError> {
	name.parse::<InterfaceName>()
		.map_err(|e| DeviceError::kernel("interface_name", name, e))
}

fn link_info(message: &LinkMessage) -> Option<LinkInfo> {
	let mut name = None;
	let mut kind = DeviceKind::Other("device".to_string());

	for attribute in &message.attributes {
		match attribute {
			LinkAttribute::IfName(n) => name = Some(n.clone()),
			LinkAttribute::LinkInfo(infos) => {
				for info in infos {
					if let NlLinkInfo::Kind(k) = info {
						kind = match k {
							InfoKind::Wireguard => DeviceKind::WireGuard,
							InfoKind::Other(other) => DeviceKind::Other(other.clone()),
							other => DeviceKind::Other(format!("{other:?}").to_lowercase()),
						};
					}
				}
			}
			_ => {}
		}
	}

	name.map(|name| LinkInfo {
		name,
		index: message.header.index,
		kind,
	})
}

fn to_wg_public(key: &WgPublicKey) -> Result<Key, DeviceError> {
	Key::from_base64(&key.to_base64()).map_err(|e| DeviceError::kernel("key", "-", format!("{e:?}")))
}

fn to_wg_private(key: &WgPrivateKey) -> Result<Key, DeviceError> {
	Key::from_base64(key.to_base64().expose())
		.map_err(|e| DeviceError::kernel("key", "-", format!("{e:?}")))
}

fn device_config(name: &str, device: &Device) -> Result<DeviceConfig, DeviceError> {
	let private_key = device
		.private_key
		.as_ref()
		.map(|k| WgPrivateKey::from_base64(&k.to_base64()))
		.transpose()?;
	let public_key = device
		.public_key
		.as_ref()
		.map(|k| WgPublicKey::from_base64(&k.to_base64()))
		.transpose()?;

	let peers = device
		.peers
		.iter()
		.map(|peer| {
			let allowed_ips = peer
				.config
				.allowed_ips
				.iter()
				.map(|ip| {
					Address::new(ip.address, ip.cidr)
						.map_err(|e| DeviceError::kernel("get_config", name, e))
				})
				.collect::<Result<Vec<_>, _>>()?;
			Ok(PeerState {
				public_key: WgPublicKey::from_base64(&peer.config.public_key.to_base64())?,
				allowed_ips,
				endpoint: peer.config.endpoint,
			})
		})
		.collect::<Result<Vec<_>, DeviceError>>()?;

	Ok(DeviceConfig {
		private_key,
		public_key,
		listen_port: device.listen_port,
		fwmark: device.fwmark,
		peers,
	})
}

fn build_update(update: &DeviceUpdate) -> Result<WgDeviceUpdate, DeviceError> {
	let mut wg = WgDeviceUpdate::new();
	if let Some(key) = &update.private_key {
		wg = wg.set_private_key(to_wg_private(key)?);
	}
	if let Some(port) = update.listen_port {
		wg = wg.set_listen_port(port);
	}
	if let Some(fwmark) = update.fwmark {
		wg = wg.set_fwmark(fwmark);
	}
	if update.replace_peers {
		wg = wg.replace_peers();
	}

	for peer in &update.peers {
		let key = to_wg_public(&peer.public_key)?;
		if peer.remove {
			wg = wg.remove_peer_by_key(&key);
			continue;
		}
		let mut builder = PeerConfigBuilder::new(&key);
		if peer.replace_allowed_ips {
			builder = builder.replace_allowed_ips();
		}
		for ip in &peer.allowed_ips {
			builder = builder.add_allowed_ip(ip.ip(), ip.prefix_len());
		}
		if let Some(endpoint) = peer.endpoint {
			builder = builder.set_endpoint(endpoint);
		}
		wg = wg.add_peer(builder);
	}

	Ok(wg)
}

#[async_trait]
impl DeviceControl for KernelDevices {
	async fn create_device(&self, name: &str) -> Result<LinkInfo, DeviceError> {
		self.handle
			.link()
			.add()
			.wireguard(name.to_string())
			.execute()
			.await
			.map_err(|e| DeviceError::kernel("create_device", name, e))?;
		debug!(%name, "created wireguard link");

		self.find_device(name)
			.await?
			.ok_or_else(|| DeviceError::NotFound(name.to_string()))
	}

	async fn find_device(&self, name: &str) -> Result<Option<LinkInfo>, DeviceError> {
		Ok(self
			.list_devices()
			.await?
			.into_iter()
			.find(|link| link.name == name))
	}

	async fn list_devices(&self) -> Result<Vec<LinkInfo>, DeviceError> {
		let mut links = self.handle.link().get().execute();
		let mut found = Vec::new();
		while let Some(message) = links
			.try_next()
			.await
			.map_err(|e| DeviceError::kernel("list_devices", "*", e))?
		{
			if let Some(link) = link_info(&message) {
				found.push(link);
			}
		}
		Ok(found)
	}

	async fn add_address(&self, name: &str, address: &Address) -> Result<(), DeviceError> {
		let index = self.index_of(name).await?;
		self.handle
			.address()
			.add(index, address.ip(), address.prefix_len())
			.execute()
			.await
			.map_err(|e| DeviceError::kernel("add_address", name, e))
	}

	async fn set_up(&self, name: &str) -> Result<(), DeviceError> {
		let index = self.index_of(name).await?;
		self.handle
			.link()
			.set(index)
			.up()
			.execute()
			.await
			.map_err(|e| DeviceError::kernel("set_up", name, e))
	}

	async fn delete_device(&self, name: &str) -> Result<(), DeviceError> {
		let index = self.index_of(name).await?;
		self.handle
			.link()
			.del(index)
			.execute()
			.await
			.map_err(|e| DeviceError::kernel("delete_device", name, e))
	}

	async fn get_config(&self, name: &str) -> Result<DeviceConfig, DeviceError> {
		let device = self.read_device(name).await?;
		device_config(name, &device)
	}

	async fn set_config(&self, name: &str, update: DeviceUpdate) -> Result<(), DeviceError> {
		// The kernel silently ignores removal of an unknown peer.
		if update.peers.iter().any(|p| p.remove) {
			let current = self.get_config(name).await?;
			if let Some(missing) = update
				.peers
				.iter()
				.find(|p| p.remove && !current.has_peer(&p.public_key))
			{
				return Err(DeviceError::kernel(
					"set_config",
					name,
					format!("peer {} is not configured", missing.public_key),
				));
			}
		}

		let iface = interface_name(name)?;
		let wg = build_update(&update)?;
		let backend = self.backend;
		tokio::task::spawn_blocking(move || wg.apply(&iface, backend))
			.await
			.map_err(|e| DeviceError::kernel("set_config", name, e))?
			.map_err(|e| DeviceError::kernel("set_config", name, e))
	}

	fn generate_private_key(&self) -> Result<WgPrivateKey, DeviceError> {
		Ok(WgPrivateKey::generate())
	}
}
