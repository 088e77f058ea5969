// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The client's side of the tunnel: a local WireGuard device that routes
//! the server interface's network to the server.

use std::net::SocketAddr;

use tracing::info;
use wireconnect_common::{ConnectionReply, WgPrivateKey};
use wireconnect_server_wgtunnel::{DeviceControl, DeviceUpdate, PeerUpdate};

use crate::error::{CliError, Result};

pub const LOCAL_DEVICE: &str = "wireconnect";

/// Resolve where to send encrypted packets. The server may omit its
/// endpoint host, in which case the host of the API URL is used.
pub async fn resolve_endpoint(reply: &ConnectionReply, fallback_host: &str) -> Result<SocketAddr> {
	let port = reply
		.endpoint_port
		.ok_or_else(|| CliError::Other("server did not report a listen port".to_string()))?;
	let host = reply
		.endpoint_address
		.as_deref()
		.filter(|h| !h.is_empty())
		.unwrap_or(fallback_host);

	tokio::net::lookup_host((host, port))
		.await?
		.next()
		.ok_or_else(|| CliError::Other(format!("could not resolve endpoint {host}")))
}

/// Create and bring up the local device for an accepted connection.
pub async fn bring_up(
	devices: &dyn DeviceControl,
	private_key: WgPrivateKey,
	reply: &ConnectionReply,
	endpoint: SocketAddr,
) -> Result<()> {
	devices.create_device(LOCAL_DEVICE).await?;
	devices.add_address(LOCAL_DEVICE, &reply.client_address).await?;

	let server = PeerUpdate::upsert(reply.public_key, vec![reply.client_address.network()])
		.with_endpoint(endpoint);
	devices
		.set_config(
			LOCAL_DEVICE,
			DeviceUpdate::new()
				.with_private_key(private_key)
				.replacing_peers()
				.add_peer(server),
		)
		.await?;
	devices.set_up(LOCAL_DEVICE).await?;

	info!(address = %reply.client_address, %endpoint, "local tunnel is up");
	Ok(())
}

/// Remove the local device if it exists.
pub async fn tear_down(devices: &dyn DeviceControl) -> Result<bool> {
	if devices.find_device(LOCAL_DEVICE).await?.is_none() {
		return Ok(false);
	}
	devices.delete_device(LOCAL_DEVICE).await?;
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use wireconnect_common::Address;
	use wireconnect_server_wgtunnel::FakeDevices;

	fn reply() -> ConnectionReply {
		ConnectionReply {
			public_key: WgPrivateKey::generate().public_key(),
			client_address: Address::parse("10.0.0.5/24").unwrap(),
			endpoint_address: Some("127.0.0.1".to_string()),
			endpoint_port: Some(51820),
		}
	}

	#[tokio::test]
	async fn bring_up_routes_server_network() {
		let fake = FakeDevices::new();
		let reply = reply();
		let private_key = WgPrivateKey::generate();
		let endpoint = resolve_endpoint(&reply, "ignored").await.unwrap();
		assert_eq!(endpoint, "127.0.0.1:51820".parse().unwrap());

		bring_up(&fake, private_key, &reply, endpoint).await.unwrap();

		let device = fake.device(LOCAL_DEVICE).unwrap();
		assert!(device.up);
		assert_eq!(device.addresses, vec![reply.client_address]);
		assert_eq!(device.peers.len(), 1);
		assert_eq!(device.peers[0].public_key, reply.public_key);
		assert_eq!(
			device.peers[0].allowed_ips,
			vec![Address::parse("10.0.0.0/24").unwrap()]
		);
		assert_eq!(device.peers[0].endpoint, Some(endpoint));

		assert!(tear_down(&fake).await.unwrap());
		assert!(!tear_down(&fake).await.unwrap());
	}

	#[tokio::test]
	async fn endpoint_falls_back_to_server_host() {
		let mut reply = reply();
		reply.endpoint_address = None;
		let endpoint = resolve_endpoint(&reply, "127.0.0.1").await.unwrap();
		assert_eq!(endpoint.port(), 51820);

		reply.endpoint_port = None;
		assert!(resolve_endpoint(&reply, "127.0.0.1").await.is_err());
	}
}
