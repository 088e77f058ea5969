// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::{info, instrument};
use wireconnect_common::WgKeyPair;
use wireconnect_server_wgtunnel::DeviceControl;

use crate::client::WireconnectClient;
use crate::tunnel;

#[derive(Debug, Clone, Args)]
pub struct PeerArgs {
	/// Name of your peer, as defined by an administrator
	pub peer_name: String,
}

#[cfg(target_os = "linux")]
fn local_devices() -> anyhow::Result<Arc<dyn DeviceControl>> {
	Ok(Arc::new(wireconnect_server_wgtunnel::KernelDevices::new()?))
}

#[cfg(not(target_os = "linux"))]
fn local_devices() -> anyhow::Result<Arc<dyn DeviceControl>> {
	anyhow::bail!("configuring a local WireGuard device is only supported on Linux")
}

#[instrument(skip(client, args), fields(peer = %args.peer_name))]
pub async fn handle_connect(client: &WireconnectClient, args: PeerArgs) -> anyhow::Result<()> {
	let devices = local_devices()?;
	let keypair = WgKeyPair::generate();

	let reply = client.connect(&args.peer_name, keypair.public_key()).await?;
	info!(client_address = %reply.client_address, "server accepted connection");

	let fallback_host = client.base_url().host_str().unwrap_or_default().to_string();
	let endpoint = tunnel::resolve_endpoint(&reply, &fallback_host).await?;
	tunnel::bring_up(devices.as_ref(), keypair.private_key().clone(), &reply, endpoint).await?;

	println!("{} Connected {}", style("✓").green().bold(), args.peer_name);
	println!("  Address:  {}", style(reply.client_address).cyan());
	println!("  Endpoint: {}", style(endpoint).cyan());
	println!("  Device:   {}", style(tunnel::LOCAL_DEVICE).cyan());
	Ok(())
}

#[instrument(skip(client, args), fields(peer = %args.peer_name))]
pub async fn handle_disconnect(client: &WireconnectClient, args: PeerArgs) -> anyhow::Result<()> {
	let reply = client.disconnect(&args.peer_name).await?;
	println!("{} {}", style("✓").green().bold(), reply.message);

	let devices = local_devices()?;
	if tunnel::tear_down(devices.as_ref()).await? {
		println!("  Removed local device {}", style(tunnel::LOCAL_DEVICE).cyan());
	}
	Ok(())
}
