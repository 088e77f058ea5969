// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use console::style;

use crate::client::WireconnectClient;

pub async fn handle_interfaces(client: &WireconnectClient) -> anyhow::Result<()> {
	let interfaces = client.list_interfaces().await?;
	if interfaces.is_empty() {
		println!("No interfaces defined");
	}
	for interface in interfaces {
		let addresses: Vec<String> = interface.addresses.iter().map(ToString::to_string).collect();
		println!("{} {}", style(&interface.name).cyan(), addresses.join(", "));
	}
	Ok(())
}

pub async fn handle_peers(client: &WireconnectClient) -> anyhow::Result<()> {
	let peers = client.list_peers().await?;
	if peers.is_empty() {
		println!("No peers defined");
	}
	for peer in peers {
		println!(
			"{} {} via {}{}",
			style(&peer.name).cyan(),
			peer.address,
			peer.server_interface,
			peer.endpoint_address
				.map(|e| format!(" ({e})"))
				.unwrap_or_default()
		);
	}
	Ok(())
}

pub async fn handle_bans(client: &WireconnectClient) -> anyhow::Result<()> {
	let bans = client.list_bans().await?;
	if bans.addresses.is_empty() {
		println!("No tracked addresses");
	}
	for address in bans.addresses {
		println!("{address}");
	}
	Ok(())
}
