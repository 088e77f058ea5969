// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use clap::Args;
use console::style;
use wireconnect_common::{CreatePeerRequest, CreateUserRequest};

use crate::client::WireconnectClient;

#[derive(Debug, Clone, Args)]
pub struct AddPeerArgs {
	/// Name of the new peer
	pub peer_name: String,

	/// User who owns the peer
	#[arg(long)]
	pub user_name: String,

	/// Client address in CIDR form, e.g. 10.0.0.5/24
	#[arg(long)]
	pub address: String,

	/// Server interface the peer connects through
	#[arg(long)]
	pub interface: String,

	/// Public host name clients should send traffic to
	#[arg(long)]
	pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct AddUserArgs {
	pub user_name: String,

	/// Password for the new user; read from WIRECONNECT_NEW_PASSWORD if omitted
	#[arg(long, env = "WIRECONNECT_NEW_PASSWORD", hide_env_values = true)]
	pub password: String,

	#[arg(long)]
	pub admin: bool,
}

pub async fn handle_add_peer(client: &WireconnectClient, args: AddPeerArgs) -> anyhow::Result<()> {
	let request = CreatePeerRequest {
		user_name: args.user_name,
		peer_name: args.peer_name,
		address: args.address,
		endpoint_address: args.endpoint,
		server_interface: args.interface,
	};
	request.validate()?;

	let reply = client.create_peer(&request).await?;
	println!("{} {}", style("✓").green().bold(), reply.message);
	Ok(())
}

pub async fn handle_add_user(client: &WireconnectClient, args: AddUserArgs) -> anyhow::Result<()> {
	let request = CreateUserRequest {
		user_name: args.user_name,
		password: args.password,
		is_admin: args.admin,
	};
	request.validate()?;

	let reply = client.add_user(&request).await?;
	println!("{} {}", style("✓").green().bold(), reply.message);
	Ok(())
}
