// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod admin;
pub mod session;
pub mod show;

use clap::{Parser, Subcommand};

use crate::client::WireconnectClient;
use crate::credentials::{resolve_password, server_url, split_user};

/// Client for the wireconnect VPN server.
#[derive(Debug, Parser)]
#[command(name = "wireconnect", about = "Client for the wireconnect VPN server", version)]
pub struct Cli {
	/// Server URL or host[:port]
	#[arg(short, long, global = true, env = "WIRECONNECT_SERVER", default_value = "")]
	pub server: String,

	/// USERNAME[:PASSWORD]; the password may also come from WIRECONNECT_PASSWORD
	#[arg(short, long, global = true, env = "WIRECONNECT_USER", default_value = "")]
	pub user: String,

	/// Skip TLS certificate verification
	#[arg(short = 'k', long, global = true)]
	pub insecure: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Define a peer for a user (admin)
	AddPeer(admin::AddPeerArgs),
	/// Create a user (admin)
	AddUser(admin::AddUserArgs),
	/// Connect one of your peers and bring up the local tunnel
	Connect(session::PeerArgs),
	/// Disconnect one of your peers and remove the local tunnel
	Disconnect(session::PeerArgs),
	/// List server interfaces
	Interfaces,
	/// List your peers
	Peers,
	/// List source addresses tracked by the rate limiter (admin)
	Bans,
	/// Show version and build information
	Version,
}

impl Cli {
	pub fn client(&self) -> crate::error::Result<WireconnectClient> {
		let base_url = server_url(&self.server)?;
		let (username, inline) = split_user(&self.user)?;
		let password = resolve_password(inline)?;
		WireconnectClient::new(base_url, username, password, self.insecure)
	}
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
	if let Command::Version = cli.command {
		println!("{}", wireconnect_common_version::format_version_info("wireconnect"));
		return Ok(());
	}

	let client = cli.client()?;
	match cli.command {
		Command::AddPeer(args) => admin::handle_add_peer(&client, args).await,
		Command::AddUser(args) => admin::handle_add_user(&client, args).await,
		Command::Connect(args) => session::handle_connect(&client, args).await,
		Command::Disconnect(args) => session::handle_disconnect(&client, args).await,
		Command::Interfaces => show::handle_interfaces(&client).await,
		Command::Peers => show::handle_peers(&client).await,
		Command::Bans => show::handle_bans(&client).await,
		Command::Version => Ok(()),
	}
}
