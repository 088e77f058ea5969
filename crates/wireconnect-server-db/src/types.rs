// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;
use wireconnect_common::{Address, PeerSummary, ServerInterface};

/// A logical server interface: the template for one kernel tunnel device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInterfaceSpec {
	pub name: String,
	pub addresses: Vec<Address>,
	pub create_on_startup: bool,
}

impl ServerInterfaceSpec {
	pub fn new(name: impl Into<String>, addresses: Vec<Address>) -> Self {
		Self {
			name: name.into(),
			addresses,
			create_on_startup: true,
		}
	}
}

impl From<ServerInterfaceSpec> for ServerInterface {
	fn from(spec: ServerInterfaceSpec) -> Self {
		ServerInterface {
			name: spec.name,
			addresses: spec.addresses,
		}
	}
}

/// A user's peer configuration, keyed by (username, name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerRecord {
	pub username: String,
	pub name: String,
	pub address: Address,
	pub endpoint_address: Option<String>,
	pub interface: String,
}

impl From<PeerRecord> for PeerSummary {
	fn from(record: PeerRecord) -> Self {
		PeerSummary {
			name: record.name,
			address: record.address,
			endpoint_address: record.endpoint_address,
			server_interface: record.interface,
		}
	}
}

/// Input to [`crate::DirectoryStore::create_peer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeer {
	pub username: String,
	pub name: String,
	pub address: Address,
	pub endpoint_address: Option<String>,
	pub interface: String,
}
