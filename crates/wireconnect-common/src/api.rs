// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and reply bodies exchanged between `wireconnect` and `wireconnect-server`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::keys::WgPublicKey;

/// Request-shape problems detected before any stateful work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("missing required field '{0}'")]
	MissingField(&'static str),

	#[error("invalid address '{0}'")]
	InvalidAddress(String),
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(ValidationError::MissingField(field));
	}
	Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
	#[serde(default)]
	pub peer_name: String,
	#[serde(default)]
	pub public_key: String,
}

impl ConnectionRequest {
	pub fn validate(&self) -> Result<(), ValidationError> {
		require("peer_name", &self.peer_name)?;
		require("public_key", &self.public_key)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReply {
	/// The server interface's public key.
	pub public_key: WgPublicKey,
	pub client_address: Address,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint_address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectionRequest {
	#[serde(default)]
	pub peer_name: String,
}

impl DisconnectionRequest {
	pub fn validate(&self) -> Result<(), ValidationError> {
		require("peer_name", &self.peer_name)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePeerRequest {
	#[serde(default)]
	pub user_name: String,
	#[serde(default)]
	pub peer_name: String,
	#[serde(default)]
	pub address: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint_address: Option<String>,
	#[serde(default)]
	pub server_interface: String,
}

impl CreatePeerRequest {
	/// Checks required fields and returns the parsed peer address.
	pub fn validate(&self) -> Result<Address, ValidationError> {
		require("user_name", &self.user_name)?;
		require("peer_name", &self.peer_name)?;
		require("address", &self.address)?;
		require("server_interface", &self.server_interface)?;
		Address::parse(&self.address).map_err(|_| ValidationError::InvalidAddress(self.address.clone()))
	}
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
	#[serde(default)]
	pub user_name: String,
	#[serde(default)]
	pub password: String,
	#[serde(default)]
	pub is_admin: bool,
}

impl CreateUserRequest {
	pub fn validate(&self) -> Result<(), ValidationError> {
		require("user_name", &self.user_name)?;
		require("password", &self.password)
	}
}

impl std::fmt::Debug for CreateUserRequest {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CreateUserRequest")
			.field("user_name", &self.user_name)
			.field("password", &"[REDACTED]")
			.field("is_admin", &self.is_admin)
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInterface {
	pub name: String,
	pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSummary {
	pub name: String,
	pub address: Address,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint_address: Option<String>,
	pub server_interface: String,
}

/// Source addresses currently tracked by the rate limiter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanList {
	pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	pub error: String,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
	pub message: String,
}

impl MessageBody {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}
