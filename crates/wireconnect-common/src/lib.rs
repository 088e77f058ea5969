// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Types shared by the wireconnect server and its client.

pub mod address;
pub mod api;
pub mod keys;

pub use address::{parse_address_list, Address, AddressError};
pub use api::{
	BanList, ConnectionReply, ConnectionRequest, CreatePeerRequest, CreateUserRequest,
	DisconnectionRequest, ErrorBody, MessageBody, PeerSummary, ServerInterface, ValidationError,
};
pub use keys::{KeyError, WgKeyPair, WgPrivateKey, WgPublicKey};
