// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use wireconnect_server_db::DbError;

use crate::device::{DeviceError, DeviceKind};

#[derive(Debug, Error)]
pub enum WgError {
	#[error("no peer with that name exists")]
	PeerNotFound,

	#[error("server interface {0} is not defined")]
	InterfaceNotFound(String),

	#[error("interface {name} is unavailable: {source}")]
	InterfaceUnavailable {
		name: String,
		#[source]
		source: Box<WgError>,
	},

	#[error("device {name} already exists as a {kind} device")]
	AlreadyExistsWrongType { name: String, kind: DeviceKind },

	#[error("invalid public key")]
	InvalidKey,

	#[error("peer is not connected")]
	NotActive,

	#[error("key generation failed: {0}")]
	KeyGen(String),

	#[error(transparent)]
	Device(#[from] DeviceError),

	#[error(transparent)]
	Database(#[from] DbError),

	#[error("internal error: {0}")]
	Internal(String),
}

impl WgError {
	pub(crate) fn unavailable(name: &str, source: WgError) -> Self {
		WgError::InterfaceUnavailable {
			name: name.to_string(),
			source: Box::new(source),
		}
	}
}

pub type Result<T> = std::result::Result<T, WgError>;
